//! Core data model shared by every feature
//!
//! Single source of truth for method identifiers, program points, the opcode
//! sum, and invocation inputs.

pub mod input;
pub mod method;
pub mod opcode;

pub use input::InputValue;
pub use method::{MethodId, MethodRef, ProgramPoint};
pub use opcode::{BinaryOp, CmpCond, Literal, Opcode, ValueType};
