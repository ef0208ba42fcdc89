//! Feature modules
//!
//! - domains/     - Abstract value lattices and the domain trait
//! - bytecode/    - Opcode access port and memoising store
//! - interpreter/ - Transfer function, fixpoint engine, reporter

pub mod bytecode;
pub mod domains;
pub mod interpreter;
