//! Bytecode access
//!
//! The loader proper lives outside this crate; analysis consumes opcodes
//! through the `OpcodeSource` port, memoised per method by `BytecodeStore`.

pub mod ports;
pub mod store;

pub use ports::OpcodeSource;
pub use store::{BytecodeStore, InMemorySource, JsonBytecodeSource};
