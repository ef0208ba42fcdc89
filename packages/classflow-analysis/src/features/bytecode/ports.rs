//! Bytecode collaborator port

use crate::errors::Result;
use crate::shared::models::{MethodRef, Opcode};

/// Supplies, on demand, the ordered opcode sequence of a method. The
/// analyzer never asks twice for the same method; `BytecodeStore` memoises.
pub trait OpcodeSource {
    fn method_body(&self, method: &MethodRef) -> Result<Vec<Opcode>>;
}
