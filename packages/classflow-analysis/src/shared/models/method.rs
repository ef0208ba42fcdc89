//! Method identifiers and program points
//!
//! A `MethodRef` is the full symbolic descriptor of a method as supplied by
//! the bytecode collaborator. The analysis itself never keys maps on the
//! descriptor: the bytecode store interns every descriptor to a dense
//! `MethodId`, and `(MethodId, offset)` pairs are the canonical program-point
//! keys with O(1) equality and hashing.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::opcode::ValueType;

/// Full symbolic method descriptor: class, name, parameter list, return type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodRef {
    /// Declaring class, dot-separated (e.g. `cases.Simple`)
    pub class: String,

    /// Method name
    pub name: String,

    /// Declared parameter types, in order
    #[serde(default)]
    pub params: Vec<ValueType>,

    /// Declared return type; `None` for void
    #[serde(default)]
    pub returns: Option<ValueType>,
}

impl MethodRef {
    pub fn new(class: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            name: name.into(),
            params: Vec::new(),
            returns: None,
        }
    }

    /// Add parameter types
    pub fn with_params(mut self, params: Vec<ValueType>) -> Self {
        self.params = params;
        self
    }

    /// Set the return type
    pub fn with_return(mut self, ty: ValueType) -> Self {
        self.returns = Some(ty);
        self
    }

    /// `class.name`, the form matched against taint-policy tables
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.class, self.name)
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}:(", self.class, self.name)?;
        for p in &self.params {
            write!(f, "{}", p.descriptor())?;
        }
        match &self.returns {
            Some(ty) => write!(f, "){}", ty.descriptor()),
            None => write!(f, ")V"),
        }
    }
}

/// Dense interned method key. Produced by the bytecode store; never
/// constructed from raw integers outside of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MethodId(pub(crate) u32);

impl MethodId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A program point: interned method plus instruction offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ProgramPoint {
    pub method: MethodId,
    pub offset: u32,
}

impl ProgramPoint {
    pub fn new(method: MethodId, offset: u32) -> Self {
        Self { method, offset }
    }

    /// The fall-through point, one instruction further
    pub fn next(self) -> Self {
        Self {
            method: self.method,
            offset: self.offset + 1,
        }
    }

    /// The same method at an explicit jump target
    pub fn at(self, target: u32) -> Self {
        Self {
            method: self.method,
            offset: target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_name() {
        let m = MethodRef::new("cases.Simple", "divideByZero");
        assert_eq!(m.qualified_name(), "cases.Simple.divideByZero");
    }

    #[test]
    fn test_display_signature() {
        let m = MethodRef::new("cases.Simple", "assertPositive")
            .with_params(vec![ValueType::Int]);
        assert_eq!(m.to_string(), "cases.Simple.assertPositive:(I)V");

        let m = MethodRef::new("cases.Arrays", "first")
            .with_params(vec![ValueType::IntArray])
            .with_return(ValueType::Int);
        assert_eq!(m.to_string(), "cases.Arrays.first:([I)I");
    }

    #[test]
    fn test_program_point_successors() {
        let pc = ProgramPoint::new(MethodId(0), 3);
        assert_eq!(pc.next().offset, 4);
        assert_eq!(pc.at(9).offset, 9);
        assert_eq!(pc.at(9).method, pc.method);
    }
}
