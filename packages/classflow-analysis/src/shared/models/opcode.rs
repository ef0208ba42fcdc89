//! Opcode model for the class-file dialect
//!
//! Opcodes are a tagged sum, not a class hierarchy: each variant carries its
//! payload (target offset, local index, field marker, method descriptor) and
//! the transfer function matches exhaustively on the variant. The serde
//! derives give the JSON fixture format consumed by the CLI adapter.

use serde::{Deserialize, Serialize};

use super::method::MethodRef;

/// Value types the dialect distinguishes on the operand stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Int,
    Boolean,
    Char,
    Short,
    Reference,
    IntArray,
    CharArray,
}

impl ValueType {
    /// JVM-style descriptor fragment, used in method signatures
    pub fn descriptor(self) -> &'static str {
        match self {
            ValueType::Int => "I",
            ValueType::Boolean => "Z",
            ValueType::Char => "C",
            ValueType::Short => "S",
            ValueType::Reference => "L",
            ValueType::IntArray => "[I",
            ValueType::CharArray => "[C",
        }
    }
}

/// Integer binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

/// Comparison conditions for `ifz` / `if`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CmpCond {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Constant operands of `push`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Int(i64),
    Boolean(bool),
    Char(char),
    Str(String),
    Null,
}

/// One instruction of the dialect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Opcode {
    Push { value: Literal },
    Load { ty: ValueType, index: usize },
    Store { ty: ValueType, index: usize },
    Dup,
    Get { field: String, is_static: bool },
    Binary { ty: ValueType, #[serde(rename = "binop")] op: BinaryOp },
    IfZero { cond: CmpCond, target: u32 },
    IfCmp { cond: CmpCond, target: u32 },
    Goto { target: u32 },
    NewArray { ty: ValueType, dim: u8 },
    ArrayLength,
    ArrayLoad { ty: ValueType },
    ArrayStore { ty: ValueType },
    InvokeVirtual { method: MethodRef },
    InvokeStatic { method: MethodRef },
    InvokeSpecial { method: MethodRef },
    InvokeDynamic { method: MethodRef },
    Return { ty: Option<ValueType> },
    New { class: String },
    Throw,
    Cast { from: ValueType, to: ValueType },
    Incr { index: usize, amount: i32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_json_roundtrip() {
        let ops = vec![
            Opcode::Push {
                value: Literal::Int(10),
            },
            Opcode::Load {
                ty: ValueType::Int,
                index: 0,
            },
            Opcode::Binary {
                ty: ValueType::Int,
                op: BinaryOp::Div,
            },
            Opcode::Return {
                ty: Some(ValueType::Int),
            },
        ];
        let json = serde_json::to_string(&ops).unwrap();
        let back: Vec<Opcode> = serde_json::from_str(&json).unwrap();
        assert_eq!(ops, back);
    }

    #[test]
    fn test_opcode_tag_names() {
        let json = serde_json::to_value(&Opcode::IfZero {
            cond: CmpCond::Ne,
            target: 8,
        })
        .unwrap();
        assert_eq!(json["op"], "if_zero");
        assert_eq!(json["cond"], "ne");
        assert_eq!(json["target"], 8);
    }
}
