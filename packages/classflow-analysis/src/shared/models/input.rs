//! Invocation inputs
//!
//! An analysis case is `(method, input vector)`. Each input is a
//! literal-tagged variant; the chosen value domain abstracts it into the
//! initial frame's locals. Array inputs additionally seed the abstract heap
//! with their concrete length.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputValue {
    Int(i64),
    Boolean(bool),
    Char(char),
    IntArray(Vec<i64>),
    CharArray(Vec<char>),
    Reference(Option<u32>),
}

impl InputValue {
    /// Concrete element count for array inputs
    pub fn array_len(&self) -> Option<u64> {
        match self {
            InputValue::IntArray(v) => Some(v.len() as u64),
            InputValue::CharArray(v) => Some(v.len() as u64),
            _ => None,
        }
    }
}
