//! Shared builders for integration tests
//!
//! Hand-assembled opcode vectors for the scenarios the suites exercise.

#![allow(dead_code)]

use classflow_analysis::{
    BinaryOp, BytecodeStore, CmpCond, InMemorySource, Literal, MethodRef, Opcode, ValueType,
};

pub const FIXTURE_CLASS: &str = "cases.Fixture";

/// `int name(int)` case method
pub fn int_case(name: &str) -> MethodRef {
    MethodRef::new(FIXTURE_CLASS, name)
        .with_params(vec![ValueType::Int])
        .with_return(ValueType::Int)
}

/// `void name(int)` case method
pub fn void_case(name: &str) -> MethodRef {
    MethodRef::new(FIXTURE_CLASS, name).with_params(vec![ValueType::Int])
}

/// Store holding exactly one method
pub fn store_for(method: &MethodRef, body: Vec<Opcode>) -> BytecodeStore {
    BytecodeStore::new(Box::new(InMemorySource::new().with_method(method, body)))
}

/// Fluent opcode-vector builder
#[derive(Default)]
pub struct ProgramBuilder {
    ops: Vec<Opcode>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_int(mut self, v: i64) -> Self {
        self.ops.push(Opcode::Push {
            value: Literal::Int(v),
        });
        self
    }

    pub fn push_str(mut self, s: &str) -> Self {
        self.ops.push(Opcode::Push {
            value: Literal::Str(s.to_string()),
        });
        self
    }

    pub fn load_int(mut self, index: usize) -> Self {
        self.ops.push(Opcode::Load {
            ty: ValueType::Int,
            index,
        });
        self
    }

    pub fn load_ref(mut self, index: usize) -> Self {
        self.ops.push(Opcode::Load {
            ty: ValueType::Reference,
            index,
        });
        self
    }

    pub fn store_int(mut self, index: usize) -> Self {
        self.ops.push(Opcode::Store {
            ty: ValueType::Int,
            index,
        });
        self
    }

    pub fn store_ref(mut self, index: usize) -> Self {
        self.ops.push(Opcode::Store {
            ty: ValueType::Reference,
            index,
        });
        self
    }

    pub fn binary(mut self, op: BinaryOp) -> Self {
        self.ops.push(Opcode::Binary {
            ty: ValueType::Int,
            op,
        });
        self
    }

    pub fn if_zero(mut self, cond: CmpCond, target: u32) -> Self {
        self.ops.push(Opcode::IfZero { cond, target });
        self
    }

    pub fn goto(mut self, target: u32) -> Self {
        self.ops.push(Opcode::Goto { target });
        self
    }

    pub fn get_assertion_flag(mut self) -> Self {
        self.ops.push(Opcode::Get {
            field: "$assertionsDisabled".to_string(),
            is_static: true,
        });
        self
    }

    pub fn new_int_array(mut self) -> Self {
        self.ops.push(Opcode::NewArray {
            ty: ValueType::Int,
            dim: 1,
        });
        self
    }

    pub fn array_load_int(mut self) -> Self {
        self.ops.push(Opcode::ArrayLoad { ty: ValueType::Int });
        self
    }

    pub fn invoke_static(mut self, method: MethodRef) -> Self {
        self.ops.push(Opcode::InvokeStatic { method });
        self
    }

    /// `new C; dup; invokespecial C.<init>; athrow`, the javac assertion
    /// failure pattern
    pub fn throw_new(mut self, class: &str) -> Self {
        self.ops.push(Opcode::New {
            class: class.to_string(),
        });
        self.ops.push(Opcode::Dup);
        self.ops.push(Opcode::InvokeSpecial {
            method: MethodRef::new(class, "<init>"),
        });
        self.ops.push(Opcode::Throw);
        self
    }

    pub fn ret_int(mut self) -> Self {
        self.ops.push(Opcode::Return {
            ty: Some(ValueType::Int),
        });
        self
    }

    pub fn ret_void(mut self) -> Self {
        self.ops.push(Opcode::Return { ty: None });
        self
    }

    pub fn build(self) -> Vec<Opcode> {
        self.ops
    }
}

/// `String readLine()`, matching the default source table
pub fn read_line() -> MethodRef {
    MethodRef::new("cases.Console", "readLine").with_return(ValueType::Reference)
}

/// `void executeQuery(String)`, matching the default sink table
pub fn execute_query() -> MethodRef {
    MethodRef::new("cases.Db", "executeQuery").with_params(vec![ValueType::Reference])
}
