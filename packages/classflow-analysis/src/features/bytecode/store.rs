//! Memoising bytecode store and method interner
//!
//! Interns method descriptors to dense `MethodId` keys so program points
//! hash and compare in O(1), and caches each method's opcode vector on first
//! use with no eviction. Single-threaded by design, like the rest of the
//! analyzer core.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use serde::Deserialize;

use super::ports::OpcodeSource;
use crate::errors::{AnalysisError, Result};
use crate::shared::models::{MethodId, MethodRef, Opcode, ProgramPoint};

#[derive(Default)]
struct StoreInner {
    ids: FxHashMap<String, MethodId>,
    descriptors: Vec<MethodRef>,
    bodies: FxHashMap<MethodId, Rc<[Opcode]>>,
}

/// Lazily-populated `method → opcode list` mapping over an `OpcodeSource`
pub struct BytecodeStore {
    source: Box<dyn OpcodeSource>,
    inner: RefCell<StoreInner>,
}

impl BytecodeStore {
    pub fn new(source: Box<dyn OpcodeSource>) -> Self {
        Self {
            source,
            inner: RefCell::new(StoreInner::default()),
        }
    }

    /// Intern a descriptor, returning its dense key. Repeated calls with an
    /// equal descriptor return the same id.
    pub fn intern(&self, method: &MethodRef) -> MethodId {
        let key = method.to_string();
        let mut inner = self.inner.borrow_mut();
        if let Some(&id) = inner.ids.get(&key) {
            return id;
        }
        let id = MethodId(inner.descriptors.len() as u32);
        inner.descriptors.push(method.clone());
        inner.ids.insert(key, id);
        id
    }

    /// The descriptor behind an interned id
    pub fn method(&self, id: MethodId) -> MethodRef {
        self.inner.borrow().descriptors[id.index()].clone()
    }

    /// Human-readable name of a program point's method
    pub fn method_name(&self, id: MethodId) -> String {
        self.inner.borrow().descriptors[id.index()].to_string()
    }

    /// The memoised opcode vector of a method
    pub fn opcodes(&self, id: MethodId) -> Result<Rc<[Opcode]>> {
        if let Some(body) = self.inner.borrow().bodies.get(&id) {
            return Ok(Rc::clone(body));
        }
        let method = self.method(id);
        let body: Rc<[Opcode]> = self.source.method_body(&method)?.into();
        self.inner
            .borrow_mut()
            .bodies
            .insert(id, Rc::clone(&body));
        Ok(body)
    }

    /// The opcode at a program point; out-of-range offsets are malformed
    /// bytecode (no implicit fall-off-the-end return exists in the dialect).
    pub fn opcode_at(&self, pc: ProgramPoint) -> Result<Opcode> {
        let body = self.opcodes(pc.method)?;
        body.get(pc.offset as usize).cloned().ok_or_else(|| {
            AnalysisError::malformed(format!(
                "offset {} out of range for {}",
                pc.offset,
                self.method_name(pc.method)
            ))
        })
    }
}

/// Test/CLI adapter: methods registered up front, keyed by full signature
#[derive(Default)]
pub struct InMemorySource {
    methods: FxHashMap<String, Vec<Opcode>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: &MethodRef, body: Vec<Opcode>) -> Self {
        self.methods.insert(method.to_string(), body);
        self
    }

    pub fn add(&mut self, method: &MethodRef, body: Vec<Opcode>) {
        self.methods.insert(method.to_string(), body);
    }
}

impl OpcodeSource for InMemorySource {
    fn method_body(&self, method: &MethodRef) -> Result<Vec<Opcode>> {
        self.methods
            .get(&method.to_string())
            .cloned()
            .ok_or_else(|| AnalysisError::bytecode(format!("unknown method {method}")))
    }
}

/// One method entry in a JSON bytecode fixture
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureMethod {
    pub method: MethodRef,
    pub body: Vec<Opcode>,
}

/// Fixture file shape: `{ "methods": [ { "method": ..., "body": [...] } ] }`
#[derive(Debug, Clone, Deserialize)]
struct FixtureFile {
    methods: Vec<FixtureMethod>,
}

/// CLI adapter reading a whole-program fixture from JSON
pub struct JsonBytecodeSource {
    methods: Vec<FixtureMethod>,
}

impl JsonBytecodeSource {
    pub fn from_json(contents: &str) -> Result<Self> {
        let file: FixtureFile = serde_json::from_str(contents)?;
        Ok(Self {
            methods: file.methods,
        })
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Resolve a method by qualified name (`class.name`) or full signature
    pub fn resolve(&self, name: &str) -> Option<MethodRef> {
        self.methods
            .iter()
            .map(|entry| &entry.method)
            .find(|m| m.to_string() == name || m.qualified_name() == name)
            .cloned()
    }
}

impl OpcodeSource for JsonBytecodeSource {
    fn method_body(&self, method: &MethodRef) -> Result<Vec<Opcode>> {
        self.methods
            .iter()
            .find(|entry| &entry.method == method)
            .map(|entry| entry.body.clone())
            .ok_or_else(|| AnalysisError::bytecode(format!("unknown method {method}")))
    }
}
