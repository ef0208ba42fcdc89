/*
 * classflow - abstract-interpretation core for a JVM-class-file dialect
 *
 * Computes a sound over-approximation of the reachable program states at
 * every instruction offset of a method: a worklist fixed point over
 * lattice-valued abstract frames, with per-opcode transfer functions
 * parametric in the value domain.
 *
 * Layout:
 * - shared/    : Common models (methods, program points, opcodes, inputs)
 * - features/  : Vertical slices (domains -> bytecode -> interpreter)
 * - config/    : Mode selector, step budget, taint policy tables
 */

/// Shared models
pub mod shared;

/// Feature modules
pub mod features;

/// Configuration system
pub mod config;

/// Error types
pub mod errors;

// Re-exports for the public API
pub use config::{AnalysisConfig, AnalysisMode, TaintPolicy};
pub use errors::{AnalysisError, Result};
pub use features::bytecode::{BytecodeStore, InMemorySource, JsonBytecodeSource, OpcodeSource};
pub use features::domains::{AbstractDomain, LengthInterval, SignSet, TaintValue};
pub use features::interpreter::{
    analyze, Analysis, AnalysisSummary, FixpointEngine, PointOutcome, Reporter, Status,
};
pub use shared::models::{
    BinaryOp, CmpCond, InputValue, Literal, MethodId, MethodRef, Opcode, ProgramPoint, ValueType,
};
