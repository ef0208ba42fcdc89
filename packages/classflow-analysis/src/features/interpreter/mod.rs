//! Abstract interpreter
//!
//! frame/     per-point data model and joins
//! transfer/  per-opcode abstract step, parametric in the value domain
//! engine/    worklist fixpoint driver
//! reporter/  text and JSON rendering
//!
//! `analyze` is the one-call facade: it validates the configuration, picks
//! the value domain from the mode selector and returns the rendered result.

pub mod engine;
pub mod frame;
pub mod reporter;
pub mod transfer;

pub use engine::{Analysis, FixpointEngine};
pub use frame::{AbstractFrame, AbstractState, Absorbed, PointOutcome, Status};
pub use reporter::{PointJson, ReportJson, Reporter, BUDGET_TAG};
pub use transfer::Transfer;

use crate::config::{AnalysisConfig, AnalysisMode};
use crate::errors::Result;
use crate::features::bytecode::BytecodeStore;
use crate::features::domains::{AbstractDomain, SignSet, TaintValue};
use crate::shared::models::{InputValue, MethodRef};

/// Everything a driver needs from one analysis run
pub struct AnalysisSummary {
    pub text: String,
    pub json: ReportJson,
    pub verdict: String,
    pub rounds: usize,
    pub budget_exhausted: bool,
}

/// Analyze one `(method, inputs)` case under the configured mode
pub fn analyze(
    store: &BytecodeStore,
    config: &AnalysisConfig,
    method: &MethodRef,
    inputs: &[InputValue],
) -> Result<AnalysisSummary> {
    config.validate()?;
    match config.mode {
        AnalysisMode::Sign => run::<SignSet>(store, config, method, inputs),
        AnalysisMode::Taint => run::<TaintValue>(store, config, method, inputs),
    }
}

fn run<D: AbstractDomain>(
    store: &BytecodeStore,
    config: &AnalysisConfig,
    method: &MethodRef,
    inputs: &[InputValue],
) -> Result<AnalysisSummary> {
    let engine = FixpointEngine::new(store, config);
    let analysis = engine.execute::<D>(method, inputs)?;
    let reporter = Reporter::new(store);
    let json = reporter.report(&analysis);
    Ok(AnalysisSummary {
        text: reporter.render_text(&analysis),
        verdict: json.verdict.clone(),
        rounds: analysis.rounds,
        budget_exhausted: analysis.budget_exhausted,
        json,
    })
}
