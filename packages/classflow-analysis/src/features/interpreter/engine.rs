//! Worklist fixpoint driver
//!
//! Round-based frontier iteration: every round applies the transfer function
//! to each frontier state, collects all outgoing edges into a round-local
//! map (joining duplicate targets), then folds the round into the global
//! `seen` map. Only points whose stored state strictly grew re-enter the
//! frontier. Monotone joins over finite lattices terminate; the step budget
//! is the safety net, not the termination argument.
//!
//! The in-round collection makes the visiting order immaterial, so the whole
//! engine is deterministic and single-threaded.

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use super::frame::{AbstractFrame, AbstractState, Absorbed, PointOutcome, Status};
use super::transfer::Transfer;
use crate::config::AnalysisConfig;
use crate::errors::Result;
use crate::features::bytecode::BytecodeStore;
use crate::features::domains::{AbstractDomain, LengthInterval};
use crate::shared::models::{InputValue, MethodRef, ProgramPoint};

/// Fixpoint result: every reached program point with its joined outcome
pub struct Analysis<D> {
    pub seen: FxHashMap<ProgramPoint, PointOutcome<D>>,
    /// Rounds executed before stabilisation (or budget exhaustion)
    pub rounds: usize,
    pub budget_exhausted: bool,
}

impl<D: AbstractDomain> Analysis<D> {
    pub fn outcome(&self, pc: ProgramPoint) -> Option<&PointOutcome<D>> {
        self.seen.get(&pc)
    }

    /// Whether any point carries the given terminal tag
    pub fn has_terminal(&self, status: Status) -> bool {
        self.seen.values().any(|o| o.terminal == Some(status))
    }

    /// Whether any point holds a non-terminal state (an ok continuation)
    pub fn has_state_at(&self, pc: ProgramPoint) -> bool {
        self.seen.get(&pc).is_some_and(|o| o.state.is_some())
    }
}

pub struct FixpointEngine<'a> {
    store: &'a BytecodeStore,
    config: &'a AnalysisConfig,
}

impl<'a> FixpointEngine<'a> {
    pub fn new(store: &'a BytecodeStore, config: &'a AnalysisConfig) -> Self {
        Self { store, config }
    }

    /// Run the analysis of one method with the given invocation inputs
    pub fn execute<D: AbstractDomain>(
        &self,
        method: &MethodRef,
        inputs: &[InputValue],
    ) -> Result<Analysis<D>> {
        let start = self.initial_state::<D>(method, inputs);
        let entry_pc = start.pc();
        let transfer = Transfer::new(&self.config.policy);

        let mut seen: FxHashMap<ProgramPoint, PointOutcome<D>> = FxHashMap::default();
        seen.entry(entry_pc).or_default().absorb(start.clone());

        let mut frontier: FxHashMap<ProgramPoint, AbstractState<D>> = FxHashMap::default();
        frontier.insert(entry_pc, start);

        let mut rounds = 0usize;
        let mut budget_exhausted = false;

        while !frontier.is_empty() {
            if rounds >= self.config.step_budget {
                budget_exhausted = true;
                warn!(rounds, "fixpoint step budget exhausted");
                break;
            }
            rounds += 1;

            // collect this round's edges, joining duplicate targets locally
            let mut next: FxHashMap<ProgramPoint, PointOutcome<D>> = FxHashMap::default();
            for state in frontier.values() {
                let code = self.store.opcodes(state.pc().method)?;
                for succ in transfer.step(state, &code)? {
                    next.entry(succ.pc()).or_default().absorb(succ);
                }
            }

            // fold into `seen`; only strictly-grown states are rescheduled
            let mut new_frontier = FxHashMap::default();
            for (pt, outcome) in next {
                let entry = seen.entry(pt).or_default();
                if let Some(tag) = outcome.terminal {
                    entry.set_terminal(tag);
                }
                if let Some(incoming) = outcome.state {
                    if entry.absorb(incoming) == Absorbed::StateGrew {
                        if let Some(grown) = &entry.state {
                            new_frontier.insert(pt, grown.clone());
                        }
                    }
                }
            }

            debug!(
                round = rounds,
                frontier = new_frontier.len(),
                points = seen.len(),
                "fixpoint round"
            );
            frontier = new_frontier;
        }

        Ok(Analysis {
            seen,
            rounds,
            budget_exhausted,
        })
    }

    /// Entry frame at offset 0: locals from the abstracted inputs, empty
    /// stack, heap seeded with the concrete lengths of array inputs.
    fn initial_state<D: AbstractDomain>(
        &self,
        method: &MethodRef,
        inputs: &[InputValue],
    ) -> AbstractState<D> {
        let method_id = self.store.intern(method);
        let mut frame = AbstractFrame::<D>::entry(method_id);
        let mut aheap = FxHashMap::default();
        let mut next_ref = 0u32;
        for (slot, input) in inputs.iter().enumerate() {
            frame.locals.insert(slot, D::of_input(input));
            if let Some(len) = input.array_len() {
                aheap.insert(next_ref, LengthInterval::constant(len));
                next_ref += 1;
            }
        }
        AbstractState {
            frame,
            status: Status::Ok,
            aheap,
        }
    }
}
