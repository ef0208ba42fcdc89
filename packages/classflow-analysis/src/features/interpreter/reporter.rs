//! Report rendering
//!
//! One line per reached program point, sorted by method name then offset:
//! terminal points print their tag, live points print status, locals, stack
//! and heap. The final line is the overall verdict: the most recent non-ok
//! tag in dump order, `*` when the step budget tripped, `ok` otherwise. The
//! same data renders to JSON for machine consumers.

use std::collections::BTreeMap;

use serde::Serialize;

use super::engine::Analysis;
use super::frame::PointOutcome;
use crate::errors::Result;
use crate::features::bytecode::BytecodeStore;
use crate::features::domains::AbstractDomain;

/// Budget-exhaustion marker
pub const BUDGET_TAG: &str = "*";

/// Machine-readable rendering of one program point
#[derive(Debug, Clone, Serialize)]
pub struct PointJson {
    pub method: String,
    pub offset: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locals: Option<BTreeMap<usize, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heap: Option<BTreeMap<u32, String>>,
}

/// Machine-readable rendering of a whole analysis
#[derive(Debug, Clone, Serialize)]
pub struct ReportJson {
    pub points: Vec<PointJson>,
    pub verdict: String,
    pub rounds: usize,
    pub budget_exhausted: bool,
}

pub struct Reporter<'a> {
    store: &'a BytecodeStore,
}

impl<'a> Reporter<'a> {
    pub fn new(store: &'a BytecodeStore) -> Self {
        Self { store }
    }

    /// Points in report order: method display name, then offset
    fn sorted_points<'b, D: AbstractDomain>(
        &self,
        analysis: &'b Analysis<D>,
    ) -> Vec<(String, u32, &'b PointOutcome<D>)> {
        let mut points: Vec<_> = analysis
            .seen
            .iter()
            .map(|(pc, outcome)| (self.store.method_name(pc.method), pc.offset, outcome))
            .collect();
        points.sort_by(|a, b| (&a.0, a.1).cmp(&(&b.0, b.1)));
        points
    }

    /// Overall verdict: most-recently-seen non-ok tag in dump order, the
    /// budget marker when exhausted, `ok` otherwise
    pub fn final_verdict<D: AbstractDomain>(&self, analysis: &Analysis<D>) -> String {
        if analysis.budget_exhausted {
            return BUDGET_TAG.to_string();
        }
        let mut verdict = "ok".to_string();
        for (_, _, outcome) in self.sorted_points(analysis) {
            if let Some(tag) = outcome.terminal {
                verdict = tag.to_string();
            } else if let Some(state) = &outcome.state {
                if !state.status.is_ok() {
                    verdict = state.status.to_string();
                }
            }
        }
        verdict
    }

    pub fn render_text<D: AbstractDomain>(&self, analysis: &Analysis<D>) -> String {
        let mut lines = Vec::new();
        for (name, offset, outcome) in self.sorted_points(analysis) {
            // the error side of the output wins at a point holding both
            if let Some(tag) = outcome.terminal {
                lines.push(format!("{name}:{offset}: {tag}"));
            } else if let Some(state) = &outcome.state {
                let locals: BTreeMap<usize, String> = state
                    .frame
                    .locals
                    .iter()
                    .map(|(&slot, v)| (slot, v.to_string()))
                    .collect();
                let locals = locals
                    .iter()
                    .map(|(slot, v)| format!("{slot}:{v}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                let stack = state
                    .frame
                    .stack
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                let heap: BTreeMap<u32, String> = state
                    .aheap
                    .iter()
                    .map(|(&r, interval)| (r, interval.to_string()))
                    .collect();
                let heap = heap
                    .iter()
                    .map(|(r, interval)| format!("{r}:{interval}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                lines.push(format!(
                    "{name}:{offset}: status={} locals={{{locals}}} stack=[{stack}] heap={{{heap}}}",
                    state.status
                ));
            }
        }
        lines.push(self.final_verdict(analysis));
        lines.join("\n")
    }

    pub fn report<D: AbstractDomain>(&self, analysis: &Analysis<D>) -> ReportJson {
        let points = self
            .sorted_points(analysis)
            .into_iter()
            .map(|(method, offset, outcome)| {
                let (status, locals, stack, heap) = match &outcome.state {
                    Some(state) => (
                        Some(state.status.to_string()),
                        Some(
                            state
                                .frame
                                .locals
                                .iter()
                                .map(|(&slot, v)| (slot, v.to_string()))
                                .collect(),
                        ),
                        Some(state.frame.stack.iter().map(|v| v.to_string()).collect()),
                        Some(
                            state
                                .aheap
                                .iter()
                                .map(|(&r, interval)| (r, interval.to_string()))
                                .collect(),
                        ),
                    ),
                    None => (None, None, None, None),
                };
                PointJson {
                    method,
                    offset,
                    terminal: outcome.terminal.map(|t| t.to_string()),
                    status,
                    locals,
                    stack,
                    heap,
                }
            })
            .collect();
        ReportJson {
            points,
            verdict: self.final_verdict(analysis),
            rounds: analysis.rounds,
            budget_exhausted: analysis.budget_exhausted,
        }
    }

    pub fn render_json<D: AbstractDomain>(&self, analysis: &Analysis<D>) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.report(analysis))?)
    }
}
