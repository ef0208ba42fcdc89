//! Abstract frames, states and per-point outcomes
//!
//! Pure data plus the join operators the engine folds with. Frames are
//! immutable from the engine's perspective: the transfer function builds
//! fresh successor frames and never mutates a stored state.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::features::domains::{AbstractDomain, LengthInterval};
use crate::shared::models::{MethodId, ProgramPoint};

/// Terminal and non-terminal analysis verdicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    DivideByZero,
    OutOfBounds,
    AssertionError,
    NullPointer,
    SqlInjection,
}

impl Status {
    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }

    /// The exact report vocabulary
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::DivideByZero => "divide by zero",
            Status::OutOfBounds => "out of bounds",
            Status::AssertionError => "assertion error",
            Status::NullPointer => "null pointer",
            Status::SqlInjection => "SQL injection",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One operand-stack/locals frame at a program point
#[derive(Debug, Clone, PartialEq)]
pub struct AbstractFrame<D> {
    /// Slot-indexed locals; a missing slot reads as top, joins as bottom
    pub locals: FxHashMap<usize, D>,
    /// Operand stack, top of stack last
    pub stack: Vec<D>,
    pub pc: ProgramPoint,
}

impl<D: AbstractDomain> AbstractFrame<D> {
    /// Fresh frame at offset 0 of a method
    pub fn entry(method: MethodId) -> Self {
        Self {
            locals: FxHashMap::default(),
            stack: Vec::new(),
            pc: ProgramPoint::new(method, 0),
        }
    }

    /// Read a local; an absent slot is unknown
    pub fn local(&self, index: usize) -> D {
        self.locals.get(&index).copied().unwrap_or_else(D::top)
    }

    /// Per-slot locals join plus elementwise stack join. Stacks of unequal
    /// depth widen to a top-valued stack at the maximum depth: a precision
    /// loss, never a soundness loss.
    pub fn join(&self, other: &Self) -> Self {
        debug_assert_eq!(self.pc, other.pc);
        let mut locals = self.locals.clone();
        for (&slot, &v) in &other.locals {
            locals
                .entry(slot)
                .and_modify(|cur| *cur = cur.join(v))
                .or_insert(v);
        }
        let stack = if self.stack.len() != other.stack.len() {
            vec![D::top(); self.stack.len().max(other.stack.len())]
        } else {
            self.stack
                .iter()
                .zip(&other.stack)
                .map(|(&a, &b)| a.join(b))
                .collect()
        };
        Self {
            locals,
            stack,
            pc: self.pc,
        }
    }
}

/// Abstract machine state: one frame (the core is intra-procedural), a
/// verdict, and the abstract array heap.
#[derive(Debug, Clone, PartialEq)]
pub struct AbstractState<D> {
    pub frame: AbstractFrame<D>,
    pub status: Status,
    pub aheap: FxHashMap<u32, LengthInterval>,
}

impl<D: AbstractDomain> AbstractState<D> {
    pub fn initial(frame: AbstractFrame<D>) -> Self {
        Self {
            frame,
            status: Status::Ok,
            aheap: FxHashMap::default(),
        }
    }

    pub fn pc(&self) -> ProgramPoint {
        self.frame.pc
    }

    /// State join: frame join, first non-ok status wins, pointwise heap join
    /// with missing keys carried over verbatim.
    pub fn join(&self, other: &Self) -> Self {
        let frame = self.frame.join(&other.frame);
        let status = if !self.status.is_ok() {
            self.status
        } else {
            other.status
        };
        let mut aheap = self.aheap.clone();
        for (&r, &interval) in &other.aheap {
            aheap
                .entry(r)
                .and_modify(|cur| *cur = cur.join(interval))
                .or_insert(interval);
        }
        Self {
            frame,
            status,
            aheap,
        }
    }

    /// Next unused abstract array reference id
    pub fn fresh_ref(&self) -> u32 {
        self.aheap.keys().copied().max().map_or(0, |m| m + 1)
    }
}

/// What absorbing an edge changed at a point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Absorbed {
    Unchanged,
    /// The non-terminal state strictly grew (the point re-enters the frontier)
    StateGrew,
    /// A terminal tag was recorded (reported, never stepped)
    TerminalSet,
}

/// Stored outcome at a program point. The non-terminal state and the first
/// observed terminal tag coexist: a bounds check or division can emit an ok
/// edge and an error edge to the same offset, and neither may erase the
/// other. Terminals are sticky and stay on the error side of the output.
#[derive(Debug, Clone, PartialEq)]
pub struct PointOutcome<D> {
    pub state: Option<AbstractState<D>>,
    pub terminal: Option<Status>,
}

impl<D: AbstractDomain> PointOutcome<D> {
    pub fn empty() -> Self {
        Self {
            state: None,
            terminal: None,
        }
    }

    /// Record a terminal tag; the first observed tag wins
    pub fn set_terminal(&mut self, tag: Status) -> bool {
        if self.terminal.is_none() {
            self.terminal = Some(tag);
            true
        } else {
            false
        }
    }

    /// Fold an incoming edge into this point. Error-status edges land on the
    /// terminal side; ok edges join into the state side.
    pub fn absorb(&mut self, incoming: AbstractState<D>) -> Absorbed {
        if !incoming.status.is_ok() {
            if self.set_terminal(incoming.status) {
                return Absorbed::TerminalSet;
            }
            return Absorbed::Unchanged;
        }
        match &mut self.state {
            None => {
                self.state = Some(incoming);
                Absorbed::StateGrew
            }
            Some(current) => {
                let joined = current.join(&incoming);
                if joined != *current {
                    *current = joined;
                    Absorbed::StateGrew
                } else {
                    Absorbed::Unchanged
                }
            }
        }
    }
}

impl<D: AbstractDomain> Default for PointOutcome<D> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::domains::SignSet;

    fn frame_at(offset: u32, stack: Vec<SignSet>) -> AbstractFrame<SignSet> {
        let mut f = AbstractFrame::entry(MethodId(0));
        f.pc.offset = offset;
        f.stack = stack;
        f
    }

    #[test]
    fn test_missing_local_reads_as_top() {
        let f: AbstractFrame<SignSet> = AbstractFrame::entry(MethodId(0));
        assert_eq!(f.local(3), SignSet::top());
    }

    #[test]
    fn test_join_locals_per_slot() {
        let mut a = frame_at(0, vec![]);
        a.locals.insert(0, SignSet::neg());
        let mut b = frame_at(0, vec![]);
        b.locals.insert(0, SignSet::pos());
        b.locals.insert(1, SignSet::zero());

        let j = a.join(&b);
        assert_eq!(j.locals[&0], SignSet::neg() | SignSet::pos());
        // missing slot joins as bottom: carried verbatim
        assert_eq!(j.locals[&1], SignSet::zero());
    }

    #[test]
    fn test_depth_mismatch_widens_stack() {
        let a = frame_at(2, vec![SignSet::pos()]);
        let b = frame_at(2, vec![SignSet::pos(), SignSet::zero()]);
        let j = a.join(&b);
        assert_eq!(j.stack, vec![SignSet::top(), SignSet::top()]);
    }

    #[test]
    fn test_state_join_keeps_error_status() {
        let ok = AbstractState::initial(frame_at(1, vec![]));
        let mut err = AbstractState::initial(frame_at(1, vec![]));
        err.status = Status::DivideByZero;
        assert_eq!(err.join(&ok).status, Status::DivideByZero);
        assert_eq!(ok.join(&err).status, Status::DivideByZero);
    }

    #[test]
    fn test_heap_join_pointwise() {
        let mut a = AbstractState::<SignSet>::initial(frame_at(1, vec![]));
        a.aheap.insert(0, LengthInterval::constant(2));
        let mut b = AbstractState::initial(frame_at(1, vec![]));
        b.aheap.insert(0, LengthInterval::constant(5));
        b.aheap.insert(1, LengthInterval::top());

        let j = a.join(&b);
        assert_eq!(j.aheap[&0], LengthInterval::new(2, Some(5)));
        assert_eq!(j.aheap[&1], LengthInterval::top());
    }

    #[test]
    fn test_fresh_ref_is_dense() {
        let mut s = AbstractState::<SignSet>::initial(frame_at(0, vec![]));
        assert_eq!(s.fresh_ref(), 0);
        s.aheap.insert(0, LengthInterval::top());
        s.aheap.insert(1, LengthInterval::top());
        assert_eq!(s.fresh_ref(), 2);
    }

    #[test]
    fn test_terminal_is_sticky() {
        let mut outcome = PointOutcome::<SignSet>::empty();
        let mut err = AbstractState::initial(frame_at(1, vec![]));
        err.status = Status::OutOfBounds;
        assert_eq!(outcome.absorb(err), Absorbed::TerminalSet);

        let mut other = AbstractState::initial(frame_at(1, vec![]));
        other.status = Status::DivideByZero;
        assert_eq!(outcome.absorb(other), Absorbed::Unchanged);
        assert_eq!(outcome.terminal, Some(Status::OutOfBounds));
    }

    #[test]
    fn test_ok_edge_coexists_with_terminal() {
        let mut outcome = PointOutcome::<SignSet>::empty();
        let mut err = AbstractState::initial(frame_at(1, vec![]));
        err.status = Status::DivideByZero;
        outcome.absorb(err);

        let ok = AbstractState::initial(frame_at(1, vec![SignSet::pos()]));
        assert_eq!(outcome.absorb(ok), Absorbed::StateGrew);
        assert!(outcome.state.is_some());
        assert_eq!(outcome.terminal, Some(Status::DivideByZero));
    }

    #[test]
    fn test_absorb_reaches_fixpoint() {
        let mut outcome = PointOutcome::<SignSet>::empty();
        let s = AbstractState::initial(frame_at(1, vec![SignSet::pos()]));
        assert_eq!(outcome.absorb(s.clone()), Absorbed::StateGrew);
        assert_eq!(outcome.absorb(s), Absorbed::Unchanged);
    }
}
