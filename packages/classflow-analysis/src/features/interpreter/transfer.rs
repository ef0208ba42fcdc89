//! Per-opcode abstract transfer function
//!
//! Takes a pre-state and produces the multiset of successor states, each
//! carrying its own program point. A single instruction may emit several
//! edges: an unresolved branch, a division whose divisor may be zero, or a
//! bounds check that can go either way. Error successors carry a non-ok
//! status and are routed to the terminal side of their target point by the
//! engine.

use tracing::trace;

use super::frame::{AbstractFrame, AbstractState, Status};
use crate::config::{PolicyRole, TaintPolicy};
use crate::errors::{AnalysisError, Result};
use crate::features::domains::{AbstractDomain, BinaryOutcome, LengthInterval};
use crate::shared::models::{BinaryOp, Literal, MethodRef, Opcode, ProgramPoint};

pub struct Transfer<'a> {
    policy: &'a TaintPolicy,
}

impl<'a> Transfer<'a> {
    pub fn new(policy: &'a TaintPolicy) -> Self {
        Self { policy }
    }

    /// Apply one abstract step to `state` within its method body
    pub fn step<D: AbstractDomain>(
        &self,
        state: &AbstractState<D>,
        code: &[Opcode],
    ) -> Result<Vec<AbstractState<D>>> {
        let frame = &state.frame;
        let pc = frame.pc;
        let opcode = code.get(pc.offset as usize).ok_or_else(|| {
            AnalysisError::malformed(format!("offset {} has no instruction", pc.offset))
        })?;

        let mut succs = Vec::new();

        match opcode {
            Opcode::Push { value } => {
                let mut nf = frame.clone();
                nf.stack.push(D::of_literal(value));
                nf.pc = pc.next();
                succs.push(carry(state, nf, Status::Ok));
            }

            Opcode::Load { index, .. } => {
                let mut nf = frame.clone();
                nf.stack.push(nf.local(*index));
                nf.pc = pc.next();
                succs.push(carry(state, nf, Status::Ok));
            }

            Opcode::Store { index, .. } => {
                let mut nf = frame.clone();
                let v = pop(&mut nf, pc)?;
                nf.locals.insert(*index, v);
                nf.pc = pc.next();
                succs.push(carry(state, nf, Status::Ok));
            }

            Opcode::Dup => {
                let mut nf = frame.clone();
                let top = *nf.stack.last().ok_or_else(|| underflow(pc))?;
                nf.stack.push(top);
                nf.pc = pc.next();
                succs.push(carry(state, nf, Status::Ok));
            }

            Opcode::Get { field, .. } => {
                let mut nf = frame.clone();
                // the compiler-generated flag reads as false so conditionals
                // downstream behave as if assertions are enabled
                if field == "$assertionsDisabled" {
                    nf.stack.push(D::assertion_flag());
                } else {
                    nf.stack.push(D::top());
                }
                nf.pc = pc.next();
                succs.push(carry(state, nf, Status::Ok));
            }

            Opcode::Binary { op, .. } => {
                let mut nf = frame.clone();
                let b = pop(&mut nf, pc)?;
                let a = pop(&mut nf, pc)?;
                nf.pc = pc.next();
                let BinaryOutcome {
                    result,
                    may_divide_by_zero,
                } = D::binary(*op, a, b);
                if may_divide_by_zero {
                    succs.push(carry(state, nf.clone(), Status::DivideByZero));
                }
                if !result.is_bottom() {
                    nf.stack.push(result);
                    succs.push(carry(state, nf, Status::Ok));
                }
            }

            Opcode::IfZero { cond, target } => {
                let mut nf = frame.clone();
                let v = pop(&mut nf, pc)?;
                let feasibility = v.zero_branch(*cond);
                if feasibility.jump {
                    let mut jf = nf.clone();
                    jf.pc = pc.at(*target);
                    succs.push(carry(state, jf, Status::Ok));
                }
                if feasibility.fall {
                    nf.pc = pc.next();
                    succs.push(carry(state, nf, Status::Ok));
                }
            }

            Opcode::IfCmp { target, .. } => {
                // no relational facts beyond sign: both sides stay feasible
                let mut nf = frame.clone();
                let b = pop(&mut nf, pc)?;
                let a = pop(&mut nf, pc)?;
                if !a.is_bottom() && !b.is_bottom() {
                    let mut jf = nf.clone();
                    jf.pc = pc.at(*target);
                    succs.push(carry(state, jf, Status::Ok));
                    nf.pc = pc.next();
                    succs.push(carry(state, nf, Status::Ok));
                }
            }

            Opcode::Goto { target } => {
                let mut nf = frame.clone();
                nf.pc = pc.at(*target);
                succs.push(carry(state, nf, Status::Ok));
            }

            Opcode::NewArray { .. } => {
                let mut nf = frame.clone();
                let size = pop(&mut nf, pc)?;
                let interval = size.alloc_length();
                let fresh = state.fresh_ref();
                // the reference itself is not tracked further
                nf.stack.push(D::top());
                nf.pc = pc.next();
                let mut aheap = state.aheap.clone();
                aheap.insert(fresh, interval);
                succs.push(AbstractState {
                    frame: nf,
                    status: Status::Ok,
                    aheap,
                });
            }

            Opcode::ArrayLength => {
                let mut nf = frame.clone();
                let _aref = pop(&mut nf, pc)?;
                nf.stack.push(D::of_length(LengthInterval::top()));
                nf.pc = pc.next();
                succs.push(carry(state, nf, Status::Ok));
            }

            Opcode::ArrayLoad { .. } => {
                let mut nf = frame.clone();
                let index = pop(&mut nf, pc)?;
                let _aref = pop(&mut nf, pc)?;
                nf.pc = pc.next();
                let (idx_lo, idx_hi) = index.index_bounds();
                let (may_in, may_oob) = use_site_length(state).may_contain_index(idx_lo, idx_hi);
                if may_oob {
                    succs.push(carry(state, nf.clone(), Status::OutOfBounds));
                }
                if may_in {
                    nf.stack.push(D::top());
                    succs.push(carry(state, nf, Status::Ok));
                }
            }

            Opcode::ArrayStore { .. } => {
                let mut nf = frame.clone();
                let _value = pop(&mut nf, pc)?;
                let index = pop(&mut nf, pc)?;
                let _aref = pop(&mut nf, pc)?;
                nf.pc = pc.next();
                let (idx_lo, idx_hi) = index.index_bounds();
                let (may_in, may_oob) = use_site_length(state).may_contain_index(idx_lo, idx_hi);
                if may_oob {
                    succs.push(carry(state, nf.clone(), Status::OutOfBounds));
                }
                if may_in {
                    succs.push(carry(state, nf, Status::Ok));
                }
            }

            Opcode::InvokeStatic { method } | Opcode::InvokeDynamic { method } => {
                self.invoke(state, method, false, &mut succs)?;
            }

            Opcode::InvokeVirtual { method } | Opcode::InvokeSpecial { method } => {
                self.invoke(state, method, true, &mut succs)?;
            }

            Opcode::Return { .. } => {
                // terminates analysis of the method: no successor
            }

            Opcode::New { .. } => {
                let mut nf = frame.clone();
                nf.stack.push(D::top());
                nf.pc = pc.next();
                succs.push(carry(state, nf, Status::Ok));
            }

            Opcode::Throw => {
                // within this dialect's scope every reachable athrow is the
                // compiler-inserted assertion machinery
                let mut nf = frame.clone();
                let _exception = pop(&mut nf, pc)?;
                nf.pc = pc.next();
                succs.push(carry(state, nf, Status::AssertionError));
            }

            Opcode::Cast { .. } => {
                // narrowing may wrap and change sign
                let mut nf = frame.clone();
                let _v = pop(&mut nf, pc)?;
                nf.stack.push(D::top());
                nf.pc = pc.next();
                succs.push(carry(state, nf, Status::Ok));
            }

            Opcode::Incr { index, amount } => {
                let mut nf = frame.clone();
                let current = nf.local(*index);
                let BinaryOutcome { result, .. } = D::binary(
                    BinaryOp::Add,
                    current,
                    D::of_literal(&Literal::Int(i64::from(*amount))),
                );
                if !result.is_bottom() {
                    nf.locals.insert(*index, result);
                    nf.pc = pc.next();
                    succs.push(carry(state, nf, Status::Ok));
                }
            }
        }

        trace!(
            offset = pc.offset,
            successors = succs.len(),
            "abstract step"
        );
        Ok(succs)
    }

    /// Invocation transfer. Taint-policy roles drive the interesting cases;
    /// everything else consumes per signature and produces the domain's
    /// conservative result. Sign-mode hooks degrade to top, so the same code
    /// path serves both domains.
    fn invoke<D: AbstractDomain>(
        &self,
        state: &AbstractState<D>,
        method: &MethodRef,
        has_receiver: bool,
        succs: &mut Vec<AbstractState<D>>,
    ) -> Result<()> {
        let frame = &state.frame;
        let pc = frame.pc;
        let nargs = method.param_count();
        let consumed = nargs + usize::from(has_receiver);
        if frame.stack.len() < consumed {
            return Err(AnalysisError::malformed(format!(
                "operand stack underflow invoking {} at offset {}",
                method, pc.offset
            )));
        }

        let role = self.policy.classify(method);

        // sinks are checked on the first declared argument before anything
        // is consumed
        if role == Some(PolicyRole::Sink) && nargs > 0 {
            let first_arg = frame.stack[frame.stack.len() - nargs];
            if first_arg.sink_may_violate() {
                let mut nf = frame.clone();
                nf.stack.truncate(nf.stack.len() - consumed);
                nf.pc = pc.next();
                succs.push(carry(state, nf, Status::SqlInjection));
            }
            if first_arg.sink_must_violate() {
                // no non-violating continuation exists
                return Ok(());
            }
        }

        let mut nf = frame.clone();
        let split = nf.stack.len() - consumed;
        let args_join = nf
            .stack
            .split_off(split)
            .into_iter()
            .fold(D::bottom(), |acc, v| acc.join(v));
        nf.pc = pc.next();

        if method.returns.is_some() {
            let result = match role {
                Some(PolicyRole::Source) => D::source_result(),
                Some(PolicyRole::Sink) => D::safe_result(),
                Some(PolicyRole::Combinator) => D::combine_result(args_join),
                None => D::invoke_result(args_join),
            };
            nf.stack.push(result);
        }
        succs.push(carry(state, nf, Status::Ok));
        Ok(())
    }
}

/// Successor state inheriting the pre-state's heap
fn carry<D: AbstractDomain>(
    state: &AbstractState<D>,
    frame: AbstractFrame<D>,
    status: Status,
) -> AbstractState<D> {
    AbstractState {
        frame,
        status,
        aheap: state.aheap.clone(),
    }
}

/// Length abstraction at an array use site. No reference identity is
/// tracked, but every array reachable here is one of the recorded
/// allocations, so the join of the recorded intervals over-approximates the
/// accessed array's length; an empty heap falls back to the unbounded
/// interval.
fn use_site_length<D: AbstractDomain>(state: &AbstractState<D>) -> LengthInterval {
    state
        .aheap
        .values()
        .copied()
        .reduce(LengthInterval::join)
        .unwrap_or_else(LengthInterval::top)
}

fn underflow(pc: ProgramPoint) -> AnalysisError {
    AnalysisError::malformed(format!("operand stack underflow at offset {}", pc.offset))
}

fn pop<D: AbstractDomain>(frame: &mut AbstractFrame<D>, pc: ProgramPoint) -> Result<D> {
    frame.stack.pop().ok_or_else(|| underflow(pc))
}
