//! Abstract value domains
//!
//! The transfer function is parametric in the value domain: `SignSet` for
//! integer reasoning, `TaintValue` for information flow. Both implement
//! `AbstractDomain`, the seam the interpreter dispatches through.
//! `LengthInterval` is not a stack value domain; it participates only in the
//! abstract heap.

pub mod length;
pub mod sign;
pub mod taint;

pub use length::LengthInterval;
pub use sign::SignSet;
pub use taint::TaintValue;

use std::fmt;
use std::hash::Hash;

use crate::shared::models::{BinaryOp, CmpCond, InputValue, Literal};

/// Result of abstract binary arithmetic. A bottom `result` means the
/// operation has no feasible outcome and the transfer emits no ok edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryOutcome<D> {
    pub result: D,
    pub may_divide_by_zero: bool,
}

impl<D> BinaryOutcome<D> {
    /// An outcome that can never divide by zero
    pub fn total(result: D) -> Self {
        Self {
            result,
            may_divide_by_zero: false,
        }
    }
}

/// Which successors of a conditional branch are feasible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchFeasibility {
    pub jump: bool,
    pub fall: bool,
}

impl BranchFeasibility {
    pub fn both() -> Self {
        Self {
            jump: true,
            fall: true,
        }
    }

    pub fn neither() -> Self {
        Self {
            jump: false,
            fall: false,
        }
    }
}

/// Finite-height join-semilattice of abstract stack/local values, plus the
/// hooks the transfer function needs: constant abstraction, arithmetic,
/// branch feasibility, the array-size/index views, and the taint-policy
/// hooks (which degrade to top / never-violate outside the taint domain).
pub trait AbstractDomain:
    Copy + Clone + PartialEq + Eq + Hash + fmt::Debug + fmt::Display + 'static
{
    fn top() -> Self;
    fn bottom() -> Self;
    fn join(self, other: Self) -> Self;
    fn is_bottom(self) -> bool;

    /// Abstraction of a pushed constant
    fn of_literal(lit: &Literal) -> Self;
    /// Abstraction of an invocation input
    fn of_input(input: &InputValue) -> Self;
    /// Value pushed for the compiler-generated assertions-disabled flag
    fn assertion_flag() -> Self;
    /// Value of an array length known to lie in `interval`
    fn of_length(interval: LengthInterval) -> Self;

    /// Abstract integer arithmetic
    fn binary(op: BinaryOp, lhs: Self, rhs: Self) -> BinaryOutcome<Self>;

    /// Feasible sides of a branch-on-zero over this value
    fn zero_branch(self, cond: CmpCond) -> BranchFeasibility;

    /// Length interval of an array allocated with this size abstraction
    fn alloc_length(self) -> LengthInterval;

    /// Closed index range this value may denote; `lo > hi` encodes the empty
    /// range (bottom index, no feasible access)
    fn index_bounds(self) -> (i64, i64);

    /// Result of a policy-matched taint source
    fn source_result() -> Self {
        Self::top()
    }

    /// Result of a sink invocation on the non-violating path
    fn safe_result() -> Self {
        Self::top()
    }

    /// Feeding this value to a sink may violate the policy
    fn sink_may_violate(self) -> bool {
        false
    }

    /// Feeding this value to a sink definitely violates the policy
    fn sink_must_violate(self) -> bool {
        false
    }

    /// Result of an uninterpreted invocation; `args_join` is the join of the
    /// consumed arguments (bottom when the method takes none)
    fn invoke_result(args_join: Self) -> Self {
        let _ = args_join;
        Self::top()
    }

    /// Result of a string-combinator invocation
    fn combine_result(args_join: Self) -> Self {
        Self::invoke_result(args_join)
    }
}

impl AbstractDomain for SignSet {
    fn top() -> Self {
        SignSet::top()
    }

    fn bottom() -> Self {
        SignSet::bot()
    }

    fn join(self, other: Self) -> Self {
        self | other
    }

    fn is_bottom(self) -> bool {
        self.is_bot()
    }

    fn of_literal(lit: &Literal) -> Self {
        match lit {
            Literal::Int(v) => SignSet::of_int(*v),
            Literal::Boolean(b) => SignSet::of_int(i64::from(*b)),
            // code points are never negative
            Literal::Char(c) => SignSet::of_int(*c as i64),
            Literal::Str(_) | Literal::Null => SignSet::top(),
        }
    }

    fn of_input(input: &InputValue) -> Self {
        match input {
            InputValue::Int(v) => SignSet::of_int(*v),
            InputValue::Boolean(b) => SignSet::of_int(i64::from(*b)),
            InputValue::Char(c) => SignSet::of_int(*c as i64),
            InputValue::IntArray(_) | InputValue::CharArray(_) | InputValue::Reference(_) => {
                SignSet::top()
            }
        }
    }

    fn assertion_flag() -> Self {
        SignSet::zero()
    }

    fn of_length(interval: LengthInterval) -> Self {
        if interval.lo() == 0 && interval.hi() == Some(0) {
            SignSet::zero()
        } else if interval.lo() >= 1 {
            SignSet::pos()
        } else {
            SignSet::zero() | SignSet::pos()
        }
    }

    fn binary(op: BinaryOp, lhs: Self, rhs: Self) -> BinaryOutcome<Self> {
        match op {
            BinaryOp::Add => BinaryOutcome::total(lhs.add(rhs)),
            BinaryOp::Sub => BinaryOutcome::total(lhs.sub(rhs)),
            BinaryOp::Mul => BinaryOutcome::total(lhs.mul(rhs)),
            BinaryOp::Div => {
                let (result, dz) = lhs.div(rhs);
                BinaryOutcome {
                    result,
                    may_divide_by_zero: dz,
                }
            }
            BinaryOp::Rem => {
                let (result, dz) = lhs.rem(rhs);
                BinaryOutcome {
                    result,
                    may_divide_by_zero: dz,
                }
            }
        }
    }

    fn zero_branch(self, cond: CmpCond) -> BranchFeasibility {
        if self.is_bot() {
            return BranchFeasibility::neither();
        }
        let (jump, fall) = match cond {
            CmpCond::Eq => (self.may_be_zero(), self.may_be_nonzero()),
            CmpCond::Ne => (self.may_be_nonzero(), self.may_be_zero()),
            CmpCond::Lt => (self.may_be_neg(), self.may_be_zero() || self.may_be_pos()),
            CmpCond::Le => (self.may_be_neg() || self.may_be_zero(), self.may_be_pos()),
            CmpCond::Gt => (self.may_be_pos(), self.may_be_neg() || self.may_be_zero()),
            CmpCond::Ge => (self.may_be_pos() || self.may_be_zero(), self.may_be_neg()),
        };
        BranchFeasibility { jump, fall }
    }

    fn alloc_length(self) -> LengthInterval {
        if self == SignSet::zero() {
            LengthInterval::constant(0)
        } else if self == SignSet::pos() {
            LengthInterval::new(1, None)
        } else {
            // bottom, possibly-negative or mixed sizes: no usable bound
            LengthInterval::top()
        }
    }

    fn index_bounds(self) -> (i64, i64) {
        let lo = if self.may_be_neg() {
            i64::MIN
        } else if self.may_be_zero() {
            0
        } else {
            1
        };
        let hi = if self.may_be_pos() {
            i64::MAX
        } else if self.may_be_zero() {
            0
        } else {
            -1
        };
        (lo, hi)
    }
}

impl AbstractDomain for TaintValue {
    fn top() -> Self {
        TaintValue::Unknown
    }

    fn bottom() -> Self {
        TaintValue::Bottom
    }

    fn join(self, other: Self) -> Self {
        TaintValue::join(self, other)
    }

    fn is_bottom(self) -> bool {
        self == TaintValue::Bottom
    }

    fn of_literal(_lit: &Literal) -> Self {
        TaintValue::Safe
    }

    fn of_input(_input: &InputValue) -> Self {
        TaintValue::Safe
    }

    fn assertion_flag() -> Self {
        TaintValue::Safe
    }

    fn of_length(_interval: LengthInterval) -> Self {
        TaintValue::Safe
    }

    fn binary(_op: BinaryOp, lhs: Self, rhs: Self) -> BinaryOutcome<Self> {
        if lhs.is_bottom() || rhs.is_bottom() {
            return BinaryOutcome::total(TaintValue::Bottom);
        }
        // taint flows through arithmetic; division cannot fail here, the
        // sign domain owns numeric error edges
        BinaryOutcome::total(lhs.join(rhs))
    }

    fn zero_branch(self, _cond: CmpCond) -> BranchFeasibility {
        if self.is_bottom() {
            BranchFeasibility::neither()
        } else {
            BranchFeasibility::both()
        }
    }

    fn alloc_length(self) -> LengthInterval {
        LengthInterval::top()
    }

    fn index_bounds(self) -> (i64, i64) {
        if self.is_bottom() {
            (1, -1)
        } else {
            (i64::MIN, i64::MAX)
        }
    }

    fn source_result() -> Self {
        TaintValue::Tainted
    }

    fn safe_result() -> Self {
        TaintValue::Safe
    }

    fn sink_may_violate(self) -> bool {
        self.may_be_tainted()
    }

    fn sink_must_violate(self) -> bool {
        self.is_tainted()
    }

    fn invoke_result(args_join: Self) -> Self {
        if args_join.is_bottom() {
            TaintValue::Unknown
        } else {
            args_join
        }
    }

    fn combine_result(args_join: Self) -> Self {
        if args_join.is_bottom() {
            // a combinator over constants only produces a safe literal
            TaintValue::Safe
        } else {
            args_join
        }
    }
}
