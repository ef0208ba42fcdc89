//! Length intervals for the abstract array heap
//!
//! `[lo, hi]` over non-negative lengths, `hi = None` meaning unbounded. The
//! stack/local value domain never carries these; they live only in the
//! abstract heap and are consulted by the bounds check of array accesses.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LengthInterval {
    lo: u64,
    /// `None` = unbounded
    hi: Option<u64>,
}

impl LengthInterval {
    /// Exact length `[n, n]`
    pub fn constant(n: u64) -> Self {
        Self { lo: n, hi: Some(n) }
    }

    /// `[0, ∞)`, no information
    pub fn top() -> Self {
        Self { lo: 0, hi: None }
    }

    /// `[lo, hi]`; `hi = None` for unbounded. Panics in debug builds if
    /// lo > hi.
    pub fn new(lo: u64, hi: Option<u64>) -> Self {
        debug_assert!(hi.map_or(true, |h| lo <= h));
        Self { lo, hi }
    }

    pub fn lo(&self) -> u64 {
        self.lo
    }

    pub fn hi(&self) -> Option<u64> {
        self.hi
    }

    /// Least upper bound: (min lo, max hi), unbounded absorbing.
    pub fn join(self, other: Self) -> Self {
        let hi = match (self.hi, other.hi) {
            (Some(a), Some(b)) => Some(a.max(b)),
            _ => None,
        };
        Self {
            lo: self.lo.min(other.lo),
            hi,
        }
    }

    /// Shift both bounds by a constant, clamping at zero.
    pub fn add_const(self, k: i64) -> Self {
        let shift = |v: u64| -> u64 {
            if k >= 0 {
                v.saturating_add(k as u64)
            } else {
                v.saturating_sub(k.unsigned_abs())
            }
        };
        Self {
            lo: shift(self.lo),
            hi: self.hi.map(shift),
        }
    }

    /// Feasibility of an access with index in `[idx_lo, idx_hi]` against an
    /// array whose length lies in this interval. Returns
    /// `(may_in_bounds, may_out_of_bounds)`; both can hold at once, in which
    /// case the access produces two successor edges.
    pub fn may_contain_index(self, idx_lo: i64, idx_hi: i64) -> (bool, bool) {
        let may_oob = idx_lo < 0 || (idx_hi >= 0 && idx_hi as u64 >= self.lo);

        let may_in = if idx_hi < 0 {
            false
        } else {
            let nn_lo = idx_lo.max(0) as u64;
            let nn_hi = idx_hi as u64;
            if nn_lo > nn_hi {
                false
            } else {
                match self.hi {
                    None => true,
                    Some(h) => h > nn_lo,
                }
            }
        };

        (may_in, may_oob)
    }
}

impl fmt::Display for LengthInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.hi {
            Some(h) => write!(f, "[{}, {}]", self.lo, h),
            None => write!(f, "[{}, ∞]", self.lo),
        }
    }
}
