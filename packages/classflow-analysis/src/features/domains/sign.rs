//! Sign lattice
//!
//! The power set of {−, 0, +} encoded as a 3-bit mask. Bottom is the empty
//! set (no concrete value), top is all three signs. Abstract arithmetic
//! follows the rule of signs; division and remainder additionally report a
//! may-divide-by-zero flag.

use std::fmt;
use std::ops::BitOr;

const NEG: u8 = 0b001;
const ZERO: u8 = 0b010;
const POS: u8 = 0b100;
const ALL: u8 = NEG | ZERO | POS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignSet {
    mask: u8,
}

impl SignSet {
    pub fn neg() -> Self {
        Self { mask: NEG }
    }

    pub fn zero() -> Self {
        Self { mask: ZERO }
    }

    pub fn pos() -> Self {
        Self { mask: POS }
    }

    pub fn bot() -> Self {
        Self { mask: 0 }
    }

    pub fn top() -> Self {
        Self { mask: ALL }
    }

    pub fn of_int(v: i64) -> Self {
        if v < 0 {
            Self::neg()
        } else if v > 0 {
            Self::pos()
        } else {
            Self::zero()
        }
    }

    /// Abstraction of a set of concrete integers
    pub fn abstracting(items: impl IntoIterator<Item = i64>) -> Self {
        items
            .into_iter()
            .fold(Self::bot(), |acc, v| acc | Self::of_int(v))
    }

    pub fn is_bot(self) -> bool {
        self.mask == 0
    }

    pub fn may_be_neg(self) -> bool {
        self.mask & NEG != 0
    }

    pub fn may_be_zero(self) -> bool {
        self.mask & ZERO != 0
    }

    pub fn may_be_pos(self) -> bool {
        self.mask & POS != 0
    }

    pub fn may_be_nonzero(self) -> bool {
        self.mask & (NEG | POS) != 0
    }

    /// Subset inclusion: the lattice partial order
    pub fn le(self, other: Self) -> bool {
        self.mask & other.mask == self.mask
    }

    fn from_flags(neg: bool, zero: bool, pos: bool) -> Self {
        let mask = (if neg { NEG } else { 0 })
            | (if zero { ZERO } else { 0 })
            | (if pos { POS } else { 0 });
        Self { mask }
    }

    pub fn negate(self) -> Self {
        Self::from_flags(self.may_be_pos(), self.may_be_zero(), self.may_be_neg())
    }

    pub fn add(self, b: Self) -> Self {
        let a = self;
        if a.is_bot() || b.is_bot() {
            return Self::bot();
        }
        let neg = a.may_be_neg() || b.may_be_neg();
        let pos = a.may_be_pos() || b.may_be_pos();
        let zero = a.may_be_zero()
            || b.may_be_zero()
            || (a.may_be_neg() && b.may_be_pos())
            || (a.may_be_pos() && b.may_be_neg());
        Self::from_flags(neg, zero, pos)
    }

    pub fn sub(self, b: Self) -> Self {
        self.add(b.negate())
    }

    pub fn mul(self, b: Self) -> Self {
        let a = self;
        if a.is_bot() || b.is_bot() {
            return Self::bot();
        }
        let zero = a.may_be_zero() || b.may_be_zero();
        let neg = (a.may_be_neg() && b.may_be_pos()) || (a.may_be_pos() && b.may_be_neg());
        let pos = (a.may_be_pos() && b.may_be_pos()) || (a.may_be_neg() && b.may_be_neg());
        Self::from_flags(neg, zero, pos)
    }

    /// Abstract division: `(quotient signs, may divide by zero)`. A divisor
    /// with no non-zero sign yields bottom (no feasible quotient).
    pub fn div(self, b: Self) -> (Self, bool) {
        let a = self;
        let dz = b.may_be_zero();
        if !b.may_be_nonzero() || a.is_bot() {
            return (Self::bot(), dz);
        }
        let neg = (a.may_be_neg() && b.may_be_pos()) || (a.may_be_pos() && b.may_be_neg());
        let pos = (a.may_be_pos() && b.may_be_pos()) || (a.may_be_neg() && b.may_be_neg());
        // Truncation of |a| < |b| towards zero is not modelled; zero appears
        // in the quotient only when the dividend admits it.
        let zero = a.may_be_zero();
        (Self::from_flags(neg, zero, pos), dz)
    }

    /// Abstract remainder: result keeps the dividend's sign possibilities and
    /// admits zero whenever the dividend is non-bottom.
    pub fn rem(self, b: Self) -> (Self, bool) {
        let a = self;
        let dz = b.may_be_zero();
        if !b.may_be_nonzero() || a.is_bot() {
            return (Self::bot(), dz);
        }
        let neg = a.may_be_neg();
        let pos = a.may_be_pos();
        let zero = !a.is_bot();
        (Self::from_flags(neg, zero, pos), dz)
    }
}

impl BitOr for SignSet {
    type Output = SignSet;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            mask: self.mask | rhs.mask,
        }
    }
}

impl fmt::Display for SignSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mask == 0 {
            return write!(f, "⊥");
        }
        if self.mask == ALL {
            return write!(f, "⊤");
        }
        let mut parts = Vec::new();
        if self.may_be_neg() {
            parts.push("−");
        }
        if self.may_be_zero() {
            parts.push("0");
        }
        if self.may_be_pos() {
            parts.push("+");
        }
        write!(f, "{{{}}}", parts.join(","))
    }
}
