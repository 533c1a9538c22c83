use std::fmt::{Display, Formatter};
use std::ops::Neg;

use crate::utils::{pairing2, pairing3, MyHash};

/// A handle to a node owned by the [`Bdd`][crate::bdd::Bdd] manager.
///
/// The sign encodes a complement edge: `-f` denotes the negation of `f`
/// without allocating any nodes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Ref(i32);

impl Ref {
    pub(crate) const fn positive(index: u32) -> Self {
        Self(index as i32)
    }

    pub const fn is_negated(self) -> bool {
        self.0 < 0
    }

    pub const fn negate(self) -> Self {
        Self(-self.0)
    }

    /// Index of the referenced node in the manager's table.
    pub const fn index(self) -> u32 {
        self.0.unsigned_abs()
    }

    /// Sign-folded representation: `(index << 1) | negated`.
    pub(crate) const fn unsigned(self) -> u32 {
        (self.0.unsigned_abs() << 1) | (self.0 < 0) as u32
    }
}

impl Neg for Ref {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negate()
    }
}

impl Display for Ref {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}@{}",
            if self.is_negated() { "~" } else { "" },
            self.index()
        )
    }
}

impl MyHash for Ref {
    fn hash(&self) -> u64 {
        self.unsigned() as u64
    }
}

impl MyHash for (Ref, Ref) {
    fn hash(&self) -> u64 {
        pairing2(self.0.unsigned() as u64, self.1.unsigned() as u64)
    }
}

impl MyHash for (Ref, Ref, Ref) {
    fn hash(&self) -> u64 {
        pairing3(
            self.0.unsigned() as u64,
            self.1.unsigned() as u64,
            self.2.unsigned() as u64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negation() {
        let f = Ref::positive(42);
        assert!(!f.is_negated());
        assert!((-f).is_negated());
        assert_eq!(-(-f), f);
        assert_eq!((-f).index(), 42);
    }

    #[test]
    fn test_unsigned_distinguishes_sign() {
        let f = Ref::positive(7);
        assert_ne!(f.unsigned(), (-f).unsigned());
    }
}
