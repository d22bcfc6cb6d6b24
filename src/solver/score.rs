//! Two-level score.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Sub};

/// A score with separate hard and soft levels.
///
/// Both levels are penalties (zero or negative). Hard levels are compared
/// first; a solution is feasible iff its hard level is zero.
///
/// ```
/// use duty_roster::solver::HardSoftScore;
///
/// let broken = HardSoftScore::of(-1, 0);
/// let poor = HardSoftScore::of(0, -500);
/// assert!(poor > broken);
/// assert!(HardSoftScore::of(0, -50) > poor);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HardSoftScore {
    hard: i64,
    soft: i64,
}

impl HardSoftScore {
    /// The zero score.
    pub const ZERO: HardSoftScore = HardSoftScore { hard: 0, soft: 0 };

    /// Creates a score.
    #[inline]
    pub const fn of(hard: i64, soft: i64) -> Self {
        Self { hard, soft }
    }

    /// Hard penalty only.
    #[inline]
    pub const fn of_hard(hard: i64) -> Self {
        Self { hard, soft: 0 }
    }

    /// Soft penalty only.
    #[inline]
    pub const fn of_soft(soft: i64) -> Self {
        Self { hard: 0, soft }
    }

    /// Hard level.
    #[inline]
    pub const fn hard(&self) -> i64 {
        self.hard
    }

    /// Soft level.
    #[inline]
    pub const fn soft(&self) -> i64 {
        self.soft
    }

    /// Whether no hard constraint is broken.
    #[inline]
    pub const fn is_feasible(&self) -> bool {
        self.hard >= 0
    }
}

impl Ord for HardSoftScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.hard
            .cmp(&other.hard)
            .then_with(|| self.soft.cmp(&other.soft))
    }
}

impl PartialOrd for HardSoftScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for HardSoftScore {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::of(self.hard + rhs.hard, self.soft + rhs.soft)
    }
}

impl AddAssign for HardSoftScore {
    fn add_assign(&mut self, rhs: Self) {
        self.hard += rhs.hard;
        self.soft += rhs.soft;
    }
}

impl Sub for HardSoftScore {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::of(self.hard - rhs.hard, self.soft - rhs.soft)
    }
}

impl std::iter::Sum for HardSoftScore {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for HardSoftScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}hard/{}soft", self.hard, self.soft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_hard_first() {
        assert!(HardSoftScore::of(0, -1000) > HardSoftScore::of(-1, 0));
        assert!(HardSoftScore::of(-1, -10) > HardSoftScore::of(-1, -20));
        assert_eq!(
            HardSoftScore::of(-2, 5).max(HardSoftScore::of(-3, 100)),
            HardSoftScore::of(-2, 5)
        );
    }

    #[test]
    fn test_arithmetic() {
        let a = HardSoftScore::of(-1, -50);
        let b = HardSoftScore::of_soft(-200);
        assert_eq!(a + b, HardSoftScore::of(-1, -250));
        assert_eq!((a + b) - b, a);
        let total: HardSoftScore = [a, b, HardSoftScore::of_hard(-2)].into_iter().sum();
        assert_eq!(total, HardSoftScore::of(-3, -250));
    }

    #[test]
    fn test_feasible_and_display() {
        assert!(HardSoftScore::of_soft(-10).is_feasible());
        assert!(!HardSoftScore::of_hard(-1).is_feasible());
        assert_eq!(HardSoftScore::of(-1, -50).to_string(), "-1hard/-50soft");
    }
}
