//! Judgement tiers, grades and running judgement counts.
//!
//! Tiers are declared best to worst so the derived ordering can be used
//! directly ("better than Miss" is `judgement < Judgement::Miss`).

use crate::models::engine::weights::ACCURACY_WEIGHTS;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hit judgement types from best to worst.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Judgement {
    /// Marvelous, the tightest window.
    Marv,
    /// Perfect timing.
    Perf,
    /// Great timing.
    Great,
    /// Good timing, already costs multiplier.
    Good,
    /// Barely inside the loosest window.
    Okay,
    /// Missed note.
    Miss,
}

impl Judgement {
    /// Number of tiers, including Miss.
    pub const COUNT: usize = 6;

    /// Every tier in declaration order.
    pub const ALL: [Judgement; Judgement::COUNT] = [
        Judgement::Marv,
        Judgement::Perf,
        Judgement::Great,
        Judgement::Good,
        Judgement::Okay,
        Judgement::Miss,
    ];

    /// Tiers that own a timing window (everything but Miss).
    pub const HIT_TIERS: [Judgement; 5] = [
        Judgement::Marv,
        Judgement::Perf,
        Judgement::Great,
        Judgement::Good,
        Judgement::Okay,
    ];

    /// Ordinal used to index the per-tier tables.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns true for every tier better than Miss.
    #[inline]
    pub fn is_hit(self) -> bool {
        self < Judgement::Miss
    }

    pub fn name(self) -> &'static str {
        match self {
            Judgement::Marv => "Marv",
            Judgement::Perf => "Perf",
            Judgement::Great => "Great",
            Judgement::Good => "Good",
            Judgement::Okay => "Okay",
            Judgement::Miss => "Miss",
        }
    }
}

impl fmt::Display for Judgement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Running per-tier judgement counts. Every tier is always present.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgementCounts {
    counts: [u32; Judgement::COUNT],
}

impl JudgementCounts {
    /// Creates counts with every tier at zero.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, judgement: Judgement) -> u32 {
        self.counts[judgement.index()]
    }

    #[inline]
    pub fn increment(&mut self, judgement: Judgement) {
        self.counts[judgement.index()] += 1;
    }

    /// Total number of recorded judgements.
    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// Iterates `(tier, count)` pairs in tier order.
    pub fn iter(&self) -> impl Iterator<Item = (Judgement, u32)> + '_ {
        Judgement::ALL.into_iter().map(|j| (j, self.get(j)))
    }

    /// Calculates accuracy percentage (0-100).
    ///
    /// Weighted average over every recorded judgement, using the accuracy
    /// weights (Marv/Perf 100, Great 50, Good -50, Okay -100, Miss 0).
    /// Negative totals floor at 0.
    pub fn calculate_accuracy(&self) -> f32 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }

        let weighted: i64 = self
            .iter()
            .map(|(j, count)| count as i64 * ACCURACY_WEIGHTS[j.index()] as i64)
            .sum();

        (weighted as f32 / (total as f32 * 100.0)).max(0.0) * 100.0
    }
}

/// Letter grades, best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    XX,
    X,
    SS,
    S,
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Minimum accuracy per grade. F has no entry.
    pub const THRESHOLDS: [(Grade, f32); 8] = [
        (Grade::XX, 100.0),
        (Grade::X, 100.0),
        (Grade::SS, 99.0),
        (Grade::S, 95.0),
        (Grade::A, 90.0),
        (Grade::B, 80.0),
        (Grade::C, 70.0),
        (Grade::D, 60.0),
    ];

    /// Minimum accuracy for this grade.
    pub fn threshold(self) -> f32 {
        Self::THRESHOLDS
            .iter()
            .find(|(grade, _)| *grade == self)
            .map_or(0.0, |(_, min)| *min)
    }

    /// Best grade reached by `accuracy`.
    ///
    /// XX additionally requires every judgement to be a Marv.
    pub fn from_accuracy(accuracy: f32, counts: &JudgementCounts) -> Grade {
        let all_marv = counts.total() > 0 && counts.get(Judgement::Marv) == counts.total();

        Self::THRESHOLDS
            .iter()
            .filter(|(grade, _)| *grade != Grade::XX || all_marv)
            .find(|(_, min)| accuracy >= *min)
            .map_or(Grade::F, |(grade, _)| *grade)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts_of(list: &[(Judgement, u32)]) -> JudgementCounts {
        let mut counts = JudgementCounts::new();
        for &(j, n) in list {
            for _ in 0..n {
                counts.increment(j);
            }
        }
        counts
    }

    #[test]
    fn test_tier_ordering() {
        assert!(Judgement::Marv < Judgement::Perf);
        assert!(Judgement::Okay.is_hit());
        assert!(!Judgement::Miss.is_hit());
        assert_eq!(Judgement::Great.index(), 2);
        assert_eq!(Judgement::Perf.to_string(), "Perf");
    }

    #[test]
    fn test_accuracy_empty_is_zero() {
        assert_eq!(JudgementCounts::new().calculate_accuracy(), 0.0);
    }

    #[test]
    fn test_accuracy_weighted() {
        let counts = counts_of(&[(Judgement::Marv, 1), (Judgement::Great, 1)]);
        assert_eq!(counts.calculate_accuracy(), 75.0);

        let counts = counts_of(&[(Judgement::Perf, 3), (Judgement::Miss, 1)]);
        assert_eq!(counts.calculate_accuracy(), 75.0);
    }

    #[test]
    fn test_accuracy_floors_at_zero() {
        let counts = counts_of(&[(Judgement::Okay, 4), (Judgement::Marv, 1)]);
        assert_eq!(counts.calculate_accuracy(), 0.0);
    }

    #[test]
    fn test_grades() {
        let marvs = counts_of(&[(Judgement::Marv, 5)]);
        assert_eq!(Grade::from_accuracy(100.0, &marvs), Grade::XX);

        let perfs = counts_of(&[(Judgement::Marv, 4), (Judgement::Perf, 1)]);
        assert_eq!(Grade::from_accuracy(100.0, &perfs), Grade::X);

        assert_eq!(Grade::from_accuracy(99.5, &perfs), Grade::SS);
        assert_eq!(Grade::from_accuracy(90.0, &perfs), Grade::A);
        assert_eq!(Grade::from_accuracy(59.9, &perfs), Grade::F);
        assert_eq!(Grade::C.threshold(), 70.0);
        assert_eq!(Grade::F.threshold(), 0.0);
    }
}
