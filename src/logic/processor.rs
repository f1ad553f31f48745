//! Score processor for the keys ruleset.
//!
//! Classifies one player action against a hit object, then folds the
//! judgement into combo, multiplier, score, accuracy and health. Score is
//! normalized against the maximum a perfect run could reach, computed once
//! from the chart when the processor is built.

use crate::error::{Error, Result};
use crate::models::engine::hit_window::HitWindow;
use crate::models::engine::note::{HitObject, total_judgements};
use crate::models::engine::weights::{health_weight, score_weight};
use crate::models::stats::{Grade, Judgement, JudgementCounts};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Score out of which every play is normalized.
pub const MAX_SCORE: u32 = 1_000_000;

/// The multiplier stops growing at this count (index 15, +150 per hit).
const MULTIPLIER_CAP: i32 = 150;
const GOOD_MULTIPLIER_PENALTY: i32 = 10;
const MISS_MULTIPLIER_PENALTY: i32 = 20;

const MAX_HEALTH: f32 = 100.0;

/// Base of the closed form used once the multiplier cap is reachable.
const SUMMED_SCORE_BASE: u64 = 25650;
/// Per-judgement value of a Marv once the multiplier index is maxed.
const SUMMED_SCORE_PER_HIT: u64 = 250;

/// Maximum score counter reachable on a chart with `total_judgements`.
pub fn summed_score(total_judgements: u32) -> u64 {
    let total = total_judgements as u64;
    let combo_cap = MULTIPLIER_CAP as u64;

    if total < combo_cap {
        (1..=total).map(|i| 100 + 10 * (i / 10)).sum()
    } else {
        SUMMED_SCORE_BASE + (total - (combo_cap - 1)) * SUMMED_SCORE_PER_HIT
    }
}

/// Public running state of a play.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreState {
    /// Weighted accuracy, 0-100.
    pub accuracy: f32,
    /// Score out of `MAX_SCORE`.
    pub score: u32,
    pub combo: u32,
    pub max_combo: u32,
    /// Health bar, clamped to 0-100.
    pub health: f32,
    pub judgements: JudgementCounts,
}

impl ScoreState {
    pub fn new() -> Self {
        Self {
            accuracy: 0.0,
            score: 0,
            combo: 0,
            max_combo: 0,
            health: MAX_HEALTH,
            judgements: JudgementCounts::new(),
        }
    }

    /// Grade reached with the current accuracy.
    pub fn grade(&self) -> Grade {
        Grade::from_accuracy(self.accuracy, &self.judgements)
    }
}

impl Default for ScoreState {
    fn default() -> Self {
        Self::new()
    }
}

/// Values after one processed judgement.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub judgement: Judgement,
    pub accuracy: f32,
    pub score: u32,
    pub health: f32,
    pub combo: u32,
    pub max_combo: u32,
}

/// One judged player action, printable as a diagnostic line.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessedAction {
    pub hit_object: HitObject,
    pub song_time: f64,
    #[serde(flatten)]
    pub snapshot: ScoreSnapshot,
}

impl fmt::Display for ProcessedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Object - ({},{})@{} - {} - {}% - {} - {}",
            self.hit_object.start_time,
            self.hit_object.lane,
            self.song_time,
            self.snapshot.judgement,
            self.snapshot.accuracy,
            self.snapshot.score,
            self.snapshot.health
        )
    }
}

pub struct ScoreProcessor {
    hit_window: HitWindow,
    total_judgements: u32,
    summed_score: u64,

    multiplier_count: i32,
    multiplier_index: i32,
    score_count: u64,

    state: ScoreState,
}

impl ScoreProcessor {
    /// Builds a processor with the default window table.
    pub fn new(hit_objects: &[HitObject]) -> Result<Self> {
        Self::with_hit_window(hit_objects, HitWindow::new())
    }

    /// Builds a processor for a chart. Empty charts are rejected since the
    /// maximum score would be zero.
    pub fn with_hit_window(hit_objects: &[HitObject], hit_window: HitWindow) -> Result<Self> {
        if hit_objects.is_empty() {
            return Err(Error::EmptyChart);
        }
        hit_window.validate()?;

        let total_judgements = total_judgements(hit_objects);
        let summed_score = summed_score(total_judgements);

        log::debug!(
            "PROCESSOR: {} objects, {} judgements, summed score {}",
            hit_objects.len(),
            total_judgements,
            summed_score
        );

        Ok(Self {
            hit_window,
            total_judgements,
            summed_score,
            multiplier_count: 0,
            multiplier_index: 0,
            score_count: 0,
            state: ScoreState::new(),
        })
    }

    pub fn state(&self) -> &ScoreState {
        &self.state
    }

    pub fn hit_window(&self) -> &HitWindow {
        &self.hit_window
    }

    pub fn total_judgements(&self) -> u32 {
        self.total_judgements
    }

    pub fn summed_score(&self) -> u64 {
        self.summed_score
    }

    /// Classifies an action against `hit_object`.
    ///
    /// With the key held, the first window containing the deviation wins and
    /// its count is recorded. `None` means the action is outside every window
    /// and nothing was recorded. Without the key held the object is a Miss.
    pub fn classify(
        &mut self,
        hit_object: &HitObject,
        song_time: f64,
        is_key_held: bool,
    ) -> Option<Judgement> {
        let judgement = if is_key_held {
            self.hit_window
                .judge(hit_object.start_time as f64 - song_time)?
        } else {
            Judgement::Miss
        };

        self.state.judgements.increment(judgement);
        Some(judgement)
    }

    /// Classifies an action and folds the result into the running state.
    ///
    /// Returns `None` (and changes nothing) when the action is too early or
    /// too late to count.
    pub fn process(
        &mut self,
        hit_object: &HitObject,
        song_time: f64,
        is_key_held: bool,
    ) -> Option<ProcessedAction> {
        let judgement = self.classify(hit_object, song_time, is_key_held)?;
        let snapshot = self.accumulate(judgement);

        let action = ProcessedAction {
            hit_object: *hit_object,
            song_time,
            snapshot,
        };
        log::debug!("{action}");
        Some(action)
    }

    /// Records a judgement decided elsewhere and folds it into the state.
    #[cfg(test)]
    fn record(&mut self, judgement: Judgement) -> ScoreSnapshot {
        self.state.judgements.increment(judgement);
        self.accumulate(judgement)
    }

    fn accumulate(&mut self, judgement: Judgement) -> ScoreSnapshot {
        self.state.accuracy = self.state.judgements.calculate_accuracy();

        if judgement.is_hit() {
            if judgement == Judgement::Good {
                self.multiplier_count = (self.multiplier_count - GOOD_MULTIPLIER_PENALTY).max(0);
            } else {
                self.multiplier_count = (self.multiplier_count + 1).min(MULTIPLIER_CAP);
            }

            self.state.combo += 1;
            self.state.max_combo = self.state.max_combo.max(self.state.combo);
        } else {
            self.multiplier_count = (self.multiplier_count - MISS_MULTIPLIER_PENALTY).max(0);
            self.state.combo = 0;
        }

        self.multiplier_index = self.multiplier_count / 10;
        self.score_count += (score_weight(judgement) + self.multiplier_index * 10) as u64;
        self.state.score =
            (MAX_SCORE as f64 * (self.score_count as f64 / self.summed_score as f64)) as u32;

        self.state.health = (self.state.health + health_weight(judgement)).clamp(0.0, MAX_HEALTH);

        self.snapshot(judgement)
    }

    fn snapshot(&self, judgement: Judgement) -> ScoreSnapshot {
        ScoreSnapshot {
            judgement,
            accuracy: self.state.accuracy,
            score: self.state.score,
            health: self.state.health,
            combo: self.state.combo,
            max_combo: self.state.max_combo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn taps(count: i32) -> Vec<HitObject> {
        (0..count).map(|i| HitObject::tap(1000 + i * 200, (i % 4) as usize)).collect()
    }

    #[test]
    fn test_summed_score_table() {
        assert_eq!(summed_score(1), 100);
        assert_eq!(summed_score(10), 1010);
        assert_eq!(summed_score(149), 25400);
        assert_eq!(summed_score(150), 25900);
        assert_eq!(summed_score(200), 25650 + 51 * 250);
    }

    #[test]
    fn test_summed_score_monotonic() {
        for total in 1..400 {
            assert!(summed_score(total + 1) > summed_score(total), "at {total}");
        }
    }

    #[test]
    fn test_empty_chart_rejected() {
        assert!(matches!(ScoreProcessor::new(&[]), Err(Error::EmptyChart)));
    }

    #[test]
    fn test_total_judgements_long_notes() {
        let objects = vec![HitObject::long_note(0, 0, 500), HitObject::long_note(100, 1, 300)];
        let processor = ScoreProcessor::new(&objects).unwrap();
        assert_eq!(processor.total_judgements(), 4);
        assert_eq!(processor.summed_score(), 400);
    }

    #[test]
    fn test_classify_windows() {
        let objects = taps(1);
        let mut processor = ScoreProcessor::new(&objects).unwrap();
        let object = objects[0];
        let t = object.start_time as f64;

        assert_eq!(processor.classify(&object, t + 50.0, true), Some(Judgement::Great));
        assert_eq!(processor.classify(&object, t - 16.0, true), Some(Judgement::Marv));
        assert_eq!(processor.classify(&object, t + 128.0, true), None);
        assert_eq!(processor.classify(&object, t + 500.0, false), Some(Judgement::Miss));

        let counts = &processor.state().judgements;
        assert_eq!(counts.get(Judgement::Great), 1);
        assert_eq!(counts.get(Judgement::Marv), 1);
        assert_eq!(counts.get(Judgement::Miss), 1);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_none_is_noop() {
        let objects = taps(2);
        let mut processor = ScoreProcessor::new(&objects).unwrap();
        let before = processor.state().clone();

        assert_eq!(processor.process(&objects[0], 0.0, true), None);
        assert_eq!(processor.state(), &before);
    }

    #[test]
    fn test_all_marv_is_max_score() {
        let objects = taps(10);
        let mut processor = ScoreProcessor::new(&objects).unwrap();

        let mut last = None;
        for object in &objects {
            last = processor.process(object, object.start_time as f64, true);
        }

        let last = last.unwrap();
        assert_eq!(last.snapshot.score, MAX_SCORE);
        assert_eq!(last.snapshot.accuracy, 100.0);
        assert_eq!(last.snapshot.combo, 10);
        assert_eq!(processor.state().grade(), Grade::XX);
    }

    #[test]
    fn test_mixed_golden() {
        let objects = taps(3);
        let mut processor = ScoreProcessor::new(&objects).unwrap();

        let marv = processor.record(Judgement::Marv);
        assert_eq!((marv.score, marv.combo, marv.health), (333333, 1, 100.0));

        let good = processor.record(Judgement::Good);
        assert_eq!((good.score, good.combo, good.health), (366666, 2, 98.0));

        let miss = processor.record(Judgement::Miss);
        assert_eq!((miss.score, miss.combo, miss.max_combo), (366666, 0, 2));
        assert_eq!(miss.health, 95.0);
        assert!((miss.accuracy - 16.666_666).abs() < 1e-4);
    }

    #[test]
    fn test_multiplier_penalties() {
        let objects = taps(40);
        let mut processor = ScoreProcessor::new(&objects).unwrap();

        for _ in 0..25 {
            processor.record(Judgement::Marv);
        }
        assert_eq!(processor.multiplier_index, 2);

        processor.record(Judgement::Good);
        assert_eq!(processor.multiplier_count, 15);
        assert_eq!(processor.multiplier_index, 1);

        processor.record(Judgement::Miss);
        assert_eq!(processor.multiplier_count, 0);

        processor.record(Judgement::Miss);
        assert_eq!(processor.multiplier_count, 0);

        // Okay still grows the multiplier.
        processor.record(Judgement::Okay);
        assert_eq!(processor.multiplier_count, 1);
    }

    #[test]
    fn test_multiplier_caps() {
        let objects = taps(300);
        let mut processor = ScoreProcessor::new(&objects).unwrap();
        for _ in 0..300 {
            processor.record(Judgement::Marv);
        }
        assert_eq!(processor.multiplier_count, 150);
        assert_eq!(processor.multiplier_index, 15);
    }

    #[test]
    fn test_health_clamped() {
        let objects = taps(100);
        let mut processor = ScoreProcessor::new(&objects).unwrap();
        for _ in 0..40 {
            processor.record(Judgement::Miss);
        }
        assert_eq!(processor.state().health, 0.0);

        processor.record(Judgement::Marv);
        assert_eq!(processor.state().health, 0.5);
    }

    #[test]
    fn test_random_play_invariants() {
        let objects = taps(500);
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut processor = ScoreProcessor::new(&objects).unwrap();
        let mut processed = 0;
        let mut previous_max = 0;

        for object in &objects {
            let offset = rng.random_range(-150.0..150.0);
            let held = rng.random_bool(0.9);
            let combo_before = processor.state().combo;

            let Some(action) = processor.process(object, object.start_time as f64 + offset, held)
            else {
                continue;
            };
            processed += 1;

            let snapshot = action.snapshot;
            assert!((0.0..=100.0).contains(&snapshot.health));
            assert!((0.0..=100.0).contains(&snapshot.accuracy));
            if snapshot.judgement.is_hit() {
                assert_eq!(snapshot.combo, combo_before + 1);
            } else {
                assert_eq!(snapshot.combo, 0);
            }
            assert!(snapshot.max_combo >= previous_max);
            assert!(snapshot.max_combo >= snapshot.combo);
            previous_max = snapshot.max_combo;
        }

        assert_eq!(processor.state().judgements.total(), processed);
    }

    #[test]
    fn test_deterministic_output() {
        let objects = taps(200);
        let mut rng = StdRng::seed_from_u64(42);
        let inputs: Vec<(usize, f64, bool)> = (0..objects.len())
            .map(|i| {
                let t = objects[i].start_time as f64 + rng.random_range(-140.0..140.0);
                (i, t, rng.random_bool(0.95))
            })
            .collect();

        let run = || {
            let mut processor = ScoreProcessor::new(&objects).unwrap();
            inputs
                .iter()
                .filter_map(|&(i, t, held)| processor.process(&objects[i], t, held))
                .map(|action| action.to_string())
                .collect::<Vec<_>>()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_diagnostic_line() {
        let objects = vec![HitObject::tap(1000, 2)];
        let mut processor = ScoreProcessor::new(&objects).unwrap();
        let action = processor.process(&objects[0], 1010.0, true).unwrap();
        assert_eq!(
            action.to_string(),
            "Object - (1000,2)@1010 - Marv - 100% - 1000000 - 100"
        );
    }
}
