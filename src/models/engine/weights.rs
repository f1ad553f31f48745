//! Per-judgement weight tables for the keys ruleset.
//!
//! Indexed by `Judgement::index()`. These are engine constants and are not
//! exposed to configuration.

use crate::models::stats::Judgement;

/// Points added to the score counter per judgement, before the multiplier bonus.
pub const SCORE_WEIGHTS: [i32; Judgement::COUNT] = [100, 50, 25, 10, 5, 0];

/// Contribution of each judgement to the accuracy average (out of 100).
pub const ACCURACY_WEIGHTS: [i32; Judgement::COUNT] = [100, 100, 50, -50, -100, 0];

/// Health change per judgement.
pub const HEALTH_WEIGHTS: [f32; Judgement::COUNT] = [0.5, 0.4, 0.1, -2.0, -2.5, -3.0];

#[inline]
pub fn score_weight(judgement: Judgement) -> i32 {
    SCORE_WEIGHTS[judgement.index()]
}

#[inline]
pub fn health_weight(judgement: Judgement) -> f32 {
    HEALTH_WEIGHTS[judgement.index()]
}
