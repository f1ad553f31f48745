//! Judgement window table and the timing classifier scan.

use crate::error::{Error, Result};
use crate::models::stats::Judgement;
use serde::{Deserialize, Serialize};

/// Maximum absolute deviation (ms) per hit tier, tightest first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitWindow {
    pub marv: f64,
    pub perf: f64,
    pub great: f64,
    pub good: f64,
    pub okay: f64,
}

impl HitWindow {
    /// Keys ruleset defaults.
    pub fn new() -> Self {
        Self {
            marv: 16.0,
            perf: 40.0,
            great: 73.0,
            good: 103.0,
            okay: 127.0,
        }
    }

    /// Utility constructor for fully custom values. Fails unless every window
    /// is positive and strictly looser than the previous one.
    pub fn from_custom(marv: f64, perf: f64, great: f64, good: f64, okay: f64) -> Result<Self> {
        let window = Self {
            marv,
            perf,
            great,
            good,
            okay,
        };
        window.validate()?;
        Ok(window)
    }

    pub fn validate(&self) -> Result<()> {
        let windows = self.as_array();
        if !windows.iter().all(|w| w.is_finite() && *w > 0.0) {
            return Err(Error::InvalidWindows(format!(
                "windows must be positive: {windows:?}"
            )));
        }
        if windows.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(Error::InvalidWindows(format!(
                "windows must be strictly increasing: {windows:?}"
            )));
        }
        Ok(())
    }

    /// Windows in tier order.
    pub fn as_array(&self) -> [f64; 5] {
        [self.marv, self.perf, self.great, self.good, self.okay]
    }

    /// Window for a hit tier. Miss has no window.
    pub fn window_for(&self, judgement: Judgement) -> Option<f64> {
        self.as_array().get(judgement.index()).copied()
    }

    /// Loosest window; anything later than this can no longer be hit.
    pub fn max_window(&self) -> f64 {
        self.okay
    }

    /// First tier whose window contains `timing_diff_ms`, or `None` when the
    /// deviation is outside every window.
    pub fn judge(&self, timing_diff_ms: f64) -> Option<Judgement> {
        let abs_diff = timing_diff_ms.abs();

        Judgement::HIT_TIERS
            .into_iter()
            .zip(self.as_array())
            .find(|&(_, window)| abs_diff <= window)
            .map(|(judgement, _)| judgement)
    }
}

impl Default for HitWindow {
    fn default() -> Self {
        Self::new()
    }
}
