//! Serializable replay structures.
//!
//! A replay only stores raw key events. Judgements are always recomputed by
//! feeding the events back through a `ScoreProcessor`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Current replay format version for compatibility.
pub const REPLAY_FORMAT_VERSION: u8 = 1;

/// A single key event (press or release).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplayInput {
    /// Song time in milliseconds.
    pub time_ms: f64,
    /// Lane index, 0-indexed.
    pub lane: usize,
    /// `true` for a press, `false` for a release.
    pub is_press: bool,
}

/// Raw inputs of one play, paired with the chart through its md5.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayData {
    /// Format version for future compatibility.
    pub version: u8,
    /// md5 of the chart file this replay was recorded on.
    #[serde(default)]
    pub map_md5: Option<String>,
    /// All user inputs in chronological order.
    pub inputs: Vec<ReplayInput>,
}

impl ReplayData {
    pub fn new(map_md5: Option<String>) -> Self {
        Self {
            version: REPLAY_FORMAT_VERSION,
            map_md5,
            inputs: Vec::new(),
        }
    }

    /// Adds an input (press or release).
    pub fn add_input(&mut self, time_ms: f64, lane: usize, is_press: bool) {
        self.inputs.push(ReplayInput {
            time_ms,
            lane,
            is_press,
        });
    }

    /// Adds a key press input.
    #[inline]
    pub fn add_press(&mut self, time_ms: f64, lane: usize) {
        self.add_input(time_ms, lane, true);
    }

    /// Adds a key release input.
    #[inline]
    pub fn add_release(&mut self, time_ms: f64, lane: usize) {
        self.add_input(time_ms, lane, false);
    }

    /// Sorts inputs chronologically, keeping the recorded order of ties.
    pub fn sort_inputs(&mut self) {
        self.inputs.sort_by(|a, b| a.time_ms.total_cmp(&b.time_ms));
    }

    /// Serializes to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserializes from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut data: ReplayData = serde_json::from_str(json)?;
        data.validate()?;
        Ok(data)
    }

    /// Checks the version, drops inputs with a non-finite time and sorts
    /// the rest chronologically.
    pub fn validate(&mut self) -> Result<()> {
        if self.version > REPLAY_FORMAT_VERSION {
            return Err(Error::ReplayDecode(format!(
                "unsupported replay version {}",
                self.version
            )));
        }

        let before = self.inputs.len();
        self.inputs.retain(|input| input.time_ms.is_finite());
        if self.inputs.len() != before {
            log::warn!(
                "REPLAY: dropped {} inputs with invalid timestamps",
                before - self.inputs.len()
            );
        }

        self.sort_inputs();
        Ok(())
    }

    pub fn press_count(&self) -> usize {
        self.inputs.iter().filter(|input| input.is_press).count()
    }

    pub fn release_count(&self) -> usize {
        self.inputs.len() - self.press_count()
    }

    /// Returns true when this replay was recorded on the chart with `md5`.
    /// Replays without a hash match everything.
    pub fn matches_chart(&self, md5: &str) -> bool {
        self.map_md5.as_deref().is_none_or(|hash| hash == md5)
    }
}

impl Default for ReplayData {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_sorts_inputs() {
        let json = r#"{
            "version": 1,
            "inputs": [
                {"time_ms": 300.0, "lane": 1, "is_press": true},
                {"time_ms": 100.0, "lane": 0, "is_press": true},
                {"time_ms": 100.0, "lane": 0, "is_press": false}
            ]
        }"#;
        let data = ReplayData::from_json(json).unwrap();
        let times: Vec<_> = data.inputs.iter().map(|i| (i.time_ms, i.is_press)).collect();
        assert_eq!(times, vec![(100.0, true), (100.0, false), (300.0, true)]);
        assert_eq!(data.map_md5, None);
    }

    #[test]
    fn test_rejects_future_version() {
        let json = r#"{"version": 99, "inputs": []}"#;
        assert!(matches!(
            ReplayData::from_json(json),
            Err(Error::ReplayDecode(_))
        ));
    }

    #[test]
    fn test_validate_drops_invalid_times() {
        let mut data = ReplayData::default();
        data.add_press(50.0, 0);
        data.add_press(f64::NAN, 1);
        data.add_release(10.0, 0);
        data.validate().unwrap();
        assert_eq!(data.inputs.len(), 2);
        assert_eq!(data.inputs[0].time_ms, 10.0);
    }

    #[test]
    fn test_press_release_counts() {
        let mut data = ReplayData::default();
        data.add_press(100.0, 0);
        data.add_press(120.0, 1);
        data.add_release(180.0, 0);
        assert_eq!(data.press_count(), 2);
        assert_eq!(data.release_count(), 1);
        assert_eq!(ReplayData::default().release_count(), 0);
    }

    #[test]
    fn test_matches_chart() {
        let mut data = ReplayData::default();
        assert!(data.matches_chart("abc"));
        data.map_md5 = Some("abc".into());
        assert!(data.matches_chart("abc"));
        assert!(!data.matches_chart("def"));
    }
}
