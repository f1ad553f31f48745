//! Hit objects and the osu!mania chart adapter.

use crate::error::{Error, Result};
use rosu_map::section::general::GameMode;
use rosu_map::section::hit_objects::{HitObject as OsuHitObject, HitObjectKind};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A single immutable chart entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitObject {
    /// When the object should be hit (ms).
    pub start_time: i32,
    /// Lane / column, 0-indexed.
    pub lane: usize,
    /// End of the hold for long notes.
    pub end_time: Option<i32>,
}

impl HitObject {
    /// Creates a tap note.
    pub fn tap(start_time: i32, lane: usize) -> Self {
        Self {
            start_time,
            lane,
            end_time: None,
        }
    }

    /// Creates a long note, judged at both ends.
    pub fn long_note(start_time: i32, lane: usize, end_time: i32) -> Self {
        Self {
            start_time,
            lane,
            end_time: Some(end_time),
        }
    }

    #[inline]
    pub fn is_long_note(&self) -> bool {
        self.end_time.is_some()
    }

    /// Number of judgements this object produces (2 for long notes).
    #[inline]
    pub fn judgement_count(&self) -> u32 {
        if self.is_long_note() { 2 } else { 1 }
    }

    /// The tail of a long note as an object judged at its end time.
    pub fn tail(&self) -> Option<HitObject> {
        self.end_time.map(|end| HitObject::tap(end, self.lane))
    }
}

/// Absolute number of judgements in a chart.
///
/// Every normal object counts as 1, every long note as 2 (head + tail).
pub fn total_judgements(objects: &[HitObject]) -> u32 {
    objects.iter().map(HitObject::judgement_count).sum()
}

/// A chart loaded from disk, with the hash used to pair it with replays.
#[derive(Clone, Debug)]
pub struct LoadedChart {
    pub hit_objects: Vec<HitObject>,
    pub key_count: u8,
    pub md5: String,
}

/// Loads an osu!mania chart from a `.osu` file.
pub fn load_map(path: &Path) -> Result<LoadedChart> {
    let bytes = std::fs::read(path)
        .map_err(|e| Error::ChartLoad(format!("failed to read {:?}: {}", path, e)))?;
    parse_map(&bytes)
}

/// Parses `.osu` content. Objects are returned sorted by start time.
pub fn parse_map(bytes: &[u8]) -> Result<LoadedChart> {
    let md5 = format!("{:x}", md5::compute(bytes));

    let map = rosu_map::Beatmap::from_bytes(bytes)
        .map_err(|e| Error::ChartLoad(format!("rosu_map parse failed: {}", e)))?;

    if map.mode != GameMode::Mania {
        return Err(Error::ChartLoad(format!(
            "unsupported mode {:?}, expected mania",
            map.mode
        )));
    }

    let key_count = map.circle_size.round().clamp(1.0, 18.0) as u8;

    let mut hit_objects: Vec<HitObject> = map
        .hit_objects
        .iter()
        .filter_map(|hit_object| parse_hit_object(hit_object, key_count))
        .collect();
    hit_objects.sort_by_key(|o| o.start_time);

    log::debug!(
        "CHART: {} objects, {}K, md5 {}",
        hit_objects.len(),
        key_count,
        md5
    );

    Ok(LoadedChart {
        hit_objects,
        key_count,
        md5,
    })
}

/// Converts an osu! hit object. Sliders and spinners are skipped.
pub fn parse_hit_object(hit_object: &OsuHitObject, key_count: u8) -> Option<HitObject> {
    let start_time = hit_object.start_time.round() as i32;

    match &hit_object.kind {
        HitObjectKind::Circle(circle) => {
            let lane = x_to_column(circle.pos.x as i32, key_count)?;
            Some(HitObject::tap(start_time, lane))
        }
        HitObjectKind::Hold(hold) => {
            let lane = x_to_column(hold.pos_x as i32, key_count)?;
            let end_time = (hit_object.start_time + hold.duration).round() as i32;
            Some(HitObject::long_note(start_time, lane, end_time))
        }
        _ => {
            log::warn!("Skipping non-mania object at {}ms", start_time);
            None
        }
    }
}

/// Converts an osu!mania X position into a column index.
pub fn x_to_column(x: i32, key_count: u8) -> Option<usize> {
    let column_width = 512.0 / key_count as f32;
    let col = (x as f32 / column_width).floor();
    if col >= 0.0 && (col as usize) < key_count as usize {
        Some(col as usize)
    } else {
        log::warn!("Unknown column position: {x}");
        None
    }
}
