//! Virtual replay player.
//!
//! Feeds raw key events from a `ReplayData` into a `ScoreProcessor`, deciding
//! which hit object each event targets and when an untouched object has
//! become a miss. Replaying the same inputs always yields the same actions.

use crate::error::Result;
use crate::logic::processor::{ProcessedAction, ScoreProcessor, ScoreState};
use crate::models::engine::hit_window::HitWindow;
use crate::models::engine::note::HitObject;
use crate::models::replay::{ReplayData, ReplayInput};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Press without an object to target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GhostTap {
    pub time_ms: f64,
    pub lane: usize,
}

/// Complete result of a replay simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayResult {
    /// Every judged action, in the order it was processed.
    pub actions: Vec<ProcessedAction>,
    /// Final state of the play.
    pub state: ScoreState,
    pub ghost_taps: Vec<GhostTap>,
}

/// Objects of one lane in chart order.
#[derive(Debug, Default)]
struct LaneQueue {
    objects: Vec<usize>,
    head: usize,
    /// Long note whose head was hit and whose tail is still pending.
    holding: Option<usize>,
}

impl LaneQueue {
    fn pending(&self) -> Option<usize> {
        self.objects.get(self.head).copied()
    }
}

pub struct VirtualReplayPlayer<'a> {
    hit_objects: &'a [HitObject],
    processor: ScoreProcessor,
    /// Keyed by lane id. Lane ids come from replay files and charts, so they may be sparse.
    lanes: BTreeMap<usize, LaneQueue>,
    actions: Vec<ProcessedAction>,
    ghost_taps: Vec<GhostTap>,
    last_time: f64,
}

impl<'a> VirtualReplayPlayer<'a> {
    pub fn new(hit_objects: &'a [HitObject], hit_window: HitWindow) -> Result<Self> {
        let processor = ScoreProcessor::with_hit_window(hit_objects, hit_window)?;

        let mut lanes: BTreeMap<usize, LaneQueue> = BTreeMap::new();
        let mut order: Vec<usize> = (0..hit_objects.len()).collect();
        order.sort_by_key(|&i| hit_objects[i].start_time);
        for idx in order {
            lanes.entry(hit_objects[idx].lane).or_default().objects.push(idx);
        }

        Ok(Self {
            hit_objects,
            processor,
            lanes,
            actions: Vec::new(),
            ghost_taps: Vec::new(),
            last_time: f64::NEG_INFINITY,
        })
    }

    pub fn processor(&self) -> &ScoreProcessor {
        &self.processor
    }

    /// Plays every input of the replay, then resolves what is left.
    pub fn simulate(mut self, replay: &ReplayData) -> ReplayResult {
        for input in &replay.inputs {
            self.handle_input(input);
        }
        self.finish()
    }

    /// Handles one key event. Inputs must arrive in chronological order.
    pub fn handle_input(&mut self, input: &ReplayInput) {
        if input.time_ms < self.last_time {
            log::warn!(
                "REPLAY: input at {}ms arrived after {}ms",
                input.time_ms,
                self.last_time
            );
        }
        self.last_time = self.last_time.max(input.time_ms);

        self.resolve_expired(input.time_ms);

        if input.is_press {
            self.press(input.lane, input.time_ms);
        } else {
            self.release(input.lane, input.time_ms);
        }
    }

    /// Resolves every remaining object and returns the result.
    pub fn finish(mut self) -> ReplayResult {
        self.resolve_expired(f64::INFINITY);

        ReplayResult {
            actions: self.actions,
            state: self.processor.state().clone(),
            ghost_taps: self.ghost_taps,
        }
    }

    fn press(&mut self, lane: usize, time_ms: f64) {
        let target = self
            .lanes
            .get(&lane)
            .filter(|queue| queue.holding.is_none())
            .and_then(LaneQueue::pending);

        let Some(idx) = target else {
            self.ghost_taps.push(GhostTap { time_ms, lane });
            return;
        };

        let object = self.hit_objects[idx];
        // Too early: nothing is recorded and the object stays pending.
        let Some(action) = self.processor.process(&object, time_ms, true) else {
            return;
        };
        self.actions.push(action);

        if let Some(queue) = self.lanes.get_mut(&lane) {
            queue.head += 1;
            if object.is_long_note() {
                queue.holding = Some(idx);
            }
        }
    }

    fn release(&mut self, lane: usize, time_ms: f64) {
        let Some(idx) = self.lanes.get_mut(&lane).and_then(|q| q.holding.take()) else {
            return;
        };
        let Some(tail) = self.hit_objects[idx].tail() else {
            return;
        };

        // Late releases were already resolved, so no window here means early.
        let action = self
            .processor
            .process(&tail, time_ms, true)
            .or_else(|| self.processor.process(&tail, time_ms, false));
        self.actions.extend(action);
    }

    /// Time after which the lane's pending judgement can no longer be hit.
    fn deadline(&self, lane: usize) -> Option<f64> {
        let queue = self.lanes.get(&lane)?;
        let window = self.processor.hit_window().max_window();

        match queue.holding {
            Some(idx) => self.hit_objects[idx].end_time.map(|end| end as f64 + window),
            None => queue
                .pending()
                .map(|idx| self.hit_objects[idx].start_time as f64 + window),
        }
    }

    /// Resolves, earliest first, every judgement whose deadline is before `time_ms`.
    fn resolve_expired(&mut self, time_ms: f64) {
        loop {
            let next = self
                .lanes
                .keys()
                .filter_map(|&lane| self.deadline(lane).map(|d| (lane, d)))
                .filter(|&(_, deadline)| deadline < time_ms)
                .min_by(|a, b| a.1.total_cmp(&b.1));

            let Some((lane, deadline)) = next else {
                break;
            };
            self.expire(lane, deadline);
        }
    }

    fn expire(&mut self, lane: usize, deadline: f64) {
        let Some(queue) = self.lanes.get_mut(&lane) else {
            return;
        };

        // Held through the whole tail window: judged as a release at its edge.
        if let Some(idx) = queue.holding.take() {
            if let Some(tail) = self.hit_objects[idx].tail() {
                let action = self.processor.process(&tail, deadline, true);
                self.actions.extend(action);
            }
            return;
        }

        let Some(idx) = queue.pending() else {
            return;
        };
        queue.head += 1;

        let object = self.hit_objects[idx];
        let head = self.processor.process(&object, deadline, false);
        self.actions.extend(head);
        if let Some(tail) = object.tail() {
            let tail = self.processor.process(&tail, deadline, false);
            self.actions.extend(tail);
        }
    }
}

/// Simulates a replay on a chart with the given hit window.
pub fn simulate_replay(
    replay: &ReplayData,
    hit_objects: &[HitObject],
    hit_window: HitWindow,
) -> Result<ReplayResult> {
    let player = VirtualReplayPlayer::new(hit_objects, hit_window)?;
    Ok(player.simulate(replay))
}
