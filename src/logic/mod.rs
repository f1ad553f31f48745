//! Engines that mutate play state: the score processor and the replay player.

pub mod processor;
pub mod replay_engine;

pub use processor::{MAX_SCORE, ScoreProcessor, summed_score};
pub use replay_engine::{ReplayResult, VirtualReplayPlayer, simulate_replay};
