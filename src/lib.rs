//! Judgement and scoring engine for vertical scrolling rhythm games.
//!
//! Player actions are classified against hit objects by timing deviation,
//! then folded into combo, score, accuracy and health by a
//! [`ScoreProcessor`](logic::processor::ScoreProcessor).

pub mod config;
pub mod database;
pub mod error;
pub mod logic;
pub mod models;

pub use error::{Error, Result};
pub use logic::processor::{ProcessedAction, ScoreProcessor, ScoreSnapshot, ScoreState};
pub use models::engine::{HitObject, HitWindow};
pub use models::stats::{Grade, Judgement, JudgementCounts};
