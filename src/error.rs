//! Crate-wide error type.
//!
//! Judging itself never fails: only building a processor, loading charts,
//! replays and configuration can.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Chart has no hit objects")]
    EmptyChart,

    #[error("Invalid judgement windows: {0}")]
    InvalidWindows(String),

    #[error("Failed to load chart: {0}")]
    ChartLoad(String),

    #[error("Failed to decode replay: {0}")]
    ReplayDecode(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
