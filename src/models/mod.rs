pub mod engine;
pub mod replay;
pub mod stats;
