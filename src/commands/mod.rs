//! Command implementations.

pub mod score;

pub use score::{ScoreCommand, ScoreStats};
