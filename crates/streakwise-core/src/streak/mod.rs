//! Streak engine: calculation over completion days and the cached per-task state.

mod calculator;
mod state;

pub use calculator::{StreakCalculator, StreakConfig, StreakResult};
pub use state::StreakState;
