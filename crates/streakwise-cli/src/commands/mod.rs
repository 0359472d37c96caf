pub mod achievements;
pub mod config;
pub mod log;
pub mod stats;
pub mod streak;
pub mod task;
pub mod today;

use chrono::{Days, NaiveDate, Utc};
use serde::Serialize;
use streakwise_core::Tracker;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `today`, `yesterday`, or `YYYY-MM-DD`, relative to the tracker's zone.
pub fn parse_day(tracker: &Tracker, s: &str) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    let today = tracker.zone().today(Utc::now());
    match s.trim().to_lowercase().as_str() {
        "today" => Ok(today),
        "yesterday" => today
            .checked_sub_days(Days::new(1))
            .ok_or_else(|| "date out of range".into()),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
            .map_err(|e| format!("invalid date '{s}' (expected YYYY-MM-DD): {e}").into()),
    }
}
