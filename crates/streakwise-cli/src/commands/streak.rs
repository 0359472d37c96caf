use chrono::Utc;
use streakwise_core::Tracker;

use super::{print_json, CmdResult};

pub fn run(id: Option<String>) -> CmdResult {
    let mut tracker = Tracker::open()?;
    let now = Utc::now();
    match id {
        Some(id) => print_json(&tracker.streak(&id, now)?),
        None => print_json(&tracker.streaks(now)?),
    }
}
