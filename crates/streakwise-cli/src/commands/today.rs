use chrono::Utc;
use streakwise_core::Tracker;

use super::{print_json, CmdResult};

pub fn run() -> CmdResult {
    let tracker = Tracker::open()?;
    let view = tracker.today(Utc::now())?;
    print_json(&view)
}
