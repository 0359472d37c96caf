use chrono::Utc;
use streakwise_core::{AnalyticsRange, Tracker};

use super::{print_json, CmdResult};

pub fn run(range: &str) -> CmdResult {
    let range: AnalyticsRange = range.parse()?;
    let tracker = Tracker::open()?;
    let report = tracker.analytics(range, Utc::now())?;
    print_json(&report)
}
