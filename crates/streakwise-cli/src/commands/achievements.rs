use serde::Serialize;
use streakwise_core::{Achievement, Tracker};

use super::{print_json, CmdResult};

#[derive(Serialize)]
struct AchievementRow<'a> {
    title: String,
    #[serde(flatten)]
    achievement: &'a Achievement,
}

pub fn run() -> CmdResult {
    let tracker = Tracker::open()?;
    let achievements = tracker.achievements()?;
    let rows: Vec<_> = achievements
        .iter()
        .map(|achievement| AchievementRow {
            title: achievement.title(),
            achievement,
        })
        .collect();
    print_json(&rows)
}
