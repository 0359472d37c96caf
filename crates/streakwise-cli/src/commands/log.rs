//! Completion log commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use streakwise_core::Tracker;

use super::{parse_day, print_json, CmdResult};

#[derive(Subcommand)]
pub enum LogAction {
    /// Mark a day as done
    Done {
        /// Task ID
        id: String,
        /// Day (YYYY-MM-DD, today or yesterday)
        #[arg(long, default_value = "today")]
        day: String,
    },
    /// Unmark a day
    Undo {
        /// Task ID
        id: String,
        /// Day (YYYY-MM-DD, today or yesterday)
        #[arg(long, default_value = "today")]
        day: String,
    },
    /// Move a completion to another day
    Move {
        /// Task ID
        id: String,
        /// Day that currently holds the completion
        from: String,
        /// New day
        to: String,
    },
    /// List completed days of a task
    List {
        /// Task ID
        id: String,
    },
}

pub fn run(action: LogAction) -> CmdResult {
    let mut tracker = Tracker::open()?;
    let now = Utc::now();

    let outcome = match action {
        LogAction::Done { id, day } => {
            let day = parse_day(&tracker, &day)?;
            tracker.set_day_completed(&id, day, true, now)?
        }
        LogAction::Undo { id, day } => {
            let day = parse_day(&tracker, &day)?;
            tracker.set_day_completed(&id, day, false, now)?
        }
        LogAction::Move { id, from, to } => {
            let from = parse_day(&tracker, &from)?;
            let to = parse_day(&tracker, &to)?;
            tracker.edit_completion_day(&id, from, to, now)?
        }
        LogAction::List { id } => {
            let days = tracker.completion_days(&id)?;
            return print_json(&days);
        }
    };

    for achievement in &outcome.achievements {
        eprintln!("Achievement earned: {}", achievement.title());
    }
    print_json(&outcome)
}
