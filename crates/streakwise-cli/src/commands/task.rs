//! Task management commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use streakwise_core::{
    NewTask, RecurrenceSchedule, TaskPatch, TaskPriority, Tracker, TransitionAction,
};

use super::{parse_day, print_json, CmdResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Create {
        /// Task title
        title: String,
        /// Task description
        #[arg(long)]
        description: Option<String>,
        /// Due date (YYYY-MM-DD, today or yesterday)
        #[arg(long)]
        due: Option<String>,
        /// Start date (defaults to today)
        #[arg(long)]
        start: Option<String>,
        /// Make the task recurring: daily, weekdays, weekends or e.g. "mon,wed,fri"
        #[arg(long)]
        repeat: Option<String>,
        /// Priority: low, medium or high
        #[arg(long, default_value = "medium")]
        priority: String,
    },
    /// List tasks
    List {
        /// Only recurring tasks
        #[arg(long)]
        recurring: bool,
        /// Only open (not completed) tasks
        #[arg(long)]
        open: bool,
    },
    /// Get task details
    Get {
        /// Task ID
        id: String,
    },
    /// Update a task
    Update {
        /// Task ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New due date
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
        /// New start date
        #[arg(long)]
        start: Option<String>,
        /// New recurrence
        #[arg(long, conflicts_with = "once")]
        repeat: Option<String>,
        /// Turn a recurring task into a one-off task
        #[arg(long)]
        once: bool,
        /// New priority
        #[arg(long)]
        priority: Option<String>,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
    /// Start working on a task
    Start {
        /// Task ID
        id: String,
    },
    /// Complete a task (recurring tasks log today)
    Complete {
        /// Task ID
        id: String,
    },
    /// Reopen a completed task
    Reopen {
        /// Task ID
        id: String,
    },
    /// Pause an in-progress task
    Pause {
        /// Task ID
        id: String,
    },
}

pub fn run(action: TaskAction) -> CmdResult {
    let mut tracker = Tracker::open()?;
    let now = Utc::now();

    match action {
        TaskAction::Create {
            title,
            description,
            due,
            start,
            repeat,
            priority,
        } => {
            let mut input = NewTask::new(title).with_priority(priority.parse::<TaskPriority>()?);
            input.description = description;
            if let Some(due) = due {
                input = input.due(parse_day(&tracker, &due)?);
            }
            if let Some(start) = start {
                input = input.starting(parse_day(&tracker, &start)?);
            }
            if let Some(repeat) = repeat {
                input = input.recurring(repeat.parse::<RecurrenceSchedule>()?);
            }
            let task = tracker.create_task(input, now)?;
            eprintln!("Task created: {}", task.id);
            print_json(&task)?;
        }
        TaskAction::List { recurring, open } => {
            let tasks: Vec<_> = tracker
                .list_tasks()?
                .into_iter()
                .filter(|t| !recurring || t.is_recurring)
                .filter(|t| !open || t.completed_at.is_none())
                .collect();
            print_json(&tasks)?;
        }
        TaskAction::Get { id } => {
            let task = tracker.get_task(&id)?;
            print_json(&task)?;
        }
        TaskAction::Update {
            id,
            title,
            description,
            due,
            clear_due,
            start,
            repeat,
            once,
            priority,
        } => {
            let patch = TaskPatch {
                title,
                description: description.map(Some),
                priority: priority.map(|p| p.parse::<TaskPriority>()).transpose()?,
                due_date: if clear_due {
                    Some(None)
                } else {
                    due.map(|d| parse_day(&tracker, &d)).transpose()?.map(Some)
                },
                start_date: start.map(|s| parse_day(&tracker, &s)).transpose()?,
                schedule: if once {
                    Some(None)
                } else {
                    repeat
                        .map(|r| r.parse::<RecurrenceSchedule>())
                        .transpose()?
                        .map(Some)
                },
            };
            let task = tracker.update_task(&id, patch, now)?;
            print_json(&task)?;
        }
        TaskAction::Delete { id } => {
            tracker.delete_task(&id, now)?;
            println!("Task deleted: {id}");
        }
        TaskAction::Start { id } => transition(&mut tracker, &id, TransitionAction::Start)?,
        TaskAction::Complete { id } => transition(&mut tracker, &id, TransitionAction::Complete)?,
        TaskAction::Reopen { id } => transition(&mut tracker, &id, TransitionAction::Reopen)?,
        TaskAction::Pause { id } => transition(&mut tracker, &id, TransitionAction::Pause)?,
    }
    Ok(())
}

fn transition(tracker: &mut Tracker, id: &str, action: TransitionAction) -> CmdResult {
    let outcome = tracker.apply_action(id, action, Utc::now())?;
    for achievement in &outcome.achievements {
        eprintln!("Achievement earned: {}", achievement.title());
    }
    print_json(&outcome)
}
