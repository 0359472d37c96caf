//! Achievements: append-only badges earned from completion history.
//!
//! Every badge is keyed by `(kind, task_id, period)`, so re-evaluating the
//! same history never awards a badge twice. Global badges use an empty
//! task id.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::streak::StreakResult;

/// Streak lengths that earn a milestone badge.
pub const DEFAULT_STREAK_MILESTONES: [u32; 5] = [3, 7, 14, 30, 100];

/// Total completion days needed for the century badge.
pub const CENTURY_COMPLETIONS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementKind {
    /// First completion of anything
    FirstCompletion,
    /// A task's current streak reached a milestone
    StreakMilestone,
    /// Every task visible today was done
    PerfectDay,
    /// One hundred completion days in total
    Century,
}

impl AchievementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AchievementKind::FirstCompletion => "first_completion",
            AchievementKind::StreakMilestone => "streak_milestone",
            AchievementKind::PerfectDay => "perfect_day",
            AchievementKind::Century => "century",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "first_completion" => Some(AchievementKind::FirstCompletion),
            "streak_milestone" => Some(AchievementKind::StreakMilestone),
            "perfect_day" => Some(AchievementKind::PerfectDay),
            "century" => Some(AchievementKind::Century),
            _ => None,
        }
    }
}

impl fmt::Display for AchievementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An earned badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub kind: AchievementKind,
    /// Empty for global badges
    pub task_id: String,
    /// `all`, a milestone length, or a `YYYY-MM-DD` day
    pub period: String,
    pub earned_at: DateTime<Utc>,
}

impl Achievement {
    fn global(kind: AchievementKind, period: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            kind,
            task_id: String::new(),
            period: period.into(),
            earned_at: now,
        }
    }

    /// Human-readable title for listings.
    pub fn title(&self) -> String {
        match self.kind {
            AchievementKind::FirstCompletion => "First step".to_string(),
            AchievementKind::StreakMilestone => format!("{}-day streak", self.period),
            AchievementKind::PerfectDay => format!("Perfect day ({})", self.period),
            AchievementKind::Century => "Century".to_string(),
        }
    }
}

/// Facts gathered after a completion mutation.
#[derive(Debug, Clone)]
pub struct AchievementContext<'a> {
    pub task_id: &'a str,
    /// Streak of the mutated task, when it is recurring
    pub streak: Option<StreakResult>,
    /// Completion-log days across all tasks
    pub total_completions: u32,
    pub today: NaiveDate,
    /// Visible/done counts for today
    pub today_total: u32,
    pub today_completed: u32,
}

/// Turns a context into candidate badges. Persistence decides which are new.
#[derive(Debug, Clone)]
pub struct AchievementEvaluator {
    milestones: Vec<u32>,
}

impl Default for AchievementEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_STREAK_MILESTONES.to_vec())
    }
}

impl AchievementEvaluator {
    pub fn new(mut milestones: Vec<u32>) -> Self {
        milestones.retain(|m| *m > 0);
        milestones.sort_unstable();
        milestones.dedup();
        Self { milestones }
    }

    pub fn milestones(&self) -> &[u32] {
        &self.milestones
    }

    pub fn evaluate(&self, ctx: &AchievementContext<'_>, now: DateTime<Utc>) -> Vec<Achievement> {
        let mut earned = Vec::new();

        if ctx.total_completions >= 1 {
            earned.push(Achievement::global(AchievementKind::FirstCompletion, "all", now));
        }
        if ctx.total_completions >= CENTURY_COMPLETIONS {
            earned.push(Achievement::global(AchievementKind::Century, "all", now));
        }

        if let Some(streak) = ctx.streak {
            earned.extend(
                self.milestones
                    .iter()
                    .filter(|m| streak.current >= **m)
                    .map(|m| Achievement {
                        kind: AchievementKind::StreakMilestone,
                        task_id: ctx.task_id.to_string(),
                        period: m.to_string(),
                        earned_at: now,
                    }),
            );
        }

        if ctx.today_total > 0 && ctx.today_completed >= ctx.today_total {
            earned.push(Achievement::global(
                AchievementKind::PerfectDay,
                ctx.today.format("%Y-%m-%d").to_string(),
                now,
            ));
        }

        earned
    }
}
