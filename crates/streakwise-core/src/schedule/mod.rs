//! Schedule model for recurring tasks.
//!
//! A [`RecurrenceSchedule`] is either daily or a weekly subset of weekdays
//! stored as a [`DayMask`].

mod day_mask;
mod recurrence;

pub use day_mask::DayMask;
pub use recurrence::RecurrenceSchedule;
