//! Task data structure and related functionality.
//!
//! This module defines the core `Task` struct that represents a single work
//! item on the board, including its priority lane, the human-chosen baseline
//! priority the escalation engine falls back to, and the optional deadline.

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::fields::Priority;

/// Deadline time-of-day applied when a task has a due date but no due time.
pub const DEFAULT_DUE_TIME: (u32, u32) = (23, 59);

/// A work item on the board.
///
/// `priority` is what the board shows; `original_priority` is the last value
/// a human chose and is the baseline the escalation engine works from. The
/// engine never touches `original_priority` after creation; only a manual
/// priority edit resets it (and clears `auto_escalated`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: Priority,
    pub original_priority: Priority,
    #[serde(default)]
    pub auto_escalated: bool,
    pub due_date: Option<NaiveDate>,
    pub due_time: Option<NaiveTime>,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub completed: bool,
    pub completed_at: Option<DateTime<Local>>,
}

impl Task {
    /// Full deadline instant, or `None` when the task has no due date.
    ///
    /// A missing due time defaults to end of day (23:59). A due date that
    /// cannot be resolved to a local instant (DST gap) is treated as having
    /// no deadline rather than failing the caller.
    pub fn deadline(&self) -> Option<DateTime<Local>> {
        let date = self.due_date?;
        let time = self.due_time.unwrap_or_else(default_due_time);
        Local.from_local_datetime(&date.and_time(time)).earliest()
    }

    /// Whether the deadline has passed as of `now`.
    pub fn is_overdue(&self, now: DateTime<Local>) -> bool {
        self.deadline().map(|d| now > d).unwrap_or(false)
    }
}

/// User-supplied fields for creating a task. The store assigns the rest.
#[derive(Debug, Clone)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub due_time: Option<NaiveTime>,
    pub progress: u8,
}

impl TaskDraft {
    /// Minimal draft with default priority and no deadline.
    pub fn new(title: &str) -> Self {
        TaskDraft {
            title: title.to_string(),
            description: String::new(),
            priority: Priority::Medium,
            due_date: None,
            due_time: None,
            progress: 0,
        }
    }
}

/// Partial edit applied through `TaskStore::update`. `None` fields are left
/// untouched; `due_date`/`due_time` use a double Option so an edit can clear
/// a deadline as well as set one.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<NaiveDate>>,
    pub due_time: Option<Option<NaiveTime>>,
    pub progress: Option<u8>,
}

/// End-of-day due time used when only a date was given.
pub fn default_due_time() -> NaiveTime {
    let (h, m) = DEFAULT_DUE_TIME;
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    #[test]
    fn deadline_defaults_to_end_of_day() {
        let mut task = Task {
            id: 1,
            title: "t".into(),
            description: String::new(),
            priority: Priority::Low,
            original_priority: Priority::Low,
            auto_escalated: false,
            due_date: NaiveDate::from_ymd_opt(2026, 3, 10),
            due_time: None,
            progress: 0,
            completed: false,
            completed_at: None,
        };
        let deadline = task.deadline().unwrap();
        assert_eq!((deadline.hour(), deadline.minute()), (23, 59));

        task.due_date = None;
        assert_eq!(task.deadline(), None);
    }
}
