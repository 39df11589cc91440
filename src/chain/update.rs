use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::task;

/// Partial update of a task. Absent fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskUpdate {
    pub manager_id: Option<i32>,
    pub planned_start_date: Option<DateTime<Utc>>,
    pub planned_end_date: Option<DateTime<Utc>>,
    pub real_start_date: Option<DateTime<Utc>>,
    pub real_end_date: Option<DateTime<Utc>>,
    pub paused_date: Option<DateTime<Utc>>,
    pub start: Option<bool>,
    pub paused: Option<bool>,
    pub end: Option<bool>,
}

impl TaskUpdate {
    /// Marks the task finished.
    pub fn finish() -> Self {
        Self {
            end: Some(true),
            ..Self::default()
        }
    }

    pub fn start() -> Self {
        Self {
            start: Some(true),
            ..Self::default()
        }
    }

    pub fn pause() -> Self {
        Self {
            paused: Some(true),
            ..Self::default()
        }
    }

    /// Whether this update completes the task.
    pub fn completes(&self) -> bool {
        self.end == Some(true)
    }

    /// Write the present fields into `task`. Returns whether anything changed.
    pub(crate) fn apply_to(&self, task: &mut task::Model) -> bool {
        let mut changed = false;
        changed |= set(&mut task.manager_id, self.manager_id);
        changed |= set(&mut task.planned_start_date, self.planned_start_date);
        changed |= set(&mut task.planned_end_date, self.planned_end_date);
        changed |= set(&mut task.real_start_date, self.real_start_date.map(Some));
        changed |= set(&mut task.real_end_date, self.real_end_date.map(Some));
        changed |= set(&mut task.paused_date, self.paused_date.map(Some));
        changed |= set(&mut task.start, self.start);
        changed |= set(&mut task.paused, self.paused);
        changed |= set(&mut task.end, self.end);
        changed
    }
}

fn set<T: PartialEq>(slot: &mut T, value: Option<T>) -> bool {
    match value {
        Some(value) if *slot != value => {
            *slot = value;
            true
        }
        _ => false,
    }
}
