//! Core domain types for pomostat
//!
//! These types are the read-only inputs of the statistics engine. They are
//! written once by the task and timer collaborators and never mutated here.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Subject** | The identity whose data is aggregated (one user) |
//! | **Category** | A project; groups tasks and focus sessions for breakdowns |
//! | **Task** | A unit of work inside a category |
//! | **Completion** | A task reaching its terminal "done" state |
//! | **Focus session** | A finished pomodoro timer run in focus mode |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use crate::analytics::normalize::StoredInstant;

/// Identifier of a category (project). Categories use opaque string ids.
pub type CategoryId = String;

/// Identifier of a task.
pub type TaskId = i64;

// ============================================
// Subject
// ============================================

/// The identity whose statistics are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(pub i64);

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================
// Category
// ============================================

/// A project that owns tasks.
///
/// Only used to label and color breakdown entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub subject_id: SubjectId,
    pub display_name: String,
    /// Hex color such as `#22c55e`. `None` when the project never had one.
    pub display_color: Option<String>,
}

// ============================================
// Task
// ============================================

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Open,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Open => "open",
            TaskStatus::Done => "done",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(TaskStatus::Open),
            "done" => Ok(TaskStatus::Done),
            other => Err(format!("unknown task status: {other}")),
        }
    }
}

/// A task inside a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub category_id: CategoryId,
    pub name: String,
    pub status: TaskStatus,
}

// ============================================
// Events
// ============================================

/// A task reaching its terminal "done" state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub subject_id: SubjectId,
    /// Category the task belonged to when it was completed
    pub category_id: CategoryId,
    /// Task name at completion time
    pub label: String,
    /// `None` when the stored timestamp could not be parsed
    pub completed_at: Option<StoredInstant>,
}

/// Mode of a pomodoro timer run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    Focus,
    ShortBreak,
    LongBreak,
}

impl TimerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerMode::Focus => "focus",
            TimerMode::ShortBreak => "short_break",
            TimerMode::LongBreak => "long_break",
        }
    }
}

impl FromStr for TimerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "focus" => Ok(TimerMode::Focus),
            "short_break" | "shortBreak" => Ok(TimerMode::ShortBreak),
            "long_break" | "longBreak" => Ok(TimerMode::LongBreak),
            other => Err(format!("unknown timer mode: {other}")),
        }
    }
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finished pomodoro timer run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusSessionEvent {
    pub subject_id: SubjectId,
    pub mode: TimerMode,
    pub duration_seconds: i64,
    /// Task the session was linked to, if any. The owning category is
    /// resolved through the task.
    pub task_id: Option<TaskId>,
    /// `None` when the stored timestamp could not be parsed
    pub completed_at: Option<StoredInstant>,
}

impl FocusSessionEvent {
    /// Duration in hours.
    pub fn hours(&self) -> f64 {
        self.duration_seconds as f64 / 3600.0
    }
}
