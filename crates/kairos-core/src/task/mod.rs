//! Task types shared by the extractor, the query filter and the store.
//!
//! `TaskDraft` is what the extractor produces from chat text; `TaskView`
//! is the read-only projection the store hands back. Neither is mutated
//! locally once built.

pub mod dates;
pub mod extract;
pub mod filter;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::ids::TaskId;

pub use extract::extract;
pub use filter::{filter, DateWindow, FilterSpec};

/// Task priority. Ordering is `Low < Normal < High`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    /// Case-insensitive; `medium` is accepted as an alias of `normal`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "normal" | "medium" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            _ => Err(ParseEnumError::new("priority", s)),
        }
    }
}

/// Completion status of a stored task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
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

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(TaskStatus::Open),
            "done" => Ok(TaskStatus::Done),
            _ => Err(ParseEnumError::new("status", s)),
        }
    }
}

/// Returned when a stored or typed enum name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Structured, not-yet-persisted task extracted from free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub project: Option<String>,
}

/// Read-only projection of a task held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskView {
    pub id: TaskId,
    pub title: String,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub project: Option<String>,
    pub status: TaskStatus,
}

impl TaskView {
    /// Project a freshly created draft into an open task.
    pub fn from_draft(id: TaskId, draft: TaskDraft) -> Self {
        Self {
            id,
            title: draft.title,
            priority: draft.priority,
            due_date: draft.due_date,
            project: draft.project,
            status: TaskStatus::Open,
        }
    }
}
