//! Task query filtering and ordering.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};

use super::{TaskStatus, TaskView};

/// Due-date window relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateWindow {
    Today,
    Tomorrow,
    /// Closed interval `[today, today + 6 days]`.
    ThisWeek,
}

impl DateWindow {
    fn contains(&self, date: NaiveDate, today: NaiveDate) -> bool {
        match self {
            DateWindow::Today => date == today,
            DateWindow::Tomorrow => today.checked_add_days(Days::new(1)) == Some(date),
            DateWindow::ThisWeek => {
                let end = today.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX);
                (today..=end).contains(&date)
            }
        }
    }
}

/// Query descriptor for narrowing a task list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub status: Option<TaskStatus>,
    pub window: Option<DateWindow>,
}

impl FilterSpec {
    /// Build a spec from loose command words such as `open week`.
    ///
    /// Unknown words are ignored; the last word of each kind wins.
    pub fn parse<'a>(words: impl IntoIterator<Item = &'a str>) -> Self {
        let mut spec = Self::default();
        for word in words {
            match word.to_ascii_lowercase().as_str() {
                "open" | "todo" | "pending" => spec.status = Some(TaskStatus::Open),
                "done" | "completed" => spec.status = Some(TaskStatus::Done),
                "today" => spec.window = Some(DateWindow::Today),
                "tomorrow" => spec.window = Some(DateWindow::Tomorrow),
                "week" | "thisweek" | "this-week" => spec.window = Some(DateWindow::ThisWeek),
                _ => {}
            }
        }
        spec
    }

    pub fn matches(&self, task: &TaskView, today: NaiveDate) -> bool {
        if self.status.is_some_and(|s| s != task.status) {
            return false;
        }
        match (self.window, task.due_date) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(window), Some(due)) => window.contains(due, today),
        }
    }
}

/// Select the tasks matching `spec` and order them for display.
///
/// Ascending due date with undated tasks last, then descending priority.
/// The sort is stable, so remaining ties keep their input order.
pub fn filter(tasks: Vec<TaskView>, spec: &FilterSpec, today: NaiveDate) -> Vec<TaskView> {
    let mut selected: Vec<TaskView> = tasks
        .into_iter()
        .filter(|t| spec.matches(t, today))
        .collect();
    selected.sort_by(display_order);
    selected
}

fn display_order(a: &TaskView, b: &TaskView) -> Ordering {
    let due = |t: &TaskView| (t.due_date.is_none(), t.due_date);
    due(a)
        .cmp(&due(b))
        .then_with(|| Reverse(a.priority).cmp(&Reverse(b.priority)))
}
