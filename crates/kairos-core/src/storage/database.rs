//! SQLite-based task storage, pomodoro journal and statistics.
//!
//! Provides persistent storage for:
//! - Tasks created through the chat surface
//! - Work and break periods, one row per phase
//! - Per-user statistics (today, last seven days, all time)

use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};
use std::collections::BTreeMap;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::data_dir;
use super::migrations;
use crate::clock::Calendar;
use crate::error::StoreError;
use crate::ids::{TaskId, UserId};
use crate::task::{TaskDraft, TaskStatus, TaskView};
use crate::timer::Phase;

/// Kind of a journaled pomodoro period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Work,
    ShortBreak,
    LongBreak,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Work => "work",
            SessionKind::ShortBreak => "short_break",
            SessionKind::LongBreak => "long_break",
        }
    }

    /// The journal kind for a running phase; `None` for every other phase.
    pub fn from_phase(phase: Phase) -> Option<Self> {
        match phase {
            Phase::Working => Some(SessionKind::Work),
            Phase::ShortBreak => Some(SessionKind::ShortBreak),
            Phase::LongBreak => Some(SessionKind::LongBreak),
            Phase::Idle | Phase::Paused | Phase::Stopped => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub focus_sessions_today: u64,
    pub focus_minutes_today: u64,
    pub focus_sessions_week: u64,
    pub focus_minutes_week: u64,
    pub focus_sessions_total: u64,
    pub focus_minutes_total: u64,
    pub open_tasks: u64,
    pub done_tasks: u64,
    /// Labeled focus time over the last seven days, most minutes first.
    #[serde(default)]
    pub focus_by_label: Vec<LabelFocus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelFocus {
    pub label: String,
    pub sessions: u64,
    pub minutes: u64,
}

struct WorkPeriod {
    started: DateTime<Utc>,
    ended: DateTime<Utc>,
    label: Option<String>,
}

/// SQLite database shared by the task store and the session journal.
pub struct Database {
    conn: Mutex<Connection>,
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<TaskView> {
    let due_date = row
        .get::<_, Option<String>>(3)?
        .map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|e| conversion_error(3, e)))
        .transpose()?;
    Ok(TaskView {
        id: TaskId::new(row.get::<_, String>(0)?),
        title: row.get(1)?,
        priority: row
            .get::<_, String>(2)?
            .parse()
            .map_err(|e| conversion_error(2, e))?,
        due_date,
        project: row.get(4)?,
        status: row
            .get::<_, String>(5)?
            .parse()
            .map_err(|e| conversion_error(5, e))?,
    })
}

const TASK_COLUMNS: &str = "id, title, priority, due_date, project, status";

impl Database {
    /// Open the database at `<data dir>/kairos.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let dir = data_dir().map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::open_at(&dir.join("kairos.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        migrations::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Tasks ───────────────────────────────────────────────────────

    pub fn insert_task(
        &self,
        owner: &UserId,
        draft: &TaskDraft,
        created_at: DateTime<Utc>,
    ) -> Result<TaskView, rusqlite::Error> {
        let task = TaskView::from_draft(TaskId::generate(), draft.clone());
        self.conn().execute(
            "INSERT INTO tasks (id, owner, title, priority, due_date, project, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                task.id.as_str(),
                owner.as_str(),
                task.title,
                task.priority.as_str(),
                task.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
                task.project,
                task.status.as_str(),
                timestamp(created_at),
            ],
        )?;
        Ok(task)
    }

    /// Tasks owned by `owner`, oldest first.
    pub fn tasks_for(&self, owner: &UserId) -> Result<Vec<TaskView>, rusqlite::Error> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE owner = ?1 ORDER BY created_at, rowid"
        ))?;
        let rows = stmt.query_map(params![owner.as_str()], task_from_row)?;
        rows.collect()
    }

    pub fn task(&self, id: &TaskId) -> Result<Option<TaskView>, rusqlite::Error> {
        self.conn()
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                params![id.as_str()],
                task_from_row,
            )
            .optional()
    }

    /// Set a task's status; `None` when no such task exists.
    pub fn set_task_status(
        &self,
        id: &TaskId,
        status: TaskStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<TaskView>, rusqlite::Error> {
        let completed_at = (status == TaskStatus::Done).then(|| timestamp(at));
        let changed = self.conn().execute(
            "UPDATE tasks SET status = ?2, completed_at = ?3 WHERE id = ?1",
            params![id.as_str(), status.as_str(), completed_at],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        self.task(id)
    }

    // ── Journal ─────────────────────────────────────────────────────

    /// Start a journal row for `owner`. Returns its row id.
    pub fn journal_open(
        &self,
        owner: &UserId,
        kind: SessionKind,
        started_at: DateTime<Utc>,
        label: Option<&str>,
    ) -> Result<i64, rusqlite::Error> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO pomodoro_sessions (owner, kind, started_at, label)
             VALUES (?1, ?2, ?3, ?4)",
            params![owner.as_str(), kind.as_str(), timestamp(started_at), label],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Close every open journal row for `owner`. Returns how many were closed.
    pub fn journal_close(
        &self,
        owner: &UserId,
        ended_at: DateTime<Utc>,
    ) -> Result<usize, rusqlite::Error> {
        self.conn().execute(
            "UPDATE pomodoro_sessions SET ended_at = ?2 WHERE owner = ?1 AND ended_at IS NULL",
            params![owner.as_str(), timestamp(ended_at)],
        )
    }

    /// Completed work periods for `owner`.
    fn work_periods(&self, owner: &UserId) -> Result<Vec<WorkPeriod>, rusqlite::Error> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT started_at, ended_at, label FROM pomodoro_sessions
             WHERE owner = ?1 AND kind = 'work' AND ended_at IS NOT NULL",
        )?;
        let rows = stmt.query_map(params![owner.as_str()], |row| {
            let parse = |idx: usize| -> rusqlite::Result<DateTime<Utc>> {
                let raw: String = row.get(idx)?;
                DateTime::parse_from_rfc3339(&raw)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|e| conversion_error(idx, e))
            };
            Ok(WorkPeriod {
                started: parse(0)?,
                ended: parse(1)?,
                label: row.get(2)?,
            })
        })?;
        rows.collect()
    }

    /// Statistics for `owner`. "Today" and the seven-day window are days of
    /// `calendar` ending at `now`; a period counts on the day it started.
    pub fn stats(
        &self,
        owner: &UserId,
        now: DateTime<Utc>,
        calendar: Calendar,
    ) -> Result<Stats, rusqlite::Error> {
        let today = calendar.date_of(now);
        let week_start = today - Duration::days(6);
        let mut stats = Stats::default();
        let mut by_label: BTreeMap<String, (u64, u64)> = BTreeMap::new();

        for period in self.work_periods(owner)? {
            let minutes = u64::try_from((period.ended - period.started).num_minutes()).unwrap_or(0);
            let day = calendar.date_of(period.started);
            stats.focus_sessions_total += 1;
            stats.focus_minutes_total += minutes;
            if day >= week_start && day <= today {
                stats.focus_sessions_week += 1;
                stats.focus_minutes_week += minutes;
                if let Some(label) = period.label {
                    let entry = by_label.entry(label).or_default();
                    entry.0 += 1;
                    entry.1 += minutes;
                }
            }
            if day == today {
                stats.focus_sessions_today += 1;
                stats.focus_minutes_today += minutes;
            }
        }

        stats.focus_by_label = by_label
            .into_iter()
            .map(|(label, (sessions, minutes))| LabelFocus {
                label,
                sessions,
                minutes,
            })
            .collect();
        // Stable, so equal minutes keep the label order.
        stats.focus_by_label.sort_by(|a, b| b.minutes.cmp(&a.minutes));

        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT status, COUNT(*) FROM tasks WHERE owner = ?1 GROUP BY status")?;
        let rows = stmt.query_map(params![owner.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
        })?;
        for row in rows {
            let (status, count) = row?;
            match status.parse::<TaskStatus>() {
                Ok(TaskStatus::Open) => stats.open_tasks += count,
                Ok(TaskStatus::Done) => stats.done_tasks += count,
                Err(e) => tracing::warn!(error = %e, "skipping tasks with unknown status"),
            }
        }
        Ok(stats)
    }
}
