//! # Kairos Core Library
//!
//! This library provides the core logic behind the Kairos chat assistant:
//! turning free-form chat text into structured tasks, and running a
//! per-user Pomodoro timer. Chat platforms, task-storage services and
//! presentation are kept behind small traits so the core can be driven by
//! the bundled CLI, by tests, or by any other front end.
//!
//! ## Architecture
//!
//! - **Task Parser**: Inline tag grammar (`[high]`, `due:tomorrow`,
//!   `project:Math`) resolved against the user's calendar date
//! - **Session Clock**: Wall-clock-based state machine per user; phases only
//!   advance when the tick driver calls `tick()`
//! - **Session Registry**: Ownership table with one FIFO lock per user
//! - **Query Filter**: Status and date-window narrowing with a stable order
//! - **Storage**: SQLite task store and session journal, TOML configuration
//!
//! ## Key Components
//!
//! - [`extract`]: Free text to [`TaskDraft`]
//! - [`Session`]: Pomodoro state machine
//! - [`PomodoroService`]: Registry plus clock and notification sink
//! - [`TickDriver`]: Background ticker for every registered session
//! - [`Assistant`]: Chat command surface
//! - [`TaskStore`]: Trait for external task storage

pub mod assistant;
pub mod clock;
pub mod error;
pub mod events;
pub mod ids;
pub mod notify;
pub mod storage;
pub mod store;
pub mod task;
pub mod timer;

pub use assistant::{Assistant, ChatCommand, Reply};
pub use clock::Calendar;
pub use error::{ConfigError, CoreError, StoreError};
pub use events::Event;
pub use ids::{TaskId, UserId};
pub use notify::{ChannelSink, FanOutSink, Notification, NotificationSink};
pub use storage::{Config, Database, LabelFocus, SessionJournal, SessionKind, Stats};
pub use store::{MemoryTaskStore, SqliteTaskStore, TaskStore};
pub use task::{extract, filter, DateWindow, FilterSpec, Priority, TaskDraft, TaskStatus, TaskView};
pub use timer::{
    Phase, PomodoroService, Session, SessionCommand, SessionConfig, SessionRegistry,
    SessionStatus, TickDriver, TickDriverHandle,
};
