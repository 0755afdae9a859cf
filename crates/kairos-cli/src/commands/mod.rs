pub mod chat;
pub mod config;
pub mod stats;
pub mod task;

use kairos_core::notify::NullSink;
use kairos_core::{
    Assistant, Config, ConfigError, Database, NotificationSink, PomodoroService, SqliteTaskStore,
    UserId,
};
use mockable::DefaultClock;
use std::sync::Arc;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub type CliAssistant = Assistant<SqliteTaskStore, DefaultClock>;

pub fn resolve_user(flag: Option<String>, config: &Config) -> UserId {
    flag.map(UserId::new).unwrap_or_else(|| config.chat_user())
}

/// Assistant over the on-disk task store and journal, notifying `sink`.
pub fn assistant(
    db: Arc<Database>,
    config: &Config,
    sink: Arc<dyn NotificationSink>,
) -> Result<CliAssistant, ConfigError> {
    let clock = Arc::new(DefaultClock);
    let service = PomodoroService::new(Arc::clone(&clock), sink, config.session_config()?);
    Ok(Assistant::new(
        Arc::new(SqliteTaskStore::new(Arc::clone(&db))),
        Arc::new(service),
        clock,
    )
    .with_calendar(config.calendar()?)
    .with_analytics(db))
}

/// Assistant for one-shot task commands, which never run a timer.
pub fn task_assistant(db: Arc<Database>, config: &Config) -> Result<CliAssistant, ConfigError> {
    assistant(db, config, Arc::new(NullSink))
}
