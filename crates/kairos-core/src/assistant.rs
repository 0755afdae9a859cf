//! Chat command surface.
//!
//! [`Assistant`] is what a chat front end talks to: it turns slash commands
//! into task-store calls and pomodoro commands and hands back a structured
//! [`Reply`]. Rendering the reply is left to the front end.

use mockable::Clock;
use serde::Serialize;
use std::sync::Arc;

use crate::clock::Calendar;
use crate::error::{ConfigError, CoreError, Result, StoreError};
use crate::events::Event;
use crate::ids::UserId;
use crate::storage::{Database, Stats};
use crate::store::TaskStore;
use crate::task::{extract, filter, FilterSpec, TaskStatus, TaskView};
use crate::timer::{PomodoroService, SessionConfig, SessionStatus};

/// Arguments given to `/pomodoro`: minute overrides, then a task label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PomodoroArgs {
    pub work: Option<u32>,
    pub short_break: Option<u32>,
    pub long_break: Option<u32>,
    pub cycles_before_long_break: Option<u32>,
    pub label: Option<String>,
}

impl PomodoroArgs {
    fn overrides_lengths(&self) -> bool {
        self.work.is_some()
            || self.short_break.is_some()
            || self.long_break.is_some()
            || self.cycles_before_long_break.is_some()
    }

    fn resolve(&self, defaults: &SessionConfig) -> Result<SessionConfig, ConfigError> {
        let minutes = |d: chrono::Duration| u32::try_from(d.num_minutes()).unwrap_or(u32::MAX);
        SessionConfig::from_minutes(
            self.work.unwrap_or_else(|| minutes(defaults.work())),
            self.short_break.unwrap_or_else(|| minutes(defaults.short_break())),
            self.long_break.unwrap_or_else(|| minutes(defaults.long_break())),
            self.cycles_before_long_break
                .unwrap_or(defaults.cycles_before_long_break()),
        )
    }
}

/// A parsed chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Add(String),
    List(FilterSpec),
    /// Task id or title.
    Done(String),
    SetStatus {
        task: String,
        status: TaskStatus,
    },
    PomodoroStart(PomodoroArgs),
    PomodoroPause,
    PomodoroResume,
    PomodoroStop,
    PomodoroStatus,
    Analytics,
    Help,
    /// Known command given without a required argument.
    Usage(&'static str),
    Unknown(String),
}

const STATUS_USAGE: &str = "/status <task>, <open|in progress|done|completed>";

/// Status phrases accepted by `/status`, longest spelling first.
const STATUS_WORDS: [(&str, TaskStatus); 7] = [
    ("not started", TaskStatus::Open),
    ("in progress", TaskStatus::Open),
    ("completed", TaskStatus::Done),
    ("complete", TaskStatus::Done),
    ("open", TaskStatus::Open),
    ("todo", TaskStatus::Open),
    ("done", TaskStatus::Done),
];

impl ChatCommand {
    /// Parse one chat message.
    ///
    /// The command word is case-insensitive and may carry a `@botname`
    /// suffix. Plain text without a leading `/` is `Unknown`.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] when `/pomodoro` is given more
    /// than four leading numbers.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let text = text.trim();
        let Some(body) = text.strip_prefix('/') else {
            return Ok(ChatCommand::Unknown(text.to_string()));
        };
        let (word, rest) = match body.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (body, ""),
        };
        let word = word.split('@').next().unwrap_or(word).to_ascii_lowercase();

        let cmd = match word.as_str() {
            "add" if rest.is_empty() => ChatCommand::Usage("/add <task text>"),
            "add" => ChatCommand::Add(rest.to_string()),
            "list" | "tasks" => ChatCommand::List(FilterSpec::parse(rest.split_whitespace())),
            "done" if rest.is_empty() => ChatCommand::Usage("/done <task id or title>"),
            "done" => ChatCommand::Done(rest.to_string()),
            "status" => match parse_status_args(rest) {
                Some((task, status)) => ChatCommand::SetStatus { task, status },
                None => ChatCommand::Usage(STATUS_USAGE),
            },
            "pomodoro" | "pomodoro_start" => {
                ChatCommand::PomodoroStart(parse_pomodoro_args(rest)?)
            }
            "pomodoro_pause" => ChatCommand::PomodoroPause,
            "pomodoro_resume" => ChatCommand::PomodoroResume,
            "pomodoro_stop" => ChatCommand::PomodoroStop,
            "pomodoro_status" => ChatCommand::PomodoroStatus,
            "analytics" | "stats" => ChatCommand::Analytics,
            "help" | "start" => ChatCommand::Help,
            _ => ChatCommand::Unknown(text.to_string()),
        };
        Ok(cmd)
    }
}

/// `/pomodoro [work [short [long [cycles]]]] [task text]`
///
/// Leading whole numbers fill the lengths from the left; the first other
/// word starts the label.
fn parse_pomodoro_args(rest: &str) -> Result<PomodoroArgs, ConfigError> {
    let mut values = [None; 4];
    let mut words = rest.split_whitespace().peekable();
    let mut filled = 0;
    while let Some(n) = words.peek().and_then(|w| w.parse::<u32>().ok()) {
        let Some(slot) = values.get_mut(filled) else {
            return Err(ConfigError::InvalidValue {
                key: "pomodoro".into(),
                message: "at most four numbers: work short long cycles".into(),
            });
        };
        *slot = Some(n);
        filled += 1;
        words.next();
    }
    let label = words.collect::<Vec<_>>().join(" ");
    let [work, short_break, long_break, cycles_before_long_break] = values;
    Ok(PomodoroArgs {
        work,
        short_break,
        long_break,
        cycles_before_long_break,
        label: (!label.is_empty()).then_some(label),
    })
}

fn status_word(raw: &str) -> Option<TaskStatus> {
    let raw = raw.trim().trim_matches(|c: char| c == '<' || c == '>');
    STATUS_WORDS
        .iter()
        .find(|(word, _)| raw.eq_ignore_ascii_case(word))
        .map(|(_, status)| *status)
}

/// `<task>, <status>`, or `<task> <status>` with the status phrase last.
fn parse_status_args(rest: &str) -> Option<(String, TaskStatus)> {
    if let Some((task, status)) = rest.rsplit_once(',') {
        let task = task.trim();
        if let Some(status) = status_word(status).filter(|_| !task.is_empty()) {
            return Some((task.to_string(), status));
        }
    }
    let lower = rest.to_ascii_lowercase();
    STATUS_WORDS.iter().find_map(|(word, status)| {
        if !lower.ends_with(word) {
            return None;
        }
        // ASCII lowering keeps byte offsets, so this is a char boundary.
        let head = &rest[..rest.len() - word.len()];
        if !head.ends_with(char::is_whitespace) {
            return None;
        }
        let task = head.trim().trim_end_matches(',').trim_end();
        (!task.is_empty()).then(|| (task.to_string(), *status))
    })
}

/// Structured answer to a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reply {
    TaskCreated { task: TaskView },
    Tasks { tasks: Vec<TaskView> },
    TaskUpdated { task: TaskView },
    Pomodoro { event: Event },
    Status { status: SessionStatus },
    Analytics { stats: Stats },
    Help,
    Usage { usage: &'static str },
    Unknown { input: String },
}

pub struct Assistant<S, C>
where
    S: TaskStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    pomodoro: Arc<PomodoroService<C>>,
    clock: Arc<C>,
    calendar: Calendar,
    journal: Option<Arc<Database>>,
}

impl<S, C> Assistant<S, C>
where
    S: TaskStore,
    C: Clock + Send + Sync,
{
    pub fn new(store: Arc<S>, pomodoro: Arc<PomodoroService<C>>, clock: Arc<C>) -> Self {
        Self {
            store,
            pomodoro,
            clock,
            calendar: Calendar::default(),
            journal: None,
        }
    }

    /// Read "today" in `calendar` instead of the host's local zone.
    pub fn with_calendar(mut self, calendar: Calendar) -> Self {
        self.calendar = calendar;
        self
    }

    /// Answer `/analytics` from the session journal in `db`.
    ///
    /// Task counts come from the same database, so they are only meaningful
    /// when the task store writes there too.
    pub fn with_analytics(mut self, db: Arc<Database>) -> Self {
        self.journal = Some(db);
        self
    }

    pub fn pomodoro(&self) -> &Arc<PomodoroService<C>> {
        &self.pomodoro
    }

    pub fn calendar(&self) -> Calendar {
        self.calendar
    }

    // ── Tasks ──

    /// Extract a draft from `text` and hand it to the store.
    ///
    /// # Errors
    /// [`CoreError::EmptyTitle`] or the store's failure.
    pub async fn create_task(&self, user: &UserId, text: &str) -> Result<TaskView> {
        let draft = extract(text, self.calendar.today(&*self.clock))?;
        let task = self.store.create_task(user, draft).await?;
        tracing::info!(user = %user, task = %task.id, "task created");
        Ok(task)
    }

    pub async fn list_tasks(&self, user: &UserId, spec: &FilterSpec) -> Result<Vec<TaskView>> {
        let tasks = self.store.list_tasks(user).await?;
        Ok(filter(tasks, spec, self.calendar.today(&*self.clock)))
    }

    /// Mark one of the user's tasks done. `task` is an id or a title.
    pub async fn complete_task(&self, user: &UserId, task: &str) -> Result<TaskView> {
        self.set_task_status(user, task, TaskStatus::Done).await
    }

    /// Move one of the user's tasks to `status`.
    ///
    /// # Errors
    /// [`CoreError::TaskNotFound`] if `task` names none of the user's tasks.
    pub async fn set_task_status(
        &self,
        user: &UserId,
        task: &str,
        status: TaskStatus,
    ) -> Result<TaskView> {
        let found = self.find_task(user, task, status).await?;
        let updated = self.store.update_status(&found.id, status).await?;
        tracing::info!(user = %user, task = %updated.id, %status, "task status updated");
        Ok(updated)
    }

    /// One of the user's tasks by exact id, else by title ignoring case.
    ///
    /// Of several tasks with the title, the oldest not already in `target`
    /// wins.
    async fn find_task(
        &self,
        user: &UserId,
        reference: &str,
        target: TaskStatus,
    ) -> Result<TaskView> {
        let reference = reference.trim();
        let tasks = self.store.list_tasks(user).await?;
        if let Some(task) = tasks.iter().find(|t| t.id.as_str() == reference) {
            return Ok(task.clone());
        }
        let wanted = reference.to_lowercase();
        let mut named = tasks
            .into_iter()
            .filter(|t| t.title.trim().to_lowercase() == wanted);
        let first = named
            .next()
            .ok_or_else(|| CoreError::TaskNotFound(reference.to_string()))?;
        if first.status != target {
            return Ok(first);
        }
        Ok(named.find(|t| t.status != target).unwrap_or(first))
    }

    // ── Pomodoro ──

    pub async fn pomodoro_start(
        &self,
        user: &UserId,
        config: Option<SessionConfig>,
        label: Option<String>,
    ) -> Result<Event> {
        self.pomodoro.start_labeled(user, config, label).await
    }

    pub async fn pomodoro_pause(&self, user: &UserId) -> Result<Event> {
        self.pomodoro.pause(user).await
    }

    pub async fn pomodoro_resume(&self, user: &UserId) -> Result<Event> {
        self.pomodoro.resume(user).await
    }

    pub async fn pomodoro_stop(&self, user: &UserId) -> Result<Event> {
        self.pomodoro.stop(user).await
    }

    pub async fn pomodoro_status(&self, user: &UserId) -> Result<SessionStatus> {
        self.pomodoro.status(user).await
    }

    /// Focus and task statistics for `user`, read on the blocking pool.
    ///
    /// # Errors
    /// [`CoreError::AnalyticsUnavailable`] without [`Assistant::with_analytics`].
    pub async fn analytics(&self, user: &UserId) -> Result<Stats> {
        let db = self
            .journal
            .as_ref()
            .map(Arc::clone)
            .ok_or(CoreError::AnalyticsUnavailable)?;
        let owner = user.clone();
        let now = self.clock.utc();
        let calendar = self.calendar;
        let stats = tokio::task::spawn_blocking(move || db.stats(&owner, now, calendar))
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))??;
        Ok(stats)
    }

    // ── Chat ──

    /// Parse and run one chat message from `user`.
    ///
    /// # Errors
    /// Any [`CoreError`] the underlying operation reports; the front end
    /// shows it to the user as is.
    pub async fn handle_message(&self, user: &UserId, text: &str) -> Result<Reply> {
        let command = ChatCommand::parse(text)?;
        tracing::debug!(user = %user, ?command, "chat command");
        self.run(user, command).await
    }

    pub async fn run(&self, user: &UserId, command: ChatCommand) -> Result<Reply> {
        let reply = match command {
            ChatCommand::Add(text) => Reply::TaskCreated {
                task: self.create_task(user, &text).await?,
            },
            ChatCommand::List(spec) => Reply::Tasks {
                tasks: self.list_tasks(user, &spec).await?,
            },
            ChatCommand::Done(task) => Reply::TaskUpdated {
                task: self.complete_task(user, &task).await?,
            },
            ChatCommand::SetStatus { task, status } => Reply::TaskUpdated {
                task: self.set_task_status(user, &task, status).await?,
            },
            ChatCommand::PomodoroStart(args) => {
                let config = if args.overrides_lengths() {
                    Some(args.resolve(self.pomodoro.defaults()).map_err(CoreError::from)?)
                } else {
                    None
                };
                Reply::Pomodoro {
                    event: self.pomodoro_start(user, config, args.label).await?,
                }
            }
            ChatCommand::PomodoroPause => Reply::Pomodoro {
                event: self.pomodoro_pause(user).await?,
            },
            ChatCommand::PomodoroResume => Reply::Pomodoro {
                event: self.pomodoro_resume(user).await?,
            },
            ChatCommand::PomodoroStop => Reply::Pomodoro {
                event: self.pomodoro_stop(user).await?,
            },
            ChatCommand::PomodoroStatus => Reply::Status {
                status: self.pomodoro_status(user).await?,
            },
            ChatCommand::Analytics => Reply::Analytics {
                stats: self.analytics(user).await?,
            },
            ChatCommand::Help => Reply::Help,
            ChatCommand::Usage(usage) => Reply::Usage { usage },
            ChatCommand::Unknown(input) => Reply::Unknown { input },
        };
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_and_arguments() {
        assert_eq!(
            ChatCommand::parse("/add Finish homework [high]").unwrap(),
            ChatCommand::Add("Finish homework [high]".into())
        );
        assert_eq!(
            ChatCommand::parse("/LIST@kairos_bot open week").unwrap(),
            ChatCommand::List(FilterSpec::parse(["open", "week"]))
        );
        assert_eq!(
            ChatCommand::parse("/done Finish homework").unwrap(),
            ChatCommand::Done("Finish homework".into())
        );
        assert_eq!(ChatCommand::parse("/pomodoro_stop").unwrap(), ChatCommand::PomodoroStop);
        assert_eq!(ChatCommand::parse("/help").unwrap(), ChatCommand::Help);
    }

    #[test]
    fn aliases_map_to_the_same_commands() {
        assert_eq!(
            ChatCommand::parse("/tasks done").unwrap(),
            ChatCommand::parse("/list done").unwrap()
        );
        assert_eq!(
            ChatCommand::parse("/pomodoro_start 50").unwrap(),
            ChatCommand::parse("/pomodoro 50").unwrap()
        );
        assert_eq!(ChatCommand::parse("/analytics").unwrap(), ChatCommand::Analytics);
        assert_eq!(ChatCommand::parse("/stats@kairos_bot").unwrap(), ChatCommand::Analytics);
        assert_eq!(ChatCommand::parse("/start").unwrap(), ChatCommand::Help);
    }

    #[test]
    fn missing_arguments_yield_usage() {
        assert!(matches!(ChatCommand::parse("/add   ").unwrap(), ChatCommand::Usage(_)));
        assert!(matches!(ChatCommand::parse("/done").unwrap(), ChatCommand::Usage(_)));
        assert!(matches!(ChatCommand::parse("/status").unwrap(), ChatCommand::Usage(_)));
    }

    #[test]
    fn plain_text_and_unknown_commands_are_unknown() {
        assert_eq!(
            ChatCommand::parse("  hello there ").unwrap(),
            ChatCommand::Unknown("hello there".into())
        );
        assert_eq!(
            ChatCommand::parse("/weather").unwrap(),
            ChatCommand::Unknown("/weather".into())
        );
    }

    #[test]
    fn pomodoro_arguments_fill_from_the_left() {
        let ChatCommand::PomodoroStart(args) = ChatCommand::parse("/pomodoro 50 10").unwrap() else {
            panic!("expected /pomodoro");
        };
        assert_eq!(args.work, Some(50));
        assert_eq!(args.short_break, Some(10));
        assert_eq!(args.long_break, None);
        assert_eq!(args.label, None);

        let config = args.resolve(&SessionConfig::default()).unwrap();
        assert_eq!(config.work(), chrono::Duration::minutes(50));
        assert_eq!(config.long_break(), chrono::Duration::minutes(15));
        assert_eq!(config.cycles_before_long_break(), 4);
    }

    #[test]
    fn pomodoro_text_after_the_numbers_is_the_label() {
        let ChatCommand::PomodoroStart(args) = ChatCommand::parse("/pomodoro Write essay").unwrap()
        else {
            panic!("expected /pomodoro");
        };
        assert!(!args.overrides_lengths());
        assert_eq!(args.label.as_deref(), Some("Write essay"));

        let ChatCommand::PomodoroStart(args) =
            ChatCommand::parse("/pomodoro 50 10  Read   chapter 3").unwrap()
        else {
            panic!("expected /pomodoro");
        };
        assert_eq!(args.work, Some(50));
        assert_eq!(args.short_break, Some(10));
        assert_eq!(args.label.as_deref(), Some("Read chapter 3"));
    }

    #[test]
    fn pomodoro_arguments_are_validated() {
        assert!(ChatCommand::parse("/pomodoro 1 2 3 4 5").is_err());
        let ChatCommand::PomodoroStart(args) = ChatCommand::parse("/pomodoro 0").unwrap() else {
            panic!("expected /pomodoro");
        };
        assert!(args.resolve(&SessionConfig::default()).is_err());
    }

    #[test]
    fn status_takes_comma_or_trailing_phrase() {
        let set = |task: &str, status| ChatCommand::SetStatus {
            task: task.into(),
            status,
        };
        assert_eq!(
            ChatCommand::parse("/status Finish homework, In Progress").unwrap(),
            set("Finish homework", TaskStatus::Open)
        );
        assert_eq!(
            ChatCommand::parse("/status Buy milk, eggs, <Completed>").unwrap(),
            set("Buy milk, eggs", TaskStatus::Done)
        );
        assert_eq!(
            ChatCommand::parse("/status Finish homework not started").unwrap(),
            set("Finish homework", TaskStatus::Open)
        );
        assert_eq!(
            ChatCommand::parse("/status Essay done").unwrap(),
            set("Essay", TaskStatus::Done)
        );
    }

    #[test]
    fn status_without_a_known_status_is_usage() {
        for text in ["/status Essay, archived", "/status Essay", "/status , done", "/status done"] {
            assert_eq!(
                ChatCommand::parse(text).unwrap(),
                ChatCommand::Usage(STATUS_USAGE),
                "{text}"
            );
        }
    }
}
