//! Pomodoro command handling on top of the session registry.
//!
//! Every operation locks the user's session first and only then reads the
//! clock, so the timestamps a session sees follow its lock order.

use mockable::Clock;
use std::sync::Arc;

use super::config::SessionConfig;
use super::registry::{SessionHandle, SessionRegistry};
use super::session::{Session, SessionStatus};
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::ids::UserId;
use crate::notify::NotificationSink;

pub struct PomodoroService<C>
where
    C: Clock + Send + Sync,
{
    registry: SessionRegistry,
    clock: Arc<C>,
    sink: Arc<dyn NotificationSink>,
    defaults: SessionConfig,
}

impl<C> PomodoroService<C>
where
    C: Clock + Send + Sync,
{
    pub fn new(clock: Arc<C>, sink: Arc<dyn NotificationSink>, defaults: SessionConfig) -> Self {
        Self {
            registry: SessionRegistry::new(),
            clock,
            sink,
            defaults,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn defaults(&self) -> &SessionConfig {
        &self.defaults
    }

    /// Create and start a session, with `config` or the service defaults.
    ///
    /// # Errors
    /// [`CoreError::SessionAlreadyActive`] if the user already has one.
    pub async fn start(&self, user: &UserId, config: Option<SessionConfig>) -> Result<Event> {
        self.start_labeled(user, config, None).await
    }

    /// [`PomodoroService::start`] for a session named after a task.
    pub async fn start_labeled(
        &self,
        user: &UserId,
        config: Option<SessionConfig>,
        label: Option<String>,
    ) -> Result<Event> {
        let config = config.unwrap_or(self.defaults);
        let handle = self.registry.create(user.clone(), config, self.clock.utc())?;
        let mut session = handle.lock().await;
        session.set_label(label);
        let event = session.start(self.clock.utc())?;
        tracing::info!(user = %user, label = ?session.label(), "pomodoro session started");
        self.sink.notify(user, &event);
        Ok(event)
    }

    pub async fn pause(&self, user: &UserId) -> Result<Event> {
        self.command(user, |session, now| session.pause(now)).await
    }

    pub async fn resume(&self, user: &UserId) -> Result<Event> {
        self.command(user, |session, now| session.resume(now)).await
    }

    /// Stop the user's session and drop it from the registry.
    pub async fn stop(&self, user: &UserId) -> Result<Event> {
        let handle = self.live_handle(user)?;
        let mut session = handle.lock().await;
        let event = session.stop(self.clock.utc())?;
        self.sink.notify(user, &event);
        drop(session);
        self.registry.remove_if_current(user, &handle);
        tracing::info!(user = %user, "pomodoro session stopped");
        Ok(event)
    }

    pub async fn status(&self, user: &UserId) -> Result<SessionStatus> {
        let handle = self.live_handle(user)?;
        let session = handle.lock().await;
        if session.is_terminal() {
            return Err(CoreError::NoActiveSession);
        }
        Ok(session.status(self.clock.utc()))
    }

    /// Advance the user's session if its phase has expired.
    ///
    /// A tick that reaches a session after it was stopped finds it
    /// `Stopped` (or already gone) and does nothing.
    pub async fn tick(&self, user: &UserId) -> Option<Event> {
        let handle = self.registry.get(user)?;
        let mut session = handle.lock().await;
        self.advance(user, &mut session)
    }

    /// Tick every registered session once.
    ///
    /// A session whose lock is taken (a command in flight, or waiters queued
    /// on it) is skipped; the next sweep picks it up.
    pub async fn tick_all(&self) -> Vec<(UserId, Event)> {
        let mut fired = Vec::new();
        for user in self.registry.users() {
            let Some(handle) = self.registry.get(&user) else {
                continue;
            };
            let Ok(mut session) = handle.try_lock() else {
                tracing::trace!(user = %user, "session busy, tick skipped");
                continue;
            };
            if let Some(event) = self.advance(&user, &mut session) {
                fired.push((user, event));
            }
        }
        fired
    }

    async fn command<F>(&self, user: &UserId, apply: F) -> Result<Event>
    where
        F: FnOnce(&mut Session, chrono::DateTime<chrono::Utc>) -> Result<Event>,
    {
        let handle = self.live_handle(user)?;
        let mut session = handle.lock().await;
        let event = apply(&mut *session, self.clock.utc())?;
        tracing::debug!(user = %user, phase = ?event.phase_after(), "pomodoro command applied");
        self.sink.notify(user, &event);
        Ok(event)
    }

    fn advance(&self, user: &UserId, session: &mut Session) -> Option<Event> {
        let event = session.tick(self.clock.utc())?;
        tracing::info!(
            user = %user,
            phase = ?event.phase_after(),
            cycles = session.cycles_completed(),
            "pomodoro phase advanced"
        );
        self.sink.notify(user, &event);
        Some(event)
    }

    fn live_handle(&self, user: &UserId) -> Result<SessionHandle> {
        self.registry.get(user).ok_or(CoreError::NoActiveSession)
    }
}
