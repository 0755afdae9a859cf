//! Writes pomodoro periods into `pomodoro_sessions`.
//!
//! The journal reads notifications from a [`ChannelSink`] receiver on a
//! blocking thread, so SQLite writes never run under a session lock.
//!
//! [`ChannelSink`]: crate::notify::ChannelSink

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::database::{Database, SessionKind};
use crate::events::Event;
use crate::ids::UserId;
use crate::notify::Notification;
use crate::timer::Phase;

pub struct SessionJournal {
    db: Arc<Database>,
    /// Label of each user's running session, copied onto its work rows.
    labels: HashMap<UserId, String>,
}

impl SessionJournal {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            labels: HashMap::new(),
        }
    }

    /// Apply one notification to the journal.
    ///
    /// A start or phase change closes the user's open row and opens one for
    /// the new phase. Pause and resume leave the row open. Stop closes it.
    ///
    /// # Errors
    /// Returns the underlying SQLite error.
    pub fn record(&mut self, note: &Notification) -> Result<(), rusqlite::Error> {
        let user = &note.user;
        match &note.event {
            Event::SessionStarted {
                phase, label, at, ..
            } => {
                match label {
                    Some(label) => self.labels.insert(user.clone(), label.clone()),
                    None => self.labels.remove(user),
                };
                self.open_phase(user, *phase, *at)?;
            }
            Event::PhaseAdvanced { to, at, .. } => self.open_phase(user, *to, *at)?,
            Event::SessionStopped { at, .. } => {
                self.labels.remove(user);
                self.db.journal_close(user, *at)?;
            }
            Event::SessionPaused { .. } | Event::SessionResumed { .. } => {}
        }
        Ok(())
    }

    fn open_phase(
        &self,
        user: &UserId,
        phase: Phase,
        at: DateTime<Utc>,
    ) -> Result<(), rusqlite::Error> {
        self.db.journal_close(user, at)?;
        if let Some(kind) = SessionKind::from_phase(phase) {
            let label = match kind {
                SessionKind::Work => self.labels.get(user).map(String::as_str),
                SessionKind::ShortBreak | SessionKind::LongBreak => None,
            };
            self.db.journal_open(user, kind, at, label)?;
        }
        Ok(())
    }

    /// Drain `rx` on a blocking thread until every sender is gone.
    pub fn spawn(mut self, mut rx: mpsc::UnboundedReceiver<Notification>) -> JoinHandle<()> {
        tokio::task::spawn_blocking(move || {
            while let Some(note) = rx.blocking_recv() {
                if let Err(e) = self.record(&note) {
                    tracing::warn!(user = %note.user, error = %e, "failed to journal pomodoro event");
                }
            }
        })
    }
}
