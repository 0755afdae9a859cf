//! Ownership table of live sessions, keyed by user.
//!
//! The map lock is only held to look up, insert or remove an entry. Each
//! session sits behind its own `tokio::sync::Mutex`, so work on one user's
//! session never waits on another user's. Tokio's mutex queues waiters in
//! FIFO order, which keeps a single user's commands and ticks in arrival
//! order.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;

use super::config::SessionConfig;
use super::session::Session;
use crate::error::{CoreError, Result};
use crate::ids::UserId;

/// Shared handle to one user's session.
pub type SessionHandle = Arc<Mutex<Session>>;

#[derive(Debug, Default)]
pub struct SessionRegistry {
    entries: RwLock<HashMap<UserId, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user: &UserId) -> Option<SessionHandle> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user)
            .cloned()
    }

    /// Register a fresh `Idle` session for `user`.
    ///
    /// A leftover `Stopped` entry is replaced. An entry whose lock is held
    /// right now is treated as live.
    ///
    /// # Errors
    /// [`CoreError::SessionAlreadyActive`] if the user already has a live session.
    pub fn create(
        &self,
        user: UserId,
        config: SessionConfig,
        now: DateTime<Utc>,
    ) -> Result<SessionHandle> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = entries.get(&user) {
            let replaceable = existing
                .try_lock()
                .map(|session| session.is_terminal())
                .unwrap_or(false);
            if !replaceable {
                return Err(CoreError::SessionAlreadyActive);
            }
        }
        let handle = Arc::new(Mutex::new(Session::new(user.clone(), config, now)));
        entries.insert(user, Arc::clone(&handle));
        Ok(handle)
    }

    pub fn remove(&self, user: &UserId) -> Option<SessionHandle> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(user)
    }

    /// Remove `user`'s entry only if it is still `handle`.
    ///
    /// Guards against dropping a session created after `handle` was stopped.
    pub fn remove_if_current(&self, user: &UserId, handle: &SessionHandle) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries.get(user) {
            Some(current) if Arc::ptr_eq(current, handle) => {
                entries.remove(user);
                true
            }
            _ => false,
        }
    }

    pub fn users(&self) -> Vec<UserId> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
