//! Notification sinks for session events.
//!
//! The pomodoro service calls `notify` while it still holds the user's
//! session lock, so implementations must not block.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

use crate::events::Event;
use crate::ids::UserId;

/// A session event addressed to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub user: UserId,
    pub event: Event,
}

/// Receives every phase transition the session clock produces.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, user: &UserId, event: &Event);
}

/// Forwards notifications into an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, user: &UserId, event: &Event) {
        let note = Notification {
            user: user.clone(),
            event: event.clone(),
        };
        if self.tx.send(note).is_err() {
            tracing::warn!(user = %user, "notification receiver dropped");
        }
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Events for one user, in delivery order.
    pub fn events_for(&self, user: &UserId) -> Vec<Event> {
        self.notifications()
            .into_iter()
            .filter(|n| &n.user == user)
            .map(|n| n.event)
            .collect()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, user: &UserId, event: &Event) {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Notification {
                user: user.clone(),
                event: event.clone(),
            });
    }
}

/// Delivers each notification to every inner sink, in order.
#[derive(Default)]
pub struct FanOutSink {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl FanOutSink {
    pub fn new(sinks: Vec<Arc<dyn NotificationSink>>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: Arc<dyn NotificationSink>) {
        self.sinks.push(sink);
    }
}

impl NotificationSink for FanOutSink {
    fn notify(&self, user: &UserId, event: &Event) {
        for sink in &self.sinks {
            sink.notify(user, event);
        }
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self, _user: &UserId, _event: &Event) {}
}
