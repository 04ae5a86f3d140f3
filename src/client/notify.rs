use std::fmt::Display;

use tokio::sync::broadcast;
use tracing::debug;

use super::actions::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

/// Transient, user-visible outcome of a settled mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub action: Action,
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn success(action: Action) -> Self {
        Self {
            action,
            level: Level::Success,
            message: action.success_message().to_string(),
        }
    }

    pub fn error(action: Action, err: &impl Display) -> Self {
        Self {
            action,
            level: Level::Error,
            message: format!("Could not {}: {err}", action.label()),
        }
    }
}

#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn emit(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            debug!("notification dropped: no subscribers");
        }
    }
}
