//! Engine-level status slot for surfacing transient failures
//!
//! Delivery exhaustion and command rejections land here so operators can
//! see them on `/health` and `/status`; nothing else reads this state.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::util::time::epoch_secs;

/// How long a recorded error stays visible on the status surface
pub const ERROR_DISPLAY_WINDOW: f64 = 5.0;

#[derive(Debug, Clone)]
pub struct StatusEntry {
    pub message: String,
    pub at: f64,
}

/// Shared last-error slot. Most recent wins.
#[derive(Clone)]
pub struct EngineStatus {
    inner: Arc<Mutex<Option<StatusEntry>>>,
}

impl EngineStatus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(None)),
        }
    }

    pub fn set_error(&self, message: impl Into<String>) {
        *self.inner.lock() = Some(StatusEntry {
            message: message.into(),
            at: epoch_secs(),
        });
    }

    /// The last recorded error regardless of age
    pub fn last_error(&self) -> Option<StatusEntry> {
        self.inner.lock().clone()
    }

    /// The last recorded error if it is still fresh enough to display
    pub fn recent_error(&self, now: f64) -> Option<StatusEntry> {
        self.inner
            .lock()
            .clone()
            .filter(|entry| now - entry.at <= ERROR_DISPLAY_WINDOW)
    }
}

impl Default for EngineStatus {
    fn default() -> Self {
        Self::new()
    }
}
