//! Notification scheduling collaborator.
//!
//! The timer never talks to a platform notification center directly; it
//! holds a [`NotificationScheduler`] injected at construction time, so test
//! doubles and platform backends plug in the same way. Delivery is
//! best-effort by contract: a scheduling failure must never stop a running
//! countdown.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::NotifyError;

/// Opaque token identifying a scheduled one-shot notification, recorded so
/// the pending alert can be cancelled on stop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(String);

impl NotificationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One-shot local alert scheduling.
pub trait NotificationScheduler: Send + Sync {
    /// Ask the platform for permission to alert the user. Hosts call this
    /// once at startup; the timer itself never queries permission state.
    fn request_authorization(&self) -> Result<(), NotifyError>;

    /// Schedule a one-shot alert `after_secs` seconds from now.
    fn schedule_one_shot(
        &self,
        after_secs: u64,
        title: &str,
        body: &str,
    ) -> Result<NotificationId, NotifyError>;

    /// Cancel a pending alert. Unknown or already-fired ids are ignored.
    fn cancel(&self, id: &NotificationId);
}

/// Scheduler that records requests in the log stream instead of a platform
/// notification center. Hosts with a real notifier implement
/// [`NotificationScheduler`] against their platform service; the foreground
/// CLI alerts on the completion event itself.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl NotificationScheduler for LogNotifier {
    fn request_authorization(&self) -> Result<(), NotifyError> {
        tracing::debug!("notification authorization requested");
        Ok(())
    }

    fn schedule_one_shot(
        &self,
        after_secs: u64,
        title: &str,
        body: &str,
    ) -> Result<NotificationId, NotifyError> {
        let id = NotificationId::generate();
        tracing::info!(id = %id, after_secs, title, body, "scheduled one-shot notification");
        Ok(id)
    }

    fn cancel(&self, id: &NotificationId) {
        tracing::debug!(id = %id, "cancelled pending notification");
    }
}
