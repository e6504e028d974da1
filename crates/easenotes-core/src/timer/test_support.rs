//! Shared collaborator doubles for timer tests.
//!
//! Both doubles append to one ordered [`CallLog`], so tests can assert
//! ordering across collaborators (release/cancel before the completion
//! callback, fresh acquire/schedule after it).

use std::sync::{Arc, Mutex};

use crate::background::{BackgroundExecution, GrantHandle};
use crate::error::{BackgroundError, NotifyError};
use crate::notify::{NotificationId, NotificationScheduler};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    AuthorizationRequested,
    Scheduled { id: NotificationId, after_secs: u64 },
    Cancelled(NotificationId),
    GrantAcquired(GrantHandle),
    GrantReleased(GrantHandle),
    Completed,
}

#[derive(Debug, Default)]
pub struct CallLog {
    pub entries: Vec<Call>,
}

impl CallLog {
    pub fn scheduled_ids(&self) -> Vec<NotificationId> {
        self.entries
            .iter()
            .filter_map(|call| match call {
                Call::Scheduled { id, .. } => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn cancelled_ids(&self) -> Vec<NotificationId> {
        self.entries
            .iter()
            .filter_map(|call| match call {
                Call::Cancelled(id) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn acquired(&self) -> usize {
        self.count(|call| matches!(call, Call::GrantAcquired(_)))
    }

    pub fn released(&self) -> usize {
        self.count(|call| matches!(call, Call::GrantReleased(_)))
    }

    pub fn completions(&self) -> usize {
        self.count(|call| matches!(call, Call::Completed))
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.entries.iter().filter(|call| pred(call)).count()
    }
}

pub type SharedCallLog = Arc<Mutex<CallLog>>;

pub fn shared_log() -> SharedCallLog {
    Arc::new(Mutex::new(CallLog::default()))
}

/// Completion callback that records into the shared log.
pub fn completion_probe(log: &SharedCallLog) -> impl FnMut() + Send + 'static {
    let log = Arc::clone(log);
    move || log.lock().unwrap().entries.push(Call::Completed)
}

pub struct RecordingNotifier {
    log: SharedCallLog,
    fail_schedule: bool,
}

impl RecordingNotifier {
    pub fn new(log: SharedCallLog) -> Self {
        Self { log, fail_schedule: false }
    }

    /// A notifier whose scheduling always fails (permission denied).
    pub fn failing(log: SharedCallLog) -> Self {
        Self { log, fail_schedule: true }
    }
}

impl NotificationScheduler for RecordingNotifier {
    fn request_authorization(&self) -> Result<(), NotifyError> {
        if self.fail_schedule {
            return Err(NotifyError::PermissionDenied);
        }
        self.log.lock().unwrap().entries.push(Call::AuthorizationRequested);
        Ok(())
    }

    fn schedule_one_shot(
        &self,
        after_secs: u64,
        _title: &str,
        _body: &str,
    ) -> Result<NotificationId, NotifyError> {
        if self.fail_schedule {
            return Err(NotifyError::PermissionDenied);
        }
        let id = NotificationId::generate();
        self.log
            .lock()
            .unwrap()
            .entries
            .push(Call::Scheduled { id: id.clone(), after_secs });
        Ok(id)
    }

    fn cancel(&self, id: &NotificationId) {
        self.log.lock().unwrap().entries.push(Call::Cancelled(id.clone()));
    }
}

pub struct RecordingGrants {
    log: SharedCallLog,
    deny: bool,
}

impl RecordingGrants {
    pub fn new(log: SharedCallLog) -> Self {
        Self { log, deny: false }
    }

    /// A grant service that refuses every acquisition.
    pub fn denying(log: SharedCallLog) -> Self {
        Self { log, deny: true }
    }
}

impl BackgroundExecution for RecordingGrants {
    fn acquire(&self) -> Result<GrantHandle, BackgroundError> {
        if self.deny {
            return Err(BackgroundError::GrantDenied);
        }
        let handle = GrantHandle::generate();
        self.log.lock().unwrap().entries.push(Call::GrantAcquired(handle));
        Ok(handle)
    }

    fn release(&self, handle: GrantHandle) {
        self.log.lock().unwrap().entries.push(Call::GrantReleased(handle));
    }
}
