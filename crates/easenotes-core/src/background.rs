//! Background-execution grant collaborator.
//!
//! Mobile hosts hand out short-lived grants of run time while the app is
//! suspended; the countdown acquires one per cycle and releases it on stop.
//! The grant is an extension of runnable time, not a precondition for
//! counting -- a denied grant is logged and the countdown proceeds.

use uuid::Uuid;

use crate::error::BackgroundError;

/// Opaque token for a held background-execution grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GrantHandle(Uuid);

impl GrantHandle {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

pub trait BackgroundExecution: Send + Sync {
    /// Request extra run time while the host is suspended.
    fn acquire(&self) -> Result<GrantHandle, BackgroundError>;

    /// Give the grant back. Unknown handles are ignored.
    fn release(&self, handle: GrantHandle);
}

/// Grant service for hosts whose process is never suspended (the CLI).
#[derive(Debug, Default)]
pub struct NoopBackgroundExecution;

impl BackgroundExecution for NoopBackgroundExecution {
    fn acquire(&self) -> Result<GrantHandle, BackgroundError> {
        Ok(GrantHandle::generate())
    }

    fn release(&self, _handle: GrantHandle) {}
}
