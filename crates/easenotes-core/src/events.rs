use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every countdown state change produces an Event.
/// The CLI prints and persists them; hosts read them off the driver's stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    CountdownStarted {
        duration_secs: u64,
        auto_restart: bool,
        at: DateTime<Utc>,
    },
    /// A cycle reached zero. Emitted after the stop cleanup and the
    /// completion callback; `will_restart` reports whether a fresh cycle
    /// already began.
    CountdownCompleted {
        duration_secs: u64,
        will_restart: bool,
        at: DateTime<Utc>,
    },
    /// The countdown was stopped before reaching zero.
    CountdownStopped {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        running: bool,
        remaining_secs: u64,
        duration_secs: u64,
        auto_restart: bool,
        at: DateTime<Utc>,
    },
}
