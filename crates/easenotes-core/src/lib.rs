//! # EaseNotes Core Library
//!
//! Core logic for EaseNotes: project notes (title + free-text content) with
//! an optional repeating countdown timer attached, so the user is nudged to
//! log progress at a fixed interval. All operations are available through
//! the standalone CLI binary; richer front ends are thin layers over this
//! crate.
//!
//! ## Architecture
//!
//! - **Countdown timer**: a caller-ticked state machine plus a tokio driver
//!   that ticks it once per second and publishes state over a channel
//! - **Collaborators**: notification scheduling and background-execution
//!   grants are injected traits, so platform backends and test doubles plug
//!   in the same way
//! - **Storage**: SQLite-based project records and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`CountdownTimer`]: repeating countdown state machine
//! - [`CountdownDriver`]: once-per-second tick source
//! - [`NotificationScheduler`] / [`BackgroundExecution`]: platform collaborators
//! - [`Database`]: project record persistence
//! - [`Config`]: application configuration management

pub mod background;
pub mod error;
pub mod events;
pub mod notify;
pub mod project;
pub mod storage;
pub mod timer;

pub use background::{BackgroundExecution, GrantHandle, NoopBackgroundExecution};
pub use error::{
    BackgroundError, ConfigError, CoreError, DatabaseError, NotifyError, ValidationError,
};
pub use events::Event;
pub use notify::{LogNotifier, NotificationId, NotificationScheduler};
pub use project::Project;
pub use storage::{data_dir, Config, Database};
pub use timer::{CountdownDriver, CountdownTimer};
