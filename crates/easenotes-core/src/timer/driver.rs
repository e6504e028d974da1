//! Once-per-second tick source for [`CountdownTimer`].
//!
//! The state machine is caller-ticked; this driver is the caller. It owns
//! the timer behind a mutex, spawns at most one tokio task that ticks it at
//! a fixed one-second period, and publishes a state snapshot after every
//! tick (plus the completion events the timer emits) on an unbounded
//! channel. Observers that prefer polling can read the shared handle
//! directly instead.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::error::ValidationError;
use crate::events::Event;

use super::CountdownTimer;

const TICK_PERIOD: Duration = Duration::from_secs(1);

pub struct CountdownDriver {
    timer: Arc<Mutex<CountdownTimer>>,
    tick_task: Option<JoinHandle<()>>,
}

impl CountdownDriver {
    pub fn new(timer: CountdownTimer) -> Self {
        Self {
            timer: Arc::new(Mutex::new(timer)),
            tick_task: None,
        }
    }

    /// Shared handle for reading live state (`remaining_secs`, `is_running`).
    pub fn timer(&self) -> Arc<Mutex<CountdownTimer>> {
        Arc::clone(&self.timer)
    }

    /// Start a countdown and spawn the tick task, replacing any previous
    /// one. The first tick fires one full period after start. Returns the
    /// event stream for this run, beginning with the started event.
    ///
    /// # Errors
    /// Rejects a zero duration without touching a cycle already running.
    pub fn start(
        &mut self,
        duration_min: u32,
        auto_restart: bool,
    ) -> Result<mpsc::UnboundedReceiver<Event>, ValidationError> {
        // Validate before touching the current tick task so a rejected
        // start leaves a running cycle with its tick source intact.
        super::countdown::validate_duration(duration_min)?;
        if let Some(task) = self.tick_task.take() {
            task.abort();
        }
        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut timer = lock(&self.timer);
            let started = timer.start(duration_min, auto_restart)?;
            let _ = tx.send(started);
        }

        let timer = Arc::clone(&self.timer);
        self.tick_task = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(time::Instant::now() + TICK_PERIOD, TICK_PERIOD);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let (completed, snapshot, still_running) = {
                    let mut timer = lock(&timer);
                    if !timer.is_running() {
                        break;
                    }
                    let completed = timer.tick();
                    (completed, timer.snapshot(), timer.is_running())
                };
                if let Some(event) = completed {
                    let _ = tx.send(event);
                }
                // A dropped receiver only stops publication; the countdown
                // itself keeps ticking until stopped or completed.
                let _ = tx.send(snapshot);
                if !still_running {
                    break;
                }
            }
        }));
        Ok(rx)
    }

    /// Manual stop: tears down the tick task, then runs the timer's stop
    /// sequence (grant release, notification cancel). Idempotent.
    pub fn stop(&mut self) {
        if let Some(task) = self.tick_task.take() {
            task.abort();
        }
        lock(&self.timer).stop();
    }
}

impl Drop for CountdownDriver {
    fn drop(&mut self) {
        if let Some(task) = self.tick_task.take() {
            task.abort();
        }
    }
}

fn lock(timer: &Arc<Mutex<CountdownTimer>>) -> std::sync::MutexGuard<'_, CountdownTimer> {
    // Timer methods don't panic mid-update; a poisoned guard still holds
    // consistent state.
    match timer.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
