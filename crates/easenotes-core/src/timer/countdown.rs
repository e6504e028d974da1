//! Repeating countdown state machine.
//!
//! The countdown is caller-ticked: it holds no thread and no clock of its
//! own. The caller (normally [`CountdownDriver`]) invokes `tick()` once per
//! second while the timer is running.
//!
//! ## State transitions
//!
//! ```text
//! Stopped -> start() -> Running -> tick()*  -> Stopped
//!                          ^                     |
//!                          +--- auto-restart ----+
//! ```
//!
//! On each `start`, the timer acquires a background-execution grant and
//! schedules a one-shot completion notification; `stop` releases both.
//! Collaborator failures are logged and never interrupt the countdown.
//!
//! [`CountdownDriver`]: super::CountdownDriver

use std::sync::Arc;

use chrono::Utc;

use crate::background::{BackgroundExecution, GrantHandle};
use crate::error::ValidationError;
use crate::events::Event;
use crate::notify::{NotificationId, NotificationScheduler};

const ALERT_TITLE: &str = "Timer Completed";
const ALERT_BODY: &str = "Time to document your progress!";

/// Zero minutes is invalid; rejected deterministically wherever a countdown
/// can be started.
pub(crate) fn validate_duration(duration_min: u32) -> Result<(), ValidationError> {
    if duration_min == 0 {
        return Err(ValidationError::InvalidValue {
            field: "duration_minutes".to_string(),
            message: "countdown duration must be a positive number of minutes".to_string(),
        });
    }
    Ok(())
}

type CompletionCallback = Box<dyn FnMut() + Send>;

/// Repeating countdown timer.
///
/// Owns a single countdown's state and drives it forward one second per
/// `tick()`. Start/stop/tick must be serialized by the caller (the driver
/// wraps the timer in a mutex for multi-context hosts).
pub struct CountdownTimer {
    /// Full interval of one cycle, in seconds.
    duration_secs: u64,
    /// Seconds left in the current cycle; always `<= duration_secs`.
    remaining_secs: u64,
    running: bool,
    auto_restart: bool,
    pending_notification: Option<NotificationId>,
    background_grant: Option<GrantHandle>,
    notifier: Arc<dyn NotificationScheduler>,
    background: Arc<dyn BackgroundExecution>,
    on_complete: Option<CompletionCallback>,
}

impl CountdownTimer {
    /// Create a stopped timer with the given collaborators.
    pub fn new(
        notifier: Arc<dyn NotificationScheduler>,
        background: Arc<dyn BackgroundExecution>,
    ) -> Self {
        Self {
            duration_secs: 0,
            remaining_secs: 0,
            running: false,
            auto_restart: false,
            pending_notification: None,
            background_grant: None,
            notifier,
            background,
            on_complete: None,
        }
    }

    /// Register the completion callback. It fires once per completed cycle,
    /// after the stop cleanup and before any auto-restart.
    pub fn on_complete(&mut self, callback: impl FnMut() + Send + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    pub fn auto_restart(&self) -> bool {
        self.auto_restart
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            running: self.running,
            remaining_secs: self.remaining_secs,
            duration_secs: self.duration_secs,
            auto_restart: self.auto_restart,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a cycle of `duration_min` minutes.
    ///
    /// A zero duration is rejected and leaves any running cycle untouched.
    /// If a cycle is running, the full stop sequence runs first, so at most
    /// one grant, one pending notification, and one active cycle exist at a
    /// time. Grant acquisition and notification scheduling both happen here,
    /// before the first tick.
    pub fn start(&mut self, duration_min: u32, auto_restart: bool) -> Result<Event, ValidationError> {
        validate_duration(duration_min)?;
        self.stop();
        self.begin_cycle(u64::from(duration_min) * 60, auto_restart);
        Ok(Event::CountdownStarted {
            duration_secs: self.duration_secs,
            auto_restart,
            at: Utc::now(),
        })
    }

    /// Stop the countdown. Idempotent: safe to call when already stopped.
    ///
    /// Releases the background grant and cancels the pending notification
    /// (each at most once) before returning, so a completion callback never
    /// observes a half-stopped timer.
    pub fn stop(&mut self) {
        self.running = false;
        self.remaining_secs = 0;
        if let Some(handle) = self.background_grant.take() {
            self.background.release(handle);
        }
        if let Some(id) = self.pending_notification.take() {
            self.notifier.cancel(&id);
        }
    }

    /// Advance the countdown by one second.
    ///
    /// Returns the completion event when the cycle reaches zero, `None`
    /// otherwise (including when the timer is stopped). On completion the
    /// stop cleanup runs first, then the completion callback, then -- with
    /// auto-restart -- a fresh cycle begins with the same duration.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return None;
        }

        let duration_secs = self.duration_secs;
        let auto_restart = self.auto_restart;
        self.stop();
        if let Some(callback) = self.on_complete.as_mut() {
            callback();
        }
        if auto_restart {
            self.begin_cycle(duration_secs, auto_restart);
        }
        Some(Event::CountdownCompleted {
            duration_secs,
            will_restart: auto_restart,
            at: Utc::now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn begin_cycle(&mut self, duration_secs: u64, auto_restart: bool) {
        self.duration_secs = duration_secs;
        self.remaining_secs = duration_secs;
        self.auto_restart = auto_restart;
        self.running = true;

        self.background_grant = match self.background.acquire() {
            Ok(handle) => Some(handle),
            Err(err) => {
                tracing::warn!(%err, "background grant unavailable, counting down without it");
                None
            }
        };
        self.pending_notification =
            match self.notifier.schedule_one_shot(duration_secs, ALERT_TITLE, ALERT_BODY) {
                Ok(id) => Some(id),
                Err(err) => {
                    tracing::warn!(%err, "could not schedule completion notification");
                    None
                }
            };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::test_support::{
        completion_probe, shared_log, Call, RecordingGrants, RecordingNotifier, SharedCallLog,
    };

    fn timer_with_log() -> (CountdownTimer, SharedCallLog) {
        let log = shared_log();
        let mut timer = CountdownTimer::new(
            Arc::new(RecordingNotifier::new(Arc::clone(&log))),
            Arc::new(RecordingGrants::new(Arc::clone(&log))),
        );
        timer.on_complete(completion_probe(&log));
        (timer, log)
    }

    fn failing_timer_with_log() -> (CountdownTimer, SharedCallLog) {
        let log = shared_log();
        let mut timer = CountdownTimer::new(
            Arc::new(RecordingNotifier::failing(Arc::clone(&log))),
            Arc::new(RecordingGrants::denying(Arc::clone(&log))),
        );
        timer.on_complete(completion_probe(&log));
        (timer, log)
    }

    #[test]
    fn start_initializes_full_interval() {
        let (mut timer, log) = timer_with_log();
        timer.start(5, true).unwrap();

        assert!(timer.is_running());
        assert_eq!(timer.remaining_secs(), 300);
        assert_eq!(timer.duration_secs(), 300);
        let log = log.lock().unwrap();
        assert_eq!(log.acquired(), 1);
        assert_eq!(log.scheduled_ids().len(), 1);
    }

    #[test]
    fn scheduled_notification_covers_the_whole_interval() {
        let (mut timer, log) = timer_with_log();
        timer.start(2, false).unwrap();

        let log = log.lock().unwrap();
        let after = log
            .entries
            .iter()
            .find_map(|call| match call {
                Call::Scheduled { after_secs, .. } => Some(*after_secs),
                _ => None,
            })
            .unwrap();
        assert_eq!(after, 120);
    }

    #[test]
    fn counts_down_to_completion_exactly_once() {
        let (mut timer, log) = timer_with_log();
        timer.start(1, false).unwrap();

        let mut completed = None;
        for _ in 0..60 {
            completed = timer.tick();
        }

        assert!(matches!(
            completed,
            Some(Event::CountdownCompleted { will_restart: false, .. })
        ));
        assert!(!timer.is_running());
        assert_eq!(timer.remaining_secs(), 0);
        assert_eq!(log.lock().unwrap().completions(), 1);
    }

    #[test]
    fn tick_when_stopped_is_a_no_op() {
        let (mut timer, log) = timer_with_log();
        assert!(timer.tick().is_none());

        timer.start(1, false).unwrap();
        for _ in 0..60 {
            timer.tick();
        }
        assert!(timer.tick().is_none());
        assert_eq!(timer.remaining_secs(), 0);
        assert_eq!(log.lock().unwrap().completions(), 1);
    }

    #[test]
    fn restart_while_running_stops_previous_cycle_first() {
        let (mut timer, log) = timer_with_log();
        timer.start(10, false).unwrap();
        for _ in 0..3 {
            timer.tick();
        }
        timer.start(5, false).unwrap();

        assert_eq!(timer.remaining_secs(), 300);
        let log = log.lock().unwrap();
        let scheduled = log.scheduled_ids();
        assert_eq!(scheduled.len(), 2);
        assert_ne!(scheduled[0], scheduled[1]);
        // The first cycle's notification was cancelled, and its grant
        // released, before the second cycle acquired fresh ones.
        assert_eq!(log.cancelled_ids(), vec![scheduled[0].clone()]);
        assert_eq!(log.acquired(), 2);
        assert_eq!(log.released(), 1);
        assert_eq!(log.completions(), 0);
    }

    #[test]
    fn stop_is_idempotent() {
        let (mut timer, log) = timer_with_log();
        timer.start(3, true).unwrap();
        timer.tick();

        timer.stop();
        let (released, cancelled) = {
            let log = log.lock().unwrap();
            (log.released(), log.cancelled_ids().len())
        };
        timer.stop();

        let log = log.lock().unwrap();
        assert_eq!(log.released(), released);
        assert_eq!(log.cancelled_ids().len(), cancelled);
        assert!(!timer.is_running());
        assert_eq!(timer.remaining_secs(), 0);
    }

    #[test]
    fn auto_restart_begins_a_fresh_cycle() {
        let (mut timer, log) = timer_with_log();
        timer.start(1, true).unwrap();

        let mut completed = None;
        for _ in 0..60 {
            completed = timer.tick();
        }

        assert!(matches!(
            completed,
            Some(Event::CountdownCompleted { will_restart: true, .. })
        ));
        assert!(timer.is_running());
        assert_eq!(timer.remaining_secs(), 60);
        let scheduled = log.lock().unwrap().scheduled_ids();
        assert_eq!(scheduled.len(), 2);
        assert_ne!(scheduled[0], scheduled[1]);

        for _ in 0..60 {
            timer.tick();
        }
        assert_eq!(log.lock().unwrap().completions(), 2);
        assert!(timer.is_running());
    }

    #[test]
    fn completion_without_restart_stays_stopped() {
        let (mut timer, log) = timer_with_log();
        timer.start(1, false).unwrap();
        for _ in 0..60 {
            timer.tick();
        }

        assert!(!timer.is_running());
        assert_eq!(log.lock().unwrap().scheduled_ids().len(), 1);
    }

    #[test]
    fn five_minute_cycle_boundary() {
        let (mut timer, log) = timer_with_log();
        timer.start(5, false).unwrap();

        for _ in 0..299 {
            timer.tick();
        }
        assert_eq!(timer.remaining_secs(), 1);
        assert!(timer.is_running());

        timer.tick();
        assert_eq!(timer.remaining_secs(), 0);
        assert!(!timer.is_running());
        let log = log.lock().unwrap();
        assert_eq!(log.completions(), 1);
        assert_eq!(log.released(), 1);
        assert_eq!(log.cancelled_ids(), log.scheduled_ids());
    }

    #[test]
    fn manual_stop_cancels_pending_notification() {
        let (mut timer, log) = timer_with_log();
        timer.start(10, true).unwrap();
        for _ in 0..3 {
            timer.tick();
        }
        timer.stop();

        assert_eq!(timer.remaining_secs(), 0);
        assert!(!timer.is_running());
        let log = log.lock().unwrap();
        assert_eq!(log.cancelled_ids(), log.scheduled_ids());
        assert_eq!(log.released(), 1);
        assert_eq!(log.completions(), 0);
    }

    #[test]
    fn zero_duration_is_rejected() {
        let (mut timer, log) = timer_with_log();
        let err = timer.start(0, true).unwrap_err();

        assert!(matches!(err, ValidationError::InvalidValue { .. }));
        assert!(!timer.is_running());
        assert_eq!(timer.remaining_secs(), 0);
        assert_eq!(log.lock().unwrap().acquired(), 0);
    }

    #[test]
    fn zero_duration_leaves_running_cycle_untouched() {
        let (mut timer, _log) = timer_with_log();
        timer.start(10, false).unwrap();
        timer.tick();

        assert!(timer.start(0, false).is_err());
        assert!(timer.is_running());
        assert_eq!(timer.remaining_secs(), 599);
    }

    #[test]
    fn collaborator_failures_do_not_stop_countdown() {
        let (mut timer, log) = failing_timer_with_log();
        timer.start(1, false).unwrap();
        assert!(timer.is_running());

        for _ in 0..60 {
            timer.tick();
        }

        let log = log.lock().unwrap();
        assert_eq!(log.completions(), 1);
        // Nothing was held, so nothing gets released or cancelled.
        assert_eq!(log.released(), 0);
        assert!(log.cancelled_ids().is_empty());
    }

    #[test]
    fn completion_cleanup_precedes_callback_and_restart() {
        let (mut timer, log) = timer_with_log();
        timer.start(1, true).unwrap();
        for _ in 0..60 {
            timer.tick();
        }

        let log = log.lock().unwrap();
        let kinds: Vec<&'static str> = log
            .entries
            .iter()
            .map(|call| match call {
                Call::AuthorizationRequested => "auth",
                Call::Scheduled { .. } => "schedule",
                Call::Cancelled(_) => "cancel",
                Call::GrantAcquired(_) => "acquire",
                Call::GrantReleased(_) => "release",
                Call::Completed => "complete",
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                "acquire", "schedule", // first cycle
                "release", "cancel", "complete", // stop cleanup, then callback
                "acquire", "schedule", // auto-restart
            ]
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Start(u32),
            Tick,
            Stop,
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (1u32..=3).prop_map(Op::Start),
                Just(Op::Tick),
                Just(Op::Stop),
            ]
        }

        proptest! {
            #[test]
            fn remaining_stays_within_bounds(ops in proptest::collection::vec(op(), 1..200)) {
                let (mut timer, _log) = timer_with_log();
                for op in ops {
                    match op {
                        Op::Start(min) => {
                            timer.start(min, true).unwrap();
                        }
                        Op::Tick => {
                            timer.tick();
                        }
                        Op::Stop => timer.stop(),
                    }
                    prop_assert!(timer.remaining_secs() <= timer.duration_secs());
                    if !timer.is_running() {
                        prop_assert_eq!(timer.remaining_secs(), 0);
                    }
                }
            }
        }
    }
}
