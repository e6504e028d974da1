//! Countdown timer commands.
//!
//! `timer run` plays the role of the owning UI session: it builds the timer
//! with injected collaborators, drives it in the foreground, reads the
//! published state, and persists the per-project countdown snapshot the core
//! deliberately leaves to its caller.

use std::io::Write;
use std::sync::Arc;

use clap::Subcommand;
use easenotes_core::storage::{Config, Database};
use easenotes_core::timer::{CountdownDriver, CountdownTimer};
use easenotes_core::{Event, LogNotifier, NoopBackgroundExecution, NotificationScheduler};

const STATE_KEY: &str = "countdown_state";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run a countdown in the foreground until stopped (Ctrl-C)
    Run {
        /// Countdown length in minutes (defaults to the project's interval,
        /// then the configured default)
        minutes: Option<u32>,
        /// Project to log progress against
        #[arg(long)]
        project: Option<String>,
        /// Stop after a single cycle instead of restarting
        #[arg(long)]
        once: bool,
    },
    /// Print the last persisted countdown state as JSON
    Status,
    /// Clear persisted countdown state and stale project timer flags
    Reset,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TimerAction::Run { minutes, project, once } => run_countdown(minutes, project, once),
        TimerAction::Status => status(),
        TimerAction::Reset => reset(),
    }
}

fn run_countdown(
    minutes: Option<u32>,
    project_id: Option<String>,
    once: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load_or_default();

    let project = match &project_id {
        Some(id) => Some(db.get_project(id)?),
        None => None,
    };
    let minutes = minutes
        .or_else(|| project.as_ref().and_then(|p| p.timer_interval_min))
        .unwrap_or(config.timer.default_interval_min);
    let auto_restart = !once && config.timer.auto_restart;
    let alert = config.notifications.enabled;

    let notifier: Arc<dyn NotificationScheduler> = Arc::new(LogNotifier);
    if alert {
        notifier.request_authorization()?;
    }

    let mut timer = CountdownTimer::new(notifier, Arc::new(NoopBackgroundExecution));
    timer.on_complete(move || {
        if alert {
            // Terminal bell stands in for the platform alert in the
            // foreground session.
            print!("\x07");
            let _ = std::io::stdout().flush();
        }
    });

    tracing::debug!(minutes, auto_restart, project = project_id.as_deref(), "starting countdown");
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(drive(db, project_id, timer, minutes, auto_restart))
}

async fn drive(
    db: Database,
    project_id: Option<String>,
    timer: CountdownTimer,
    minutes: u32,
    auto_restart: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut driver = CountdownDriver::new(timer);
    let mut events = driver.start(minutes, auto_restart)?;

    loop {
        tokio::select! {
            maybe_event = events.recv() => {
                match maybe_event {
                    Some(event) => handle_event(&db, project_id.as_deref(), &event)?,
                    // Single cycle finished and the stream closed.
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                driver.stop();
                let snapshot = {
                    let timer = driver.timer();
                    let timer = timer.lock().map_err(|_| "countdown state lock poisoned")?;
                    timer.snapshot()
                };
                persist_snapshot(&db, project_id.as_deref(), &snapshot)?;
                println!();
                let stopped = Event::CountdownStopped { at: chrono::Utc::now() };
                println!("{}", serde_json::to_string_pretty(&stopped)?);
                break;
            }
        }
    }
    Ok(())
}

fn handle_event(
    db: &Database,
    project_id: Option<&str>,
    event: &Event,
) -> Result<(), Box<dyn std::error::Error>> {
    match event {
        Event::CountdownStarted { .. } => {
            println!("{}", serde_json::to_string_pretty(event)?);
        }
        Event::StateSnapshot { remaining_secs, duration_secs, .. } => {
            persist_snapshot(db, project_id, event)?;
            print!("\r  {remaining_secs:>6}s remaining of {duration_secs}s ");
            std::io::stdout().flush()?;
        }
        Event::CountdownCompleted { .. } => {
            println!();
            println!("{}", serde_json::to_string_pretty(event)?);
        }
        Event::CountdownStopped { .. } => {}
    }
    Ok(())
}

fn persist_snapshot(
    db: &Database,
    project_id: Option<&str>,
    event: &Event,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Event::StateSnapshot { running, remaining_secs, .. } = event {
        db.kv_set(STATE_KEY, &serde_json::to_string(event)?)?;
        if let Some(id) = project_id {
            let remaining = if *running {
                Some(u32::try_from(*remaining_secs).unwrap_or(u32::MAX))
            } else {
                None
            };
            db.save_timer_snapshot(id, *running, remaining)?;
        }
    }
    Ok(())
}

fn status() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let snapshot = match db.kv_get(STATE_KEY)? {
        Some(json) => serde_json::from_str::<Event>(&json)?,
        None => Event::StateSnapshot {
            running: false,
            remaining_secs: 0,
            duration_secs: 0,
            auto_restart: false,
            at: chrono::Utc::now(),
        },
    };
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

fn reset() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    db.kv_delete(STATE_KEY)?;
    let cleared = db.clear_timer_flags()?;
    println!("Cleared countdown state ({cleared} project timer flags reset)");
    Ok(())
}
