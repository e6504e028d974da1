//! Project records: a title plus free-text content, with an optional
//! repeating timer interval attached.
//!
//! `is_timer_active` and `remaining_secs` are the owning session's persisted
//! snapshot of the countdown -- the timer component itself persists nothing.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Repeating-timer interval in minutes, if the user attached one.
    pub timer_interval_min: Option<u32>,
    pub is_timer_active: bool,
    pub remaining_secs: Option<u32>,
}

impl Project {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            content: content.into(),
            created_at: Utc::now(),
            timer_interval_min: None,
            is_timer_active: false,
            remaining_secs: None,
        }
    }

    /// Sample records for a first run or demos.
    pub fn mock_data() -> Vec<Project> {
        let entry = |title: &str, content: &str, age_secs: i64, interval: Option<u32>| Project {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            content: content.to_string(),
            created_at: Utc::now() - Duration::seconds(age_secs),
            timer_interval_min: interval,
            is_timer_active: false,
            remaining_secs: None,
        };
        vec![
            entry(
                "Portfolio Website",
                "Personal site to showcase design and development work. Landing page \
                 and project grid are done; still need a contact form.",
                150_000,
                Some(25),
            ),
            entry(
                "Smart To-Do List",
                "Task manager experiment with priority tags and reminders. Next step: \
                 recurring tasks.",
                200_000,
                None,
            ),
            entry(
                "Climbing Logbook",
                "Log of climbing sessions, routes, and grades. Want per-route progress \
                 charts eventually.",
                250_000,
                None,
            ),
            entry(
                "Interactive Resume",
                "A resume that reads like a product page: skills, timeline, and selected \
                 projects with visuals.",
                300_000,
                Some(45),
            ),
            entry(
                "Digital Art Portfolio",
                "Curated illustration collection, organized by series and shared through \
                 an online gallery.",
                350_000,
                None,
            ),
        ]
    }
}
