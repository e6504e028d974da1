//! SQLite-backed project store.
//!
//! Persists:
//! - Project records (title, content, timer interval)
//! - Per-project countdown snapshots written by the owning session
//! - A key-value store for application state

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{CoreError, DatabaseError};
use crate::project::Project;

use super::data_dir;

/// SQLite database for project records.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/easenotes/easenotes.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("easenotes.db");
        let conn = Connection::open(&path)
            .map_err(|source| DatabaseError::OpenFailed { path, source })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|source| DatabaseError::OpenFailed { path: ":memory:".into(), source })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS projects (
                    id                 TEXT PRIMARY KEY,
                    title              TEXT NOT NULL,
                    content            TEXT NOT NULL DEFAULT '',
                    created_at         TEXT NOT NULL,
                    timer_interval_min INTEGER,
                    is_timer_active    INTEGER NOT NULL DEFAULT 0,
                    remaining_secs     INTEGER
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_projects_created_at ON projects(created_at);",
            )
            .map_err(|err| DatabaseError::MigrationFailed(err.to_string()))
    }

    // ── Projects ─────────────────────────────────────────────────────

    pub fn create_project(&self, project: &Project) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO projects (id, title, content, created_at, timer_interval_min,
                                   is_timer_active, remaining_secs)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                project.id,
                project.title,
                project.content,
                project.created_at.to_rfc3339(),
                project.timer_interval_min,
                project.is_timer_active,
                project.remaining_secs,
            ],
        )?;
        Ok(())
    }

    /// All projects, newest first.
    pub fn list_projects(&self) -> Result<Vec<Project>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, content, created_at, timer_interval_min,
                    is_timer_active, remaining_secs
             FROM projects ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map([], row_to_project)?;
        let mut projects = Vec::new();
        for row in rows {
            projects.push(row?);
        }
        Ok(projects)
    }

    pub fn get_project(&self, id: &str) -> Result<Project, DatabaseError> {
        self.conn
            .query_row(
                "SELECT id, title, content, created_at, timer_interval_min,
                        is_timer_active, remaining_secs
                 FROM projects WHERE id = ?1",
                params![id],
                row_to_project,
            )
            .optional()?
            .ok_or_else(|| DatabaseError::ProjectNotFound(id.to_string()))
    }

    pub fn update_project(&self, project: &Project) -> Result<(), DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE projects
             SET title = ?2, content = ?3, timer_interval_min = ?4,
                 is_timer_active = ?5, remaining_secs = ?6
             WHERE id = ?1",
            params![
                project.id,
                project.title,
                project.content,
                project.timer_interval_min,
                project.is_timer_active,
                project.remaining_secs,
            ],
        )?;
        if changed == 0 {
            return Err(DatabaseError::ProjectNotFound(project.id.clone()));
        }
        Ok(())
    }

    pub fn delete_project(&self, id: &str) -> Result<(), DatabaseError> {
        let changed = self
            .conn
            .execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(DatabaseError::ProjectNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Persist the countdown snapshot onto a project record. The timer
    /// component itself persists nothing; the owning session calls this.
    pub fn save_timer_snapshot(
        &self,
        id: &str,
        is_active: bool,
        remaining_secs: Option<u32>,
    ) -> Result<(), DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE projects SET is_timer_active = ?2, remaining_secs = ?3 WHERE id = ?1",
            params![id, is_active, remaining_secs],
        )?;
        if changed == 0 {
            return Err(DatabaseError::ProjectNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Clear stale active-timer flags on every project. Returns how many
    /// rows were touched.
    pub fn clear_timer_flags(&self) -> Result<usize, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE projects SET is_timer_active = 0, remaining_secs = NULL
             WHERE is_timer_active != 0 OR remaining_secs IS NOT NULL",
            [],
        )?;
        Ok(changed)
    }

    // ── Key-value store ──────────────────────────────────────────────

    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

fn row_to_project(row: &rusqlite::Row<'_>) -> rusqlite::Result<Project> {
    let created_raw: String = row.get(3)?;
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(err))
        })?;
    Ok(Project {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        created_at,
        timer_interval_min: row.get(4)?,
        is_timer_active: row.get(5)?,
        remaining_secs: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_project() -> Project {
        let mut p = Project::new("Portfolio Website", "Showcase site for design work.");
        p.timer_interval_min = Some(25);
        p
    }

    #[test]
    fn create_and_get_roundtrip() {
        let db = Database::open_memory().unwrap();
        let project = sample_project();
        db.create_project(&project).unwrap();

        let loaded = db.get_project(&project.id).unwrap();
        assert_eq!(loaded.title, project.title);
        assert_eq!(loaded.content, project.content);
        assert_eq!(loaded.timer_interval_min, Some(25));
        assert!(!loaded.is_timer_active);
        assert_eq!(loaded.created_at.timestamp(), project.created_at.timestamp());
    }

    #[test]
    fn list_returns_newest_first() {
        let db = Database::open_memory().unwrap();
        let mut older = Project::new("Older", "");
        older.created_at = older.created_at - chrono::Duration::hours(1);
        let newer = Project::new("Newer", "");
        db.create_project(&older).unwrap();
        db.create_project(&newer).unwrap();

        let projects = db.list_projects().unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].title, "Newer");
        assert_eq!(projects[1].title, "Older");
    }

    #[test]
    fn update_changes_fields() {
        let db = Database::open_memory().unwrap();
        let mut project = sample_project();
        db.create_project(&project).unwrap();

        project.title = "Renamed".to_string();
        project.timer_interval_min = None;
        db.update_project(&project).unwrap();

        let loaded = db.get_project(&project.id).unwrap();
        assert_eq!(loaded.title, "Renamed");
        assert!(loaded.timer_interval_min.is_none());
    }

    #[test]
    fn delete_removes_row() {
        let db = Database::open_memory().unwrap();
        let project = sample_project();
        db.create_project(&project).unwrap();
        db.delete_project(&project.id).unwrap();

        assert!(matches!(
            db.get_project(&project.id),
            Err(DatabaseError::ProjectNotFound(_))
        ));
    }

    #[test]
    fn missing_project_is_reported() {
        let db = Database::open_memory().unwrap();
        assert!(matches!(
            db.get_project("no-such-id"),
            Err(DatabaseError::ProjectNotFound(_))
        ));
        assert!(db.delete_project("no-such-id").is_err());
    }

    #[test]
    fn timer_snapshot_updates_flags() {
        let db = Database::open_memory().unwrap();
        let project = sample_project();
        db.create_project(&project).unwrap();

        db.save_timer_snapshot(&project.id, true, Some(1200)).unwrap();
        let loaded = db.get_project(&project.id).unwrap();
        assert!(loaded.is_timer_active);
        assert_eq!(loaded.remaining_secs, Some(1200));

        db.save_timer_snapshot(&project.id, false, None).unwrap();
        let loaded = db.get_project(&project.id).unwrap();
        assert!(!loaded.is_timer_active);
        assert!(loaded.remaining_secs.is_none());
    }

    #[test]
    fn clear_timer_flags_touches_only_active_rows() {
        let db = Database::open_memory().unwrap();
        let active = sample_project();
        let idle = Project::new("Idle", "");
        db.create_project(&active).unwrap();
        db.create_project(&idle).unwrap();
        db.save_timer_snapshot(&active.id, true, Some(90)).unwrap();

        assert_eq!(db.clear_timer_flags().unwrap(), 1);
        assert!(!db.get_project(&active.id).unwrap().is_timer_active);
        assert_eq!(db.clear_timer_flags().unwrap(), 0);
    }

    #[test]
    fn kv_roundtrip_and_delete() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("countdown_state").unwrap().is_none());

        db.kv_set("countdown_state", "{}").unwrap();
        db.kv_set("countdown_state", "{\"running\":false}").unwrap();
        assert_eq!(
            db.kv_get("countdown_state").unwrap().as_deref(),
            Some("{\"running\":false}")
        );

        db.kv_delete("countdown_state").unwrap();
        assert!(db.kv_get("countdown_state").unwrap().is_none());
    }
}
