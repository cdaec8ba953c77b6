//! Database repository layer
//!
//! Provides the append-only event writers, the owned-record writers used by
//! the CLI, and the read side consumed by the statistics engine.

use crate::analytics::normalize::parse_stored_instant;
use crate::analytics::EventSource;
use crate::error::{Error, Result};
use crate::types::*;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;

/// Database handle with connection pooling (single connection for now)
pub struct Database {
    conn: Mutex<Connection>,
}

/// Parse a stored timestamp, logging and dropping values that don't parse.
fn stored_instant(table: &str, row_id: i64, raw: Option<String>) -> Option<StoredInstant> {
    let raw = raw?;
    match parse_stored_instant(&raw) {
        Ok(instant) => Some(instant),
        Err(err) => {
            tracing::warn!(table, row_id, error = %err, "skipping event with malformed timestamp");
            None
        }
    }
}

fn parse_column<T: std::str::FromStr<Err = String>>(idx: usize, raw: &str) -> rusqlite::Result<T> {
    raw.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            Box::new(Error::Config(e)),
        )
    })
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        super::schema::run_migrations(&conn)
    }

    // ============================================
    // Category operations
    // ============================================

    /// Insert or update a category
    pub fn upsert_category(&self, category: &Category) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO categories (id, subject_id, display_name, display_color, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                display_name = excluded.display_name,
                display_color = excluded.display_color
            "#,
            params![
                category.id,
                category.subject_id.0,
                category.display_name,
                category.display_color,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get a category by ID
    pub fn get_category(&self, id: &str) -> Result<Option<Category>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, subject_id, display_name, display_color FROM categories WHERE id = ?",
            [id],
            Self::row_to_category,
        )
        .optional()
        .map_err(Error::from)
    }

    fn row_to_category(row: &Row) -> rusqlite::Result<Category> {
        Ok(Category {
            id: row.get("id")?,
            subject_id: SubjectId(row.get("subject_id")?),
            display_name: row.get("display_name")?,
            display_color: row.get("display_color")?,
        })
    }

    // ============================================
    // Task operations
    // ============================================

    /// Insert an open task under `category_id`, returning its ID
    pub fn insert_task(&self, category_id: &str, name: &str) -> Result<TaskId> {
        let conn = self.conn.lock().unwrap();
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM categories WHERE id = ?)",
            [category_id],
            |r| r.get(0),
        )?;
        if !exists {
            return Err(Error::NotFound(format!("category {}", category_id)));
        }

        conn.execute(
            "INSERT INTO tasks (category_id, name, status, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                category_id,
                name,
                TaskStatus::Open.as_str(),
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Get a task by ID
    pub fn get_task(&self, id: TaskId) -> Result<Option<Task>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, category_id, name, status FROM tasks WHERE id = ?",
            [id],
            Self::row_to_task,
        )
        .optional()
        .map_err(Error::from)
    }

    fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
        let status: String = row.get("status")?;
        Ok(Task {
            id: row.get("id")?,
            category_id: row.get("category_id")?,
            name: row.get("name")?,
            status: parse_column(3, &status)?,
        })
    }

    /// Update a task's status
    pub fn set_task_status(&self, id: TaskId, status: TaskStatus) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE tasks SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("task {}", id)));
        }
        Ok(())
    }

    /// Subject that owns a task through its category, or `None` if the task
    /// does not exist.
    pub fn task_owner(&self, id: TaskId) -> Result<Option<SubjectId>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            r#"
            SELECT c.subject_id
            FROM tasks t
            JOIN categories c ON c.id = t.category_id
            WHERE t.id = ?
            "#,
            [id],
            |r| r.get(0).map(SubjectId),
        )
        .optional()
        .map_err(Error::from)
    }

    /// Mark a task done and append its completion event in one transaction.
    ///
    /// Only tasks in one of `subject`'s categories are visible; anything else
    /// is [`Error::NotFound`]. A task that is already done yields
    /// [`Error::AlreadyCompleted`] and records nothing.
    ///
    /// The event carries the task's category and name as of now, so it stays
    /// attributable after the task is deleted.
    pub fn complete_task(
        &self,
        subject: SubjectId,
        id: TaskId,
        at: StoredInstant,
    ) -> Result<CompletionEvent> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let task = tx
            .query_row(
                r#"
                SELECT t.id, t.category_id, t.name, t.status
                FROM tasks t
                JOIN categories c ON c.id = t.category_id
                WHERE t.id = ?1 AND c.subject_id = ?2
                "#,
                params![id, subject.0],
                Self::row_to_task,
            )
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("task {} for subject {}", id, subject)))?;

        if task.status == TaskStatus::Done {
            return Err(Error::AlreadyCompleted(id));
        }

        tx.execute(
            "UPDATE tasks SET status = ?1 WHERE id = ?2",
            params![TaskStatus::Done.as_str(), id],
        )?;

        let event = CompletionEvent {
            subject_id: subject,
            category_id: task.category_id,
            label: task.name,
            completed_at: Some(at),
        };
        Self::insert_completion(&tx, &event)?;
        tx.commit()?;

        tracing::debug!(task_id = id, %subject, "task completed");
        Ok(event)
    }

    // ============================================
    // Event log operations
    // ============================================

    /// Append a completion event, returning its row ID
    pub fn record_completion(&self, event: &CompletionEvent) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        Self::insert_completion(&conn, event)
    }

    fn insert_completion(conn: &Connection, event: &CompletionEvent) -> Result<i64> {
        conn.execute(
            r#"
            INSERT INTO task_completions (subject_id, category_id, label, completed_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                event.subject_id.0,
                event.category_id,
                event.label,
                event.completed_at.as_ref().map(|t| t.to_string()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Append a timer session of any mode, returning its row ID
    pub fn record_focus_session(&self, session: &FocusSessionEvent) -> Result<i64> {
        if session.duration_seconds < 0 {
            return Err(Error::MalformedEvent {
                value: session.duration_seconds.to_string(),
                reason: "session duration cannot be negative".to_string(),
            });
        }

        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO focus_sessions (subject_id, mode, duration_seconds, task_id, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                session.subject_id.0,
                session.mode.as_str(),
                session.duration_seconds,
                session.task_id,
                session.completed_at.as_ref().map(|t| t.to_string()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn row_to_completion(row: &Row) -> rusqlite::Result<CompletionEvent> {
        let row_id: i64 = row.get("id")?;
        Ok(CompletionEvent {
            subject_id: SubjectId(row.get("subject_id")?),
            category_id: row.get("category_id")?,
            label: row.get("label")?,
            completed_at: stored_instant("task_completions", row_id, row.get("completed_at")?),
        })
    }

    fn row_to_focus_session(row: &Row) -> rusqlite::Result<FocusSessionEvent> {
        let row_id: i64 = row.get("id")?;
        let mode: String = row.get("mode")?;
        Ok(FocusSessionEvent {
            subject_id: SubjectId(row.get("subject_id")?),
            mode: parse_column(2, &mode)?,
            duration_seconds: row.get("duration_seconds")?,
            task_id: row.get("task_id")?,
            completed_at: stored_instant("focus_sessions", row_id, row.get("completed_at")?),
        })
    }
}

impl EventSource for Database {
    fn list_completions(&self, subject: SubjectId) -> Result<Vec<CompletionEvent>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT id, subject_id, category_id, label, completed_at
            FROM task_completions
            WHERE subject_id = ?
            ORDER BY id
            "#,
        )?;
        let events = stmt
            .query_map([subject.0], Self::row_to_completion)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(events)
    }

    fn list_focus_sessions(&self, subject: SubjectId) -> Result<Vec<FocusSessionEvent>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT id, subject_id, mode, duration_seconds, task_id, completed_at
            FROM focus_sessions
            WHERE subject_id = ?1 AND mode = ?2
            ORDER BY id
            "#,
        )?;
        let sessions = stmt
            .query_map(
                params![subject.0, TimerMode::Focus.as_str()],
                Self::row_to_focus_session,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sessions)
    }

    fn list_categories(&self, subject: SubjectId) -> Result<Vec<Category>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT id, subject_id, display_name, display_color
            FROM categories
            WHERE subject_id = ?
            ORDER BY id
            "#,
        )?;
        let categories = stmt
            .query_map([subject.0], Self::row_to_category)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(categories)
    }

    fn outstanding_task_count(&self, subject: SubjectId) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row(
            r#"
            SELECT COUNT(*)
            FROM tasks t
            JOIN categories c ON c.id = t.category_id
            WHERE c.subject_id = ?1 AND t.status != ?2
            "#,
            params![subject.0, TaskStatus::Done.as_str()],
            |r| r.get(0),
        )?;
        Ok(count)
    }

    fn resolve_task_category(&self, task_id: TaskId) -> Result<Option<CategoryId>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT category_id FROM tasks WHERE id = ?",
            [task_id],
            |r| r.get(0),
        )
        .optional()
        .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn category(id: &str, subject: i64) -> Category {
        Category {
            id: id.to_string(),
            subject_id: SubjectId(subject),
            display_name: format!("Project {}", id),
            display_color: Some("#22c55e".to_string()),
        }
    }

    fn at(raw: &str) -> StoredInstant {
        parse_stored_instant(raw).unwrap()
    }

    #[test]
    fn test_upsert_category_updates_display_fields() {
        let db = test_db();
        db.upsert_category(&category("p1", 1)).unwrap();

        let mut renamed = category("p1", 1);
        renamed.display_name = "Thesis".to_string();
        renamed.display_color = None;
        db.upsert_category(&renamed).unwrap();

        let stored = db.get_category("p1").unwrap().unwrap();
        assert_eq!(stored, renamed);
        assert_eq!(db.list_categories(SubjectId(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_insert_task_requires_category() {
        let db = test_db();
        let err = db.insert_task("missing", "write intro").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        db.upsert_category(&category("p1", 1)).unwrap();
        let id = db.insert_task("p1", "write intro").unwrap();
        let task = db.get_task(id).unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Open);
        assert_eq!(db.resolve_task_category(id).unwrap().as_deref(), Some("p1"));
        assert_eq!(db.resolve_task_category(id + 100).unwrap(), None);
    }

    #[test]
    fn test_set_task_status() {
        let db = test_db();
        db.upsert_category(&category("p1", 1)).unwrap();
        let id = db.insert_task("p1", "edit").unwrap();

        db.set_task_status(id, TaskStatus::Done).unwrap();
        assert_eq!(db.get_task(id).unwrap().unwrap().status, TaskStatus::Done);
        assert!(matches!(
            db.set_task_status(999, TaskStatus::Done),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_complete_task_appends_event() {
        let db = test_db();
        db.upsert_category(&category("p1", 1)).unwrap();
        let id = db.insert_task("p1", "edit chapter 2").unwrap();
        db.insert_task("p1", "still open").unwrap();

        let event = db
            .complete_task(SubjectId(1), id, at("2024-03-12T10:00:00Z"))
            .unwrap();
        assert_eq!(event.category_id, "p1");
        assert_eq!(event.label, "edit chapter 2");

        let completions = db.list_completions(SubjectId(1)).unwrap();
        assert_eq!(completions, vec![event]);
        assert_eq!(db.outstanding_task_count(SubjectId(1)).unwrap(), 1);

        assert!(matches!(
            db.complete_task(SubjectId(1), 999, at("2024-03-12T10:00:00Z")),
            Err(Error::NotFound(_))
        ));
        assert_eq!(db.list_completions(SubjectId(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_complete_task_only_once() {
        let db = test_db();
        db.upsert_category(&category("p1", 1)).unwrap();
        let id = db.insert_task("p1", "review").unwrap();

        db.complete_task(SubjectId(1), id, at("2024-03-12T10:00:00Z"))
            .unwrap();
        let err = db
            .complete_task(SubjectId(1), id, at("2024-03-13T10:00:00Z"))
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyCompleted(task) if task == id));
        assert_eq!(db.list_completions(SubjectId(1)).unwrap().len(), 1);

        // A task marked done directly cannot be completed afterwards either
        let other = db.insert_task("p1", "closed by hand").unwrap();
        db.set_task_status(other, TaskStatus::Done).unwrap();
        assert!(matches!(
            db.complete_task(SubjectId(1), other, at("2024-03-13T10:00:00Z")),
            Err(Error::AlreadyCompleted(_))
        ));
        assert_eq!(db.list_completions(SubjectId(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_complete_task_rejects_foreign_subject() {
        let db = test_db();
        db.upsert_category(&category("p1", 1)).unwrap();
        let id = db.insert_task("p1", "alice only").unwrap();

        let err = db
            .complete_task(SubjectId(2), id, at("2024-03-12T10:00:00Z"))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(db.list_completions(SubjectId(2)).unwrap().is_empty());
        assert_eq!(db.get_task(id).unwrap().unwrap().status, TaskStatus::Open);
    }

    #[test]
    fn test_task_owner() {
        let db = test_db();
        db.upsert_category(&category("p1", 1)).unwrap();
        db.upsert_category(&category("p2", 2)).unwrap();
        let alice = db.insert_task("p1", "a").unwrap();
        let bob = db.insert_task("p2", "b").unwrap();

        assert_eq!(db.task_owner(alice).unwrap(), Some(SubjectId(1)));
        assert_eq!(db.task_owner(bob).unwrap(), Some(SubjectId(2)));
        assert_eq!(db.task_owner(bob + 100).unwrap(), None);
    }

    #[test]
    fn test_completions_are_scoped_by_subject() {
        let db = test_db();
        for subject in [1, 2, 2] {
            db.record_completion(&CompletionEvent {
                subject_id: SubjectId(subject),
                category_id: "p1".to_string(),
                label: "task".to_string(),
                completed_at: Some(at("2024-03-12T10:00:00Z")),
            })
            .unwrap();
        }
        assert_eq!(db.list_completions(SubjectId(1)).unwrap().len(), 1);
        assert_eq!(db.list_completions(SubjectId(2)).unwrap().len(), 2);
        assert!(db.list_completions(SubjectId(3)).unwrap().is_empty());
    }

    #[test]
    fn test_timestamps_preserve_awareness() {
        let db = test_db();
        for raw in ["2024-03-12T23:30:00-05:00", "2024-03-12 23:30:00"] {
            db.record_completion(&CompletionEvent {
                subject_id: SubjectId(1),
                category_id: "p1".to_string(),
                label: raw.to_string(),
                completed_at: Some(at(raw)),
            })
            .unwrap();
        }

        let events = db.list_completions(SubjectId(1)).unwrap();
        let aware = events[0].completed_at.as_ref().unwrap();
        let naive = events[1].completed_at.as_ref().unwrap();
        assert!(aware.is_aware());
        assert!(!naive.is_aware());
        assert_eq!(aware.canonical_date().to_string(), "2024-03-13");
        assert_eq!(naive.canonical_date().to_string(), "2024-03-12");
    }

    #[test]
    fn test_malformed_timestamp_is_dropped() {
        let db = test_db();
        {
            let conn = db.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO task_completions (subject_id, category_id, label, completed_at)
                 VALUES (1, 'p1', 'bad', 'yesterday-ish')",
                [],
            )
            .unwrap();
        }

        let events = db.list_completions(SubjectId(1)).unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].completed_at.is_none());
    }

    #[test]
    fn test_focus_sessions_exclude_breaks() {
        let db = test_db();
        for (mode, secs) in [
            (TimerMode::Focus, 1500),
            (TimerMode::ShortBreak, 300),
            (TimerMode::LongBreak, 900),
        ] {
            db.record_focus_session(&FocusSessionEvent {
                subject_id: SubjectId(1),
                mode,
                duration_seconds: secs,
                task_id: None,
                completed_at: Some(at("2024-03-12T10:00:00Z")),
            })
            .unwrap();
        }

        let sessions = db.list_focus_sessions(SubjectId(1)).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].mode, TimerMode::Focus);
        assert_eq!(sessions[0].duration_seconds, 1500);
    }

    #[test]
    fn test_negative_duration_rejected() {
        let db = test_db();
        let err = db
            .record_focus_session(&FocusSessionEvent {
                subject_id: SubjectId(1),
                mode: TimerMode::Focus,
                duration_seconds: -1,
                task_id: None,
                completed_at: None,
            })
            .unwrap_err();
        assert!(matches!(err, Error::MalformedEvent { .. }));
    }

    #[test]
    fn test_outstanding_count_spans_subject_categories() {
        let db = test_db();
        db.upsert_category(&category("p1", 1)).unwrap();
        db.upsert_category(&category("p2", 1)).unwrap();
        db.upsert_category(&category("other", 2)).unwrap();
        db.insert_task("p1", "a").unwrap();
        db.insert_task("p2", "b").unwrap();
        db.insert_task("other", "c").unwrap();

        assert_eq!(db.outstanding_task_count(SubjectId(1)).unwrap(), 2);
        assert_eq!(db.outstanding_task_count(SubjectId(2)).unwrap(), 1);
    }
}
