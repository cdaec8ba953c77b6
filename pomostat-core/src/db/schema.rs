//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: Initial schema
    r#"
    -- ============================================
    -- Owned records (mutable)
    -- ============================================

    CREATE TABLE IF NOT EXISTS categories (
        id               TEXT PRIMARY KEY,
        subject_id       INTEGER NOT NULL,
        display_name     TEXT NOT NULL,
        display_color    TEXT,
        created_at       TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS tasks (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        category_id      TEXT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
        name             TEXT NOT NULL,
        status           TEXT NOT NULL DEFAULT 'open',
        created_at       TEXT NOT NULL
    );

    -- ============================================
    -- Event log (append-only)
    -- ============================================

    -- category_id is not a foreign key: history outlives the category
    CREATE TABLE IF NOT EXISTS task_completions (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        subject_id       INTEGER NOT NULL,
        category_id      TEXT NOT NULL,
        label            TEXT NOT NULL,
        completed_at     TEXT
    );

    CREATE TABLE IF NOT EXISTS focus_sessions (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        subject_id       INTEGER NOT NULL,
        mode             TEXT NOT NULL,
        duration_seconds INTEGER NOT NULL,
        task_id          INTEGER,
        completed_at     TEXT
    );
    "#,
    // Version 2: Per-subject lookup indexes
    r#"
    CREATE INDEX IF NOT EXISTS idx_categories_subject ON categories(subject_id);
    CREATE INDEX IF NOT EXISTS idx_tasks_category ON tasks(category_id, status);
    CREATE INDEX IF NOT EXISTS idx_completions_subject ON task_completions(subject_id);
    CREATE INDEX IF NOT EXISTS idx_focus_sessions_subject ON focus_sessions(subject_id, mode);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}
