//! Database schema migrations for kairos.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Schema version after every migration below has run.
pub const CURRENT_VERSION: i32 = 4;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }
    if current_version < 3 {
        migrate_v3(conn)?;
    }
    if current_version < 4 {
        migrate_v4(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Current schema version, 0 for a fresh database.
pub fn schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: task table used by the SQLite task store.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS tasks (
            id          TEXT PRIMARY KEY,
            owner       TEXT NOT NULL,
            title       TEXT NOT NULL,
            priority    TEXT NOT NULL DEFAULT 'normal',
            due_date    TEXT,
            project     TEXT,
            status      TEXT NOT NULL DEFAULT 'open',
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_owner ON tasks(owner);",
    )?;
    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// Migration v2: per-user journal of work and break periods.
///
/// `ended_at` stays NULL while the period is still running.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS pomodoro_sessions (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            owner       TEXT NOT NULL,
            kind        TEXT NOT NULL,
            started_at  TEXT NOT NULL,
            ended_at    TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_pomodoro_sessions_owner_started
            ON pomodoro_sessions(owner, started_at);",
    )?;
    set_schema_version(&tx, 2)?;
    tx.commit()
}

/// Migration v3: completion timestamp on tasks.
///
/// Backfills `completed_at` from `created_at` for tasks already done.
fn migrate_v3(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch("ALTER TABLE tasks ADD COLUMN completed_at TEXT;")?;
    tx.execute(
        "UPDATE tasks SET completed_at = created_at
         WHERE status = 'done' AND completed_at IS NULL",
        [],
    )?;
    set_schema_version(&tx, 3)?;
    tx.commit()
}

/// Migration v4: task label on journal rows.
fn migrate_v4(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch("ALTER TABLE pomodoro_sessions ADD COLUMN label TEXT;")?;
    set_schema_version(&tx, 4)?;
    tx.commit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrate_from_scratch() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert_eq!(schema_version(&conn), CURRENT_VERSION);

        conn.execute(
            "INSERT INTO pomodoro_sessions (owner, kind, started_at, label)
             VALUES ('u', 'work', 'now', 'Essay')",
            [],
        )
        .unwrap();
        let stmt = conn
            .prepare("SELECT id, owner, title, priority, due_date, project, status, completed_at FROM tasks")
            .unwrap();
        drop(stmt);
    }

    #[test]
    fn migrate_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(schema_version(&conn), CURRENT_VERSION);
    }

    #[test]
    fn v3_database_gains_journal_labels() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema_version_table(&conn).unwrap();
        migrate_v1(&conn).unwrap();
        migrate_v2(&conn).unwrap();
        migrate_v3(&conn).unwrap();
        conn.execute(
            "INSERT INTO pomodoro_sessions (owner, kind, started_at) VALUES ('u', 'work', 'then')",
            [],
        )
        .unwrap();

        migrate(&conn).unwrap();
        assert_eq!(schema_version(&conn), 4);
        let label: Option<String> = conn
            .query_row("SELECT label FROM pomodoro_sessions", [], |row| row.get(0))
            .unwrap();
        assert!(label.is_none());
    }

    #[test]
    fn incremental_migration_backfills_completed_at() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema_version_table(&conn).unwrap();
        migrate_v1(&conn).unwrap();
        conn.execute(
            "INSERT INTO tasks (id, owner, title, status, created_at)
             VALUES ('t1', 'u', 'Done task', 'done', '2026-10-01T12:00:00Z'),
                    ('t2', 'u', 'Open task', 'open', '2026-10-01T12:00:00Z')",
            [],
        )
        .unwrap();
        assert_eq!(schema_version(&conn), 1);

        migrate(&conn).unwrap();
        assert_eq!(schema_version(&conn), CURRENT_VERSION);

        let done: Option<String> = conn
            .query_row("SELECT completed_at FROM tasks WHERE id = 't1'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(done.as_deref(), Some("2026-10-01T12:00:00Z"));
        let open: Option<String> = conn
            .query_row("SELECT completed_at FROM tasks WHERE id = 't2'", [], |row| row.get(0))
            .unwrap();
        assert!(open.is_none());
    }
}
