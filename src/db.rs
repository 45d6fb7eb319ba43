// ==========================================
// Si-Eligible - SQLite connection setup
// ==========================================
// - every Connection::open goes through here so PRAGMA behaviour is uniform
// - busy_timeout absorbs short write contention between admin actions
// - init_schema bootstraps an empty database (idempotent)
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// Default busy_timeout (ms)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// schema_version the code expects
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Apply per-connection PRAGMAs
///
/// foreign_keys and busy_timeout are both per-connection settings.
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// Open a SQLite connection with the shared configuration
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// Read schema_version (None when the table does not exist yet)
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// Create all tables (IF NOT EXISTS) and stamp schema_version
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS major (
            major_id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            quota_percentage REAL,
            total_students INTEGER NOT NULL DEFAULT 0,
            quota_count INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS student (
            student_id INTEGER PRIMARY KEY AUTOINCREMENT,
            nisn TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            major_id INTEGER REFERENCES major(major_id) ON DELETE SET NULL,
            average_score REAL,
            ranking INTEGER,
            is_eligible INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_student_major ON student(major_id);

        CREATE TABLE IF NOT EXISTS subject (
            subject_id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            is_priority INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS grade (
            grade_id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id INTEGER NOT NULL REFERENCES student(student_id) ON DELETE CASCADE,
            subject_id INTEGER NOT NULL REFERENCES subject(subject_id),
            semester INTEGER NOT NULL,
            score REAL NOT NULL,
            UNIQUE (student_id, subject_id, semester)
        );
        CREATE INDEX IF NOT EXISTS idx_grade_student ON grade(student_id);

        CREATE TABLE IF NOT EXISTS grade_dispute (
            dispute_id TEXT PRIMARY KEY,
            student_id INTEGER NOT NULL REFERENCES student(student_id) ON DELETE CASCADE,
            grade_id INTEGER NOT NULL REFERENCES grade(grade_id) ON DELETE CASCADE,
            original_score REAL NOT NULL,
            claimed_score REAL NOT NULL,
            reason TEXT NOT NULL,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL,
            created_by TEXT NOT NULL,
            resolved_at TEXT,
            resolved_by TEXT,
            resolution_note TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_grade_dispute_status ON grade_dispute(status);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_grade_dispute_one_open
            ON grade_dispute(grade_id) WHERE status = 'OPEN';

        CREATE TABLE IF NOT EXISTS action_log (
            action_id TEXT PRIMARY KEY,
            action_type TEXT NOT NULL,
            action_ts TEXT NOT NULL,
            actor TEXT NOT NULL,
            payload_json TEXT,
            detail TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_action_log_ts ON action_log(action_ts);

        CREATE TABLE IF NOT EXISTS ranking_run (
            run_id TEXT PRIMARY KEY,
            started_at TEXT NOT NULL,
            finished_at TEXT,
            status TEXT NOT NULL,
            atomicity TEXT NOT NULL,
            majors_processed INTEGER NOT NULL DEFAULT 0,
            students_ranked INTEGER NOT NULL DEFAULT 0,
            eligible_count INTEGER NOT NULL DEFAULT 0,
            config_snapshot_json TEXT,
            error_message TEXT,
            triggered_by TEXT NOT NULL
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}
