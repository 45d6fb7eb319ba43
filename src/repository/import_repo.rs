// ==========================================
// Si-Eligible - student / grade import persistence
// ==========================================
// One transaction per imported file
// Majors and subjects referenced by code are created on demand
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Transaction};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Cleaned student row, ready to persist
#[derive(Debug, Clone, PartialEq)]
pub struct StudentImportRow {
    pub nisn: String,
    pub name: String,
    pub major_code: Option<String>,
    pub average_score: Option<f64>,
}

/// Cleaned grade row, ready to persist
#[derive(Debug, Clone, PartialEq)]
pub struct GradeImportRow {
    pub nisn: String,
    pub subject_code: String,
    pub semester: i32,
    pub score: f64,
}

pub struct StudentImportRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StudentImportRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// NISNs already present, used to validate grade files before writing
    pub fn known_nisns(&self) -> RepositoryResult<HashSet<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT nisn FROM student")?;
        let nisns = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<HashSet<_>>>()?;
        Ok(nisns)
    }

    /// Upsert students by NISN
    ///
    /// An empty major or average_score keeps the stored one.
    pub fn import_students(&self, rows: &[StudentImportRow]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for row in rows {
            let major_id = match row.major_code.as_deref() {
                Some(code) => Some(ensure_major(&tx, code)?),
                None => None,
            };

            count += tx.execute(
                r#"
                INSERT INTO student (nisn, name, major_id, average_score, updated_at)
                VALUES (?1, ?2, ?3, ?4, datetime('now'))
                ON CONFLICT(nisn) DO UPDATE SET
                    name = excluded.name,
                    major_id = COALESCE(excluded.major_id, student.major_id),
                    average_score = COALESCE(excluded.average_score, student.average_score),
                    updated_at = excluded.updated_at
                "#,
                params![row.nisn, row.name, major_id, row.average_score],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }

    /// Upsert grades keyed by (student, subject, semester)
    pub fn import_grades(&self, rows: &[GradeImportRow]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for row in rows {
            let subject_id = ensure_subject(&tx, &row.subject_code)?;
            let student_id: i64 = tx
                .query_row(
                    "SELECT student_id FROM student WHERE nisn = ?1",
                    params![row.nisn],
                    |r| r.get(0),
                )
                .map_err(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                        entity: "Student".to_string(),
                        id: row.nisn.clone(),
                    },
                    other => other.into(),
                })?;

            count += tx.execute(
                r#"
                INSERT INTO grade (student_id, subject_id, semester, score)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(student_id, subject_id, semester) DO UPDATE SET score = excluded.score
                "#,
                params![student_id, subject_id, row.semester, row.score],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }
}

fn ensure_major(tx: &Transaction, code: &str) -> rusqlite::Result<i64> {
    tx.execute(
        "INSERT OR IGNORE INTO major (code, name) VALUES (?1, ?1)",
        params![code],
    )?;
    tx.query_row("SELECT major_id FROM major WHERE code = ?1", params![code], |row| row.get(0))
}

fn ensure_subject(tx: &Transaction, code: &str) -> rusqlite::Result<i64> {
    tx.execute(
        "INSERT OR IGNORE INTO subject (code, name, is_priority) VALUES (?1, ?1, 0)",
        params![code],
    )?;
    tx.query_row("SELECT subject_id FROM subject WHERE code = ?1", params![code], |row| row.get(0))
}
