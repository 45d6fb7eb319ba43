// ==========================================
// Si-Eligible - grade repository
// ==========================================

use crate::domain::student::Grade;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

pub struct GradeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl GradeRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Insert or replace the score of (student, subject, semester), returns grade_id
    pub fn upsert(
        &self,
        student_id: i64,
        subject_id: i64,
        semester: i32,
        score: f64,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let grade_id = conn.query_row(
            r#"
            INSERT INTO grade (student_id, subject_id, semester, score)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(student_id, subject_id, semester) DO UPDATE SET score = excluded.score
            RETURNING grade_id
            "#,
            params![student_id, subject_id, semester, score],
            |row| row.get(0),
        )?;
        Ok(grade_id)
    }

    pub fn find_by_id(&self, grade_id: i64) -> RepositoryResult<Option<Grade>> {
        let conn = self.get_conn()?;
        let grade = conn
            .query_row(
                "SELECT grade_id, student_id, subject_id, semester, score FROM grade WHERE grade_id = ?1",
                params![grade_id],
                map_row,
            )
            .optional()?;
        Ok(grade)
    }

    pub fn list_by_student(&self, student_id: i64) -> RepositoryResult<Vec<Grade>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT grade_id, student_id, subject_id, semester, score
            FROM grade
            WHERE student_id = ?1
            ORDER BY semester ASC, subject_id ASC
            "#,
        )?;
        let grades = stmt
            .query_map(params![student_id], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(grades)
    }

    /// All grades, ordered by student (used by the average recalculation)
    pub fn list_all(&self) -> RepositoryResult<Vec<Grade>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT grade_id, student_id, subject_id, semester, score
            FROM grade
            ORDER BY student_id ASC, semester ASC, subject_id ASC
            "#,
        )?;
        let grades = stmt
            .query_map([], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(grades)
    }
}

fn map_row(row: &Row) -> SqliteResult<Grade> {
    Ok(Grade {
        grade_id: row.get(0)?,
        student_id: row.get(1)?,
        subject_id: row.get(2)?,
        semester: row.get(3)?,
        score: row.get(4)?,
    })
}
