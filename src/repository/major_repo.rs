// ==========================================
// Si-Eligible - major repository
// ==========================================
// total_students / quota_count are written by RankingRepository only
// ==========================================

use crate::domain::major::Major;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// MajorRepository
// ==========================================
pub struct MajorRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MajorRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Insert a major, returns the new major_id
    pub fn create(&self, major: &Major) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO major (code, name, quota_percentage, total_students, quota_count)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                major.code,
                major.name,
                major.quota_percentage,
                major.total_students,
                major.quota_count,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_by_id(&self, major_id: i64) -> RepositoryResult<Option<Major>> {
        let conn = self.get_conn()?;
        let major = conn
            .query_row(
                r#"
                SELECT major_id, code, name, quota_percentage, total_students, quota_count
                FROM major WHERE major_id = ?1
                "#,
                params![major_id],
                map_row,
            )
            .optional()?;
        Ok(major)
    }

    pub fn find_by_code(&self, code: &str) -> RepositoryResult<Option<Major>> {
        let conn = self.get_conn()?;
        let major = conn
            .query_row(
                r#"
                SELECT major_id, code, name, quota_percentage, total_students, quota_count
                FROM major WHERE code = ?1
                "#,
                params![code],
                map_row,
            )
            .optional()?;
        Ok(major)
    }

    /// All majors ordered by code (the ranking run processing order)
    pub fn list_all(&self) -> RepositoryResult<Vec<Major>> {
        let conn = self.get_conn()?;
        Ok(load_majors(&conn)?)
    }

    /// Set or clear the per-major quota override
    pub fn set_quota_override(&self, major_id: i64, quota_percentage: Option<f64>) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE major SET quota_percentage = ?1 WHERE major_id = ?2",
            params![quota_percentage, major_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Major".to_string(),
                id: major_id.to_string(),
            });
        }
        Ok(())
    }

}

/// All majors in processing order, on a caller-held connection
pub(crate) fn load_majors(conn: &Connection) -> SqliteResult<Vec<Major>> {
    let mut stmt = conn.prepare_cached(
        r#"
        SELECT major_id, code, name, quota_percentage, total_students, quota_count
        FROM major
        ORDER BY code ASC
        "#,
    )?;
    let majors = stmt
        .query_map([], map_row)?
        .collect::<SqliteResult<Vec<_>>>()?;
    Ok(majors)
}

fn map_row(row: &Row) -> SqliteResult<Major> {
    Ok(Major {
        major_id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        quota_percentage: row.get(3)?,
        total_students: row.get(4)?,
        quota_count: row.get(5)?,
    })
}
