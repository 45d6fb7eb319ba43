// ==========================================
// Si-Eligible - grade dispute repository
// ==========================================
// Resolution writes (dispute close + grade + average) share one transaction
// At most one OPEN dispute per grade, enforced by a partial unique index
// ==========================================

use crate::domain::dispute::GradeDispute;
use crate::domain::types::DisputeStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{format_db_ts, parse_db_ts};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const DISPUTE_COLUMNS: &str = "dispute_id, student_id, grade_id, original_score, claimed_score, \
     reason, status, created_at, created_by, resolved_at, resolved_by, resolution_note";

/// Everything a resolution writes, computed by the caller
#[derive(Debug, Clone)]
pub struct DisputeResolution {
    pub dispute_id: String,
    pub status: DisputeStatus,
    pub resolved_at: NaiveDateTime,
    pub resolved_by: String,
    pub note: Option<String>,
    /// Set when the claim is accepted
    pub accepted: Option<AcceptedClaim>,
}

/// Grade rewrite of an accepted claim; the average is recomputed from stored grades
#[derive(Debug, Clone, Copy)]
pub struct AcceptedClaim {
    pub student_id: i64,
    pub grade_id: i64,
    pub score: f64,
}

pub struct GradeDisputeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl GradeDisputeRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, dispute: &GradeDispute) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO grade_dispute (
                dispute_id, student_id, grade_id, original_score, claimed_score,
                reason, status, created_at, created_by,
                resolved_at, resolved_by, resolution_note
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                dispute.dispute_id,
                dispute.student_id,
                dispute.grade_id,
                dispute.original_score,
                dispute.claimed_score,
                dispute.reason,
                dispute.status.to_string(),
                format_db_ts(&dispute.created_at),
                dispute.created_by,
                dispute.resolved_at.as_ref().map(format_db_ts),
                dispute.resolved_by,
                dispute.resolution_note,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, dispute_id: &str) -> RepositoryResult<Option<GradeDispute>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM grade_dispute WHERE dispute_id = ?1", DISPUTE_COLUMNS);
        let dispute = conn.query_row(&sql, params![dispute_id], map_row).optional()?;
        Ok(dispute)
    }

    /// Disputes, newest first, optionally filtered by status
    pub fn list(&self, status: Option<DisputeStatus>) -> RepositoryResult<Vec<GradeDispute>> {
        let conn = self.get_conn()?;
        let disputes = match status {
            Some(status) => {
                let sql = format!(
                    "SELECT {} FROM grade_dispute WHERE status = ?1 ORDER BY created_at DESC, rowid DESC",
                    DISPUTE_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![status.to_string()], map_row)?
                    .collect::<SqliteResult<Vec<_>>>()?;
                rows
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM grade_dispute ORDER BY created_at DESC, rowid DESC",
                    DISPUTE_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([], map_row)?
                    .collect::<SqliteResult<Vec<_>>>()?;
                rows
            }
        };
        Ok(disputes)
    }

    pub fn has_open_for_grade(&self, grade_id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM grade_dispute WHERE grade_id = ?1 AND status = 'OPEN'",
            params![grade_id],
            |row| row.get(0),
        )?;
        Ok(n > 0)
    }

    /// Close an OPEN dispute and apply its side effects atomically
    ///
    /// Fails with InvalidStateTransition when the dispute is no longer OPEN,
    /// in which case nothing is written.
    ///
    /// # Returns
    /// The student's recomputed average for an accepted claim, None otherwise
    pub fn apply_resolution(&self, resolution: &DisputeResolution) -> RepositoryResult<Option<f64>> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let affected = tx.execute(
            r#"
            UPDATE grade_dispute
            SET status = ?1, resolved_at = ?2, resolved_by = ?3, resolution_note = ?4
            WHERE dispute_id = ?5 AND status = 'OPEN'
            "#,
            params![
                resolution.status.to_string(),
                format_db_ts(&resolution.resolved_at),
                resolution.resolved_by,
                resolution.note,
                resolution.dispute_id,
            ],
        )?;

        if affected == 0 {
            let current: Option<String> = tx
                .query_row(
                    "SELECT status FROM grade_dispute WHERE dispute_id = ?1",
                    params![resolution.dispute_id],
                    |row| row.get(0),
                )
                .optional()?;
            return Err(match current {
                Some(from) => RepositoryError::InvalidStateTransition {
                    from,
                    to: resolution.status.to_string(),
                },
                None => RepositoryError::NotFound {
                    entity: "GradeDispute".to_string(),
                    id: resolution.dispute_id.clone(),
                },
            });
        }

        let new_average = match resolution.accepted {
            Some(claim) => {
                tx.execute(
                    "UPDATE grade SET score = ?1 WHERE grade_id = ?2",
                    params![claim.score, claim.grade_id],
                )?;
                tx.execute(
                    r#"
                    UPDATE student
                    SET average_score = (SELECT ROUND(AVG(score), 2) FROM grade WHERE student_id = ?1),
                        updated_at = datetime('now')
                    WHERE student_id = ?1
                    "#,
                    params![claim.student_id],
                )?;
                tx.query_row(
                    "SELECT average_score FROM student WHERE student_id = ?1",
                    params![claim.student_id],
                    |row| row.get::<_, Option<f64>>(0),
                )?
            }
            None => None,
        };

        tx.commit()?;
        Ok(new_average)
    }
}

fn map_row(row: &Row) -> SqliteResult<GradeDispute> {
    let status_raw: String = row.get(6)?;
    Ok(GradeDispute {
        dispute_id: row.get(0)?,
        student_id: row.get(1)?,
        grade_id: row.get(2)?,
        original_score: row.get(3)?,
        claimed_score: row.get(4)?,
        reason: row.get(5)?,
        status: DisputeStatus::from_db_str(&status_raw).unwrap_or(DisputeStatus::Open),
        created_at: parse_db_ts(&row.get::<_, String>(7)?),
        created_by: row.get(8)?,
        resolved_at: row.get::<_, Option<String>>(9)?.map(|s| parse_db_ts(&s)),
        resolved_by: row.get(10)?,
        resolution_note: row.get(11)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn setup() -> GradeDisputeRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO student (student_id, nisn, name, average_score) VALUES (1, '001', 'A', 10.0);
            INSERT INTO subject (subject_id, code, name) VALUES (1, 'MTK', 'Matematika'), (2, 'BIN', 'Bahasa');
            INSERT INTO grade (grade_id, student_id, subject_id, semester, score) VALUES
                (1, 1, 1, 1, 80.0),
                (2, 1, 2, 1, 60.0),
                (3, 1, 1, 2, 25.0);
            "#,
        )
        .unwrap();
        GradeDisputeRepository::new(Arc::new(Mutex::new(conn)))
    }

    fn open_dispute(id: &str, grade_id: i64, claimed_score: f64) -> GradeDispute {
        GradeDispute {
            dispute_id: id.to_string(),
            student_id: 1,
            grade_id,
            original_score: 0.0,
            claimed_score,
            reason: "recheck".to_string(),
            status: DisputeStatus::Open,
            created_at: Utc::now().naive_utc(),
            created_by: "siswa".to_string(),
            resolved_at: None,
            resolved_by: None,
            resolution_note: None,
        }
    }

    fn resolution(id: &str, status: DisputeStatus, accepted: Option<AcceptedClaim>) -> DisputeResolution {
        DisputeResolution {
            dispute_id: id.to_string(),
            status,
            resolved_at: Utc::now().naive_utc(),
            resolved_by: "admin".to_string(),
            note: None,
            accepted,
        }
    }

    fn query_f64(repo: &GradeDisputeRepository, sql: &str) -> Option<f64> {
        repo.get_conn().unwrap().query_row(sql, [], |row| row.get(0)).unwrap()
    }

    #[test]
    fn test_one_open_dispute_per_grade() {
        let repo = setup();
        repo.insert(&open_dispute("d1", 3, 95.0)).unwrap();

        // a second writer that skipped the pre-check still cannot open another one
        let err = repo.insert(&open_dispute("d2", 3, 90.0)).unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
        assert!(repo.has_open_for_grade(3).unwrap());

        repo.insert(&open_dispute("d3", 2, 70.0)).unwrap();

        repo.apply_resolution(&resolution("d1", DisputeStatus::Rejected, None))
            .unwrap();
        repo.insert(&open_dispute("d2", 3, 90.0)).unwrap();
        assert_eq!(repo.list(Some(DisputeStatus::Open)).unwrap().len(), 2);
    }

    #[test]
    fn test_accept_recomputes_average_from_stored_grades() {
        let repo = setup();
        repo.insert(&open_dispute("d1", 3, 95.0)).unwrap();

        // another grade changes after the dispute was read
        repo.get_conn()
            .unwrap()
            .execute("UPDATE grade SET score = 70.0 WHERE grade_id = 2", [])
            .unwrap();

        let claim = AcceptedClaim {
            student_id: 1,
            grade_id: 3,
            score: 95.0,
        };
        let new_average = repo
            .apply_resolution(&resolution("d1", DisputeStatus::Accepted, Some(claim)))
            .unwrap();

        // (80 + 70 + 95) / 3
        assert_eq!(new_average, Some(81.67));
        assert_eq!(
            query_f64(&repo, "SELECT average_score FROM student WHERE student_id = 1"),
            Some(81.67)
        );
        assert_eq!(query_f64(&repo, "SELECT score FROM grade WHERE grade_id = 3"), Some(95.0));
    }

    #[test]
    fn test_reject_and_stale_resolution_write_nothing() {
        let repo = setup();
        repo.insert(&open_dispute("d1", 3, 95.0)).unwrap();

        let new_average = repo
            .apply_resolution(&resolution("d1", DisputeStatus::Rejected, None))
            .unwrap();
        assert_eq!(new_average, None);

        let claim = AcceptedClaim {
            student_id: 1,
            grade_id: 3,
            score: 95.0,
        };
        let err = repo
            .apply_resolution(&resolution("d1", DisputeStatus::Accepted, Some(claim)))
            .unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::InvalidStateTransition { ref from, .. } if from == "REJECTED"
        ));
        assert_eq!(query_f64(&repo, "SELECT score FROM grade WHERE grade_id = 3"), Some(25.0));
        assert_eq!(
            query_f64(&repo, "SELECT average_score FROM student WHERE student_id = 1"),
            Some(10.0)
        );

        let err = repo
            .apply_resolution(&resolution("missing", DisputeStatus::Rejected, None))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }
}
