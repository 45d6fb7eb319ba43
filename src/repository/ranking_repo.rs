// ==========================================
// Si-Eligible - ranking persistence
// ==========================================
// Only writer of major.total_students / major.quota_count
// and student.ranking / student.is_eligible
// ==========================================

use crate::domain::major::Major;
use crate::domain::ranking::{MajorRankingOutcome, RankingCandidate, RankingExportRow, RankingRun};
use crate::domain::types::{RunAtomicity, RunStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::major_repo::load_majors;
use crate::repository::student_repo::load_ranking_candidates;
use crate::repository::{format_db_ts, parse_db_ts};
use chrono::NaiveDateTime;
use rusqlite::{
    params, Connection, OptionalExtension, Result as SqliteResult, Row, Transaction,
    TransactionBehavior,
};
use std::sync::{Arc, Mutex};
use tracing::debug;

// ==========================================
// RankingRepository - ranking snapshot writes
// ==========================================
pub struct RankingRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RankingRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Read, rank and write every major inside one IMMEDIATE transaction
    ///
    /// `rank` turns a major and its current candidates into an outcome. The
    /// candidates are read under the same write lock the outcome is written
    /// with, so no other writer can move or add students in between. Students
    /// without a major lose their stale ranking in the same transaction. Any
    /// error rolls back every major.
    pub fn rank_whole_run<F, E>(&self, mut rank: F) -> Result<Vec<MajorRankingOutcome>, E>
    where
        F: FnMut(&Major, Vec<RankingCandidate>) -> Result<MajorRankingOutcome, E>,
        E: From<RepositoryError>,
    {
        let mut conn = self.get_conn()?;
        let tx = db(conn.transaction_with_behavior(TransactionBehavior::Immediate))?;

        db(clear_unassigned(&tx))?;
        let majors = db(load_majors(&tx))?;
        let mut outcomes = Vec::with_capacity(majors.len());
        for major in &majors {
            let candidates = db(load_ranking_candidates(&tx, major.major_id))?;
            let outcome = rank(major, candidates)?;
            db(write_major_outcome(&tx, &outcome))?;
            outcomes.push(outcome);
        }

        db(tx.commit())?;
        Ok(outcomes)
    }

    /// Read, rank and write one major inside its own IMMEDIATE transaction
    pub fn rank_major<F, E>(&self, major: &Major, rank: F) -> Result<MajorRankingOutcome, E>
    where
        F: FnOnce(&Major, Vec<RankingCandidate>) -> Result<MajorRankingOutcome, E>,
        E: From<RepositoryError>,
    {
        let mut conn = self.get_conn()?;
        let tx = db(conn.transaction_with_behavior(TransactionBehavior::Immediate))?;

        let candidates = db(load_ranking_candidates(&tx, major.major_id))?;
        let outcome = rank(major, candidates)?;
        db(write_major_outcome(&tx, &outcome))?;

        db(tx.commit())?;
        Ok(outcome)
    }

    /// Clear ranking fields of students that have no major
    pub fn clear_unassigned(&self) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let n = clear_unassigned(&tx)?;
        tx.commit()?;
        Ok(n)
    }

    /// Rows for the partner export, ordered by major code then ranking
    pub fn list_export_rows(&self, eligible_only: bool) -> RepositoryResult<Vec<RankingExportRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                s.ranking, s.nisn, s.name, m.code, s.average_score,
                COALESCE((
                    SELECT SUM(g.score)
                    FROM grade g
                    JOIN subject sub ON sub.subject_id = g.subject_id
                    WHERE g.student_id = s.student_id AND sub.is_priority = 1
                ), 0.0) AS priority_score,
                s.is_eligible
            FROM student s
            JOIN major m ON m.major_id = s.major_id
            WHERE s.ranking IS NOT NULL
              AND (?1 = 0 OR s.is_eligible = 1)
            ORDER BY m.code ASC, s.ranking ASC
            "#,
        )?;

        let rows = stmt
            .query_map(params![eligible_only as i64], |row| {
                Ok(RankingExportRow {
                    ranking: row.get(0)?,
                    nisn: row.get(1)?,
                    name: row.get(2)?,
                    major_code: row.get(3)?,
                    average_score: row.get(4)?,
                    priority_score: row.get(5)?,
                    eligible: row.get::<_, i64>(6)? != 0,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(rows)
    }
}

fn db<T>(result: rusqlite::Result<T>) -> RepositoryResult<T> {
    Ok(result?)
}

fn clear_unassigned(tx: &Transaction) -> rusqlite::Result<usize> {
    tx.execute(
        r#"
        UPDATE student SET ranking = NULL, is_eligible = 0
        WHERE major_id IS NULL AND (ranking IS NOT NULL OR is_eligible <> 0)
        "#,
        [],
    )
}

fn write_major_outcome(tx: &Transaction, outcome: &MajorRankingOutcome) -> rusqlite::Result<usize> {
    tx.execute(
        "UPDATE major SET total_students = ?1, quota_count = ?2 WHERE major_id = ?3",
        params![outcome.total_students, outcome.quota_count, outcome.major_id],
    )?;

    let mut stmt = tx.prepare_cached(
        "UPDATE student SET ranking = ?1, is_eligible = ?2 WHERE student_id = ?3 AND major_id = ?4",
    )?;
    let mut written = 0;
    for ranked in &outcome.ranked {
        written += stmt.execute(params![
            ranked.ranking,
            ranked.is_eligible as i64,
            ranked.student_id,
            outcome.major_id,
        ])?;
    }

    debug!(
        major_code = %outcome.major_code,
        total_students = outcome.total_students,
        quota_count = outcome.quota_count,
        written,
        "major ranking written"
    );
    Ok(written)
}

// ==========================================
// RankingRunRepository - ranking_run records
// ==========================================
pub struct RankingRunRepository {
    conn: Arc<Mutex<Connection>>,
}

/// Final counters of a run
#[derive(Debug, Clone, Copy, Default)]
pub struct RunCounters {
    pub majors_processed: i64,
    pub students_ranked: i64,
    pub eligible_count: i64,
}

const RUN_COLUMNS: &str = "run_id, started_at, finished_at, status, atomicity, majors_processed, \
     students_ranked, eligible_count, config_snapshot_json, error_message, triggered_by";

impl RankingRunRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, run: &RankingRun) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO ranking_run (
                run_id, started_at, finished_at, status, atomicity,
                majors_processed, students_ranked, eligible_count,
                config_snapshot_json, error_message, triggered_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                run.run_id,
                format_db_ts(&run.started_at),
                run.finished_at.as_ref().map(format_db_ts),
                run.status.to_string(),
                run.atomicity.to_string(),
                run.majors_processed,
                run.students_ranked,
                run.eligible_count,
                run.config_snapshot_json,
                run.error_message,
                run.triggered_by,
            ],
        )?;
        Ok(())
    }

    /// Mark a run COMPLETED / FAILED with its counters
    pub fn finish(
        &self,
        run_id: &str,
        status: RunStatus,
        finished_at: NaiveDateTime,
        counters: RunCounters,
        error_message: Option<&str>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE ranking_run
            SET status = ?1, finished_at = ?2, majors_processed = ?3,
                students_ranked = ?4, eligible_count = ?5, error_message = ?6
            WHERE run_id = ?7
            "#,
            params![
                status.to_string(),
                format_db_ts(&finished_at),
                counters.majors_processed,
                counters.students_ranked,
                counters.eligible_count,
                error_message,
                run_id,
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "RankingRun".to_string(),
                id: run_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn find_by_id(&self, run_id: &str) -> RepositoryResult<Option<RankingRun>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM ranking_run WHERE run_id = ?1", RUN_COLUMNS);
        let run = conn.query_row(&sql, params![run_id], map_run_row).optional()?;
        Ok(run)
    }

    pub fn find_latest(&self) -> RepositoryResult<Option<RankingRun>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM ranking_run ORDER BY started_at DESC, rowid DESC LIMIT 1",
            RUN_COLUMNS
        );
        let run = conn.query_row(&sql, [], map_run_row).optional()?;
        Ok(run)
    }
}

fn map_run_row(row: &Row) -> SqliteResult<RankingRun> {
    let atomicity_raw: String = row.get(4)?;
    Ok(RankingRun {
        run_id: row.get(0)?,
        started_at: parse_db_ts(&row.get::<_, String>(1)?),
        finished_at: row.get::<_, Option<String>>(2)?.map(|s| parse_db_ts(&s)),
        status: RunStatus::from_db_str(&row.get::<_, String>(3)?),
        atomicity: RunAtomicity::from_db_str(&atomicity_raw).unwrap_or_default(),
        majors_processed: row.get(5)?,
        students_ranked: row.get(6)?,
        eligible_count: row.get(7)?,
        config_snapshot_json: row.get(8)?,
        error_message: row.get(9)?,
        triggered_by: row.get(10)?,
    })
}
