// ==========================================
// Si-Eligible - student repository
// ==========================================
// ranking / is_eligible are written by RankingRepository only
// ==========================================

use crate::domain::ranking::RankingCandidate;
use crate::domain::student::Student;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::parse_db_ts;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const STUDENT_COLUMNS: &str =
    "student_id, nisn, name, major_id, average_score, ranking, is_eligible, updated_at";

// ==========================================
// StudentRepository
// ==========================================
pub struct StudentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StudentRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Insert a student, returns the new student_id
    pub fn create(
        &self,
        nisn: &str,
        name: &str,
        major_id: Option<i64>,
        average_score: Option<f64>,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO student (nisn, name, major_id, average_score, updated_at)
            VALUES (?1, ?2, ?3, ?4, datetime('now'))
            "#,
            params![nisn, name, major_id, average_score],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_by_id(&self, student_id: i64) -> RepositoryResult<Option<Student>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM student WHERE student_id = ?1", STUDENT_COLUMNS);
        let student = conn.query_row(&sql, params![student_id], map_row).optional()?;
        Ok(student)
    }

    pub fn find_by_nisn(&self, nisn: &str) -> RepositoryResult<Option<Student>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM student WHERE nisn = ?1", STUDENT_COLUMNS);
        let student = conn.query_row(&sql, params![nisn], map_row).optional()?;
        Ok(student)
    }

    /// Students of one major, ranked ones first in ranking order
    pub fn list_by_major(&self, major_id: i64) -> RepositoryResult<Vec<Student>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM student WHERE major_id = ?1 \
             ORDER BY ranking IS NULL, ranking ASC, nisn ASC",
            STUDENT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let students = stmt
            .query_map(params![major_id], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(students)
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<Student>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM student ORDER BY nisn ASC", STUDENT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let students = stmt
            .query_map([], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(students)
    }

    /// Batch average update in one transaction
    pub fn batch_update_average_scores(&self, updates: &[(i64, Option<f64>)]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                "UPDATE student SET average_score = ?1, updated_at = datetime('now') WHERE student_id = ?2",
            )?;
            for (student_id, average_score) in updates {
                count += stmt.execute(params![average_score, student_id])?;
            }
        }
        tx.commit()?;
        Ok(count)
    }
}

// ==========================================
// Ranking read model
// ==========================================

/// Ranking candidates of one major with their priority-subject score sum
///
/// Takes a bare connection so a ranking run can read inside its own write
/// transaction.
pub(crate) fn load_ranking_candidates(conn: &Connection, major_id: i64) -> SqliteResult<Vec<RankingCandidate>> {
    let mut stmt = conn.prepare_cached(
        r#"
        SELECT
            s.student_id, s.nisn, s.name, s.average_score,
            COALESCE((
                SELECT SUM(g.score)
                FROM grade g
                JOIN subject sub ON sub.subject_id = g.subject_id
                WHERE g.student_id = s.student_id AND sub.is_priority = 1
            ), 0.0) AS priority_score
        FROM student s
        WHERE s.major_id = ?1
        ORDER BY s.student_id ASC
        "#,
    )?;

    let candidates = stmt
        .query_map(params![major_id], |row| {
            Ok(RankingCandidate {
                student_id: row.get(0)?,
                nisn: row.get(1)?,
                name: row.get(2)?,
                average_score: row.get(3)?,
                priority_score: row.get(4)?,
            })
        })?
        .collect::<SqliteResult<Vec<_>>>()?;
    Ok(candidates)
}

fn map_row(row: &Row) -> SqliteResult<Student> {
    Ok(Student {
        student_id: row.get(0)?,
        nisn: row.get(1)?,
        name: row.get(2)?,
        major_id: row.get(3)?,
        average_score: row.get(4)?,
        ranking: row.get(5)?,
        is_eligible: row.get::<_, i64>(6)? != 0,
        updated_at: parse_db_ts(&row.get::<_, String>(7)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Arc<Mutex<Connection>>, StudentRepository) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO major (major_id, code, name) VALUES (1, 'TKJ', 'TKJ');
            INSERT INTO subject (subject_id, code, name, is_priority) VALUES
                (1, 'MTK', 'Matematika', 1),
                (2, 'PKN', 'Pendidikan Kewarganegaraan', 0);
            "#,
        )
        .unwrap();
        let conn = Arc::new(Mutex::new(conn));
        (conn.clone(), StudentRepository::new(conn))
    }

    #[test]
    fn test_create_and_find_by_nisn() {
        let (_conn, repo) = setup();
        let id = repo.create("0051234567", "Budi", Some(1), Some(88.5)).unwrap();

        let s = repo.find_by_nisn("0051234567").unwrap().unwrap();
        assert_eq!(s.student_id, id);
        assert_eq!(s.major_id, Some(1));
        assert_eq!(s.average_score, Some(88.5));
        assert_eq!(s.ranking, None);
        assert!(!s.is_eligible);
    }

    #[test]
    fn test_candidates_sum_only_priority_subjects() {
        let (conn, repo) = setup();
        let a = repo.create("001", "A", Some(1), Some(90.0)).unwrap();
        let b = repo.create("002", "B", Some(1), None).unwrap();
        {
            let c = conn.lock().unwrap();
            c.execute_batch(&format!(
                r#"
                INSERT INTO grade (student_id, subject_id, semester, score) VALUES
                    ({a}, 1, 1, 80.0), ({a}, 1, 2, 70.5), ({a}, 2, 1, 99.0);
                "#,
                a = a
            ))
            .unwrap();
        }

        let candidates = load_ranking_candidates(&conn.lock().unwrap(), 1).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].student_id, a);
        assert!((candidates[0].priority_score - 150.5).abs() < 1e-9);
        assert_eq!(candidates[1].student_id, b);
        assert_eq!(candidates[1].priority_score, 0.0);
        assert_eq!(candidates[1].average_score, None);
    }

    #[test]
    fn test_batch_update_average_scores() {
        let (_conn, repo) = setup();
        let a = repo.create("001", "A", Some(1), None).unwrap();
        let b = repo.create("002", "B", Some(1), Some(50.0)).unwrap();

        let n = repo
            .batch_update_average_scores(&[(a, Some(77.25)), (b, None)])
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(repo.find_by_id(a).unwrap().unwrap().average_score, Some(77.25));
        assert_eq!(repo.find_by_id(b).unwrap().unwrap().average_score, None);
    }
}
