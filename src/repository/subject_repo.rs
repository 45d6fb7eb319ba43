// ==========================================
// Si-Eligible - subject repository
// ==========================================

use crate::domain::student::Subject;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

pub struct SubjectRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SubjectRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn create(&self, code: &str, name: &str, is_priority: bool) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO subject (code, name, is_priority) VALUES (?1, ?2, ?3)",
            params![code, name, is_priority as i64],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_by_code(&self, code: &str) -> RepositoryResult<Option<Subject>> {
        let conn = self.get_conn()?;
        let subject = conn
            .query_row(
                "SELECT subject_id, code, name, is_priority FROM subject WHERE code = ?1",
                params![code],
                map_row,
            )
            .optional()?;
        Ok(subject)
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<Subject>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT subject_id, code, name, is_priority FROM subject ORDER BY code ASC")?;
        let subjects = stmt
            .query_map([], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(subjects)
    }

    /// Flag / unflag a subject as tie-break subject
    pub fn set_priority(&self, subject_id: i64, is_priority: bool) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE subject SET is_priority = ?1 WHERE subject_id = ?2",
            params![is_priority as i64, subject_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Subject".to_string(),
                id: subject_id.to_string(),
            });
        }
        Ok(())
    }
}

fn map_row(row: &Row) -> SqliteResult<Subject> {
    Ok(Subject {
        subject_id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        is_priority: row.get::<_, i64>(3)? != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_toggle_priority() {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        let repo = SubjectRepository::new(Arc::new(Mutex::new(conn)));

        let id = repo.create("MTK", "Matematika", false).unwrap();
        assert!(!repo.find_by_code("MTK").unwrap().unwrap().is_priority);

        repo.set_priority(id, true).unwrap();
        assert!(repo.find_by_code("MTK").unwrap().unwrap().is_priority);

        assert_eq!(repo.list_all().unwrap().len(), 1);
        assert!(repo.set_priority(404, true).is_err());
    }
}
