use crate::domain::action_log::ActionLog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::format_db_ts;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// ActionLogRepository
// ==========================================
pub struct ActionLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ActionLogRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Insert one log entry, returns its action_id
    pub fn insert(&self, log: &ActionLog) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        insert_row(&conn, log)?;
        Ok(log.action_id.clone())
    }

    /// Insert several entries in one transaction
    pub fn batch_insert(&self, logs: Vec<ActionLog>) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        for log in &logs {
            insert_row(&tx, log)?;
        }
        tx.commit()?;
        Ok(logs.len())
    }
}

fn insert_row(conn: &Connection, log: &ActionLog) -> rusqlite::Result<usize> {
    conn.execute(
        r#"
        INSERT INTO action_log (action_id, action_type, action_ts, actor, payload_json, detail)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            log.action_id,
            log.action_type,
            format_db_ts(&log.action_ts),
            log.actor,
            log.payload_json.as_ref().map(|v| v.to_string()),
            log.detail,
        ],
    )
}
