// ==========================================
// Si-Eligible - config manager
// ==========================================
// Load / query / write settings in config_kv (key-value + scope)
// ==========================================

use crate::config::ranking_config::{is_valid_percentage, DEFAULT_QUOTA_PERCENTAGE};
use crate::config::ranking_config_trait::RankingConfigReader;
use crate::domain::types::RunAtomicity;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// Share an existing connection
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Read a global value
    ///
    /// # Returns
    /// - Some(String): stored value
    /// - None: key not set
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_global_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// Upsert a global value
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// All global values, sorted by key
    pub fn list_global_configs(&self) -> RepositoryResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut map = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

// ==========================================
// RankingConfigReader impl
// ==========================================
#[async_trait]
impl RankingConfigReader for ConfigManager {
    async fn get_quota_percentage(&self) -> RepositoryResult<f64> {
        let value = self.get_global_config_value(config_keys::QUOTA_PERCENTAGE)?;
        let Some(raw) = value else {
            tracing::debug!(
                config_key = config_keys::QUOTA_PERCENTAGE,
                "quota percentage not configured, using default"
            );
            return Ok(DEFAULT_QUOTA_PERCENTAGE);
        };

        match raw.trim().parse::<f64>() {
            Ok(pct) if is_valid_percentage(pct) => Ok(pct),
            _ => {
                tracing::warn!(
                    config_key = config_keys::QUOTA_PERCENTAGE,
                    raw_value = %raw,
                    "invalid quota percentage, using default"
                );
                Ok(DEFAULT_QUOTA_PERCENTAGE)
            }
        }
    }

    async fn get_run_atomicity(&self) -> RepositoryResult<RunAtomicity> {
        let value = self.get_config_or_default(config_keys::RANKING_ATOMICITY, "WHOLE_RUN")?;
        Ok(RunAtomicity::from_db_str(&value).unwrap_or_else(|| {
            tracing::warn!(
                config_key = config_keys::RANKING_ATOMICITY,
                raw_value = %value,
                "unknown ranking atomicity, using WHOLE_RUN"
            );
            RunAtomicity::WholeRun
        }))
    }
}

// ==========================================
// Config keys
// ==========================================
pub mod config_keys {
    // Quota
    pub const QUOTA_PERCENTAGE: &str = "quota_percentage";

    // Ranking run
    pub const RANKING_ATOMICITY: &str = "ranking_atomicity";
}
