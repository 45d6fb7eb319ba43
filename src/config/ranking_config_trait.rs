// ==========================================
// Si-Eligible - ranking config reader trait
// ==========================================
// Read side only, implemented by ConfigManager (config_kv table)
// ==========================================

use crate::config::ranking_config::RankingConfig;
use crate::domain::types::RunAtomicity;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

#[async_trait]
pub trait RankingConfigReader: Send + Sync {
    /// Global quota percentage (0..=100)
    ///
    /// # Default
    /// - 40.0 when the key is missing or not a valid percentage
    async fn get_quota_percentage(&self) -> RepositoryResult<f64>;

    /// Transaction scope of a ranking run
    ///
    /// # Default
    /// - WHOLE_RUN
    async fn get_run_atomicity(&self) -> RepositoryResult<RunAtomicity>;

    /// Snapshot of every ranking setting, taken once per run
    async fn load_ranking_config(&self) -> RepositoryResult<RankingConfig> {
        Ok(RankingConfig::default()
            .with_quota_percentage(self.get_quota_percentage().await?)
            .with_atomicity(self.get_run_atomicity().await?))
    }
}
