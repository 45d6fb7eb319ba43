// ==========================================
// Si-Eligible - config layer
// ==========================================
// Storage: config_kv table (scope_id = 'global')
// ==========================================

pub mod config_manager;
pub mod ranking_config;
pub mod ranking_config_trait;

pub use config_manager::{config_keys, ConfigManager};
pub use ranking_config::{RankingConfig, DEFAULT_QUOTA_PERCENTAGE};
pub use ranking_config_trait::RankingConfigReader;
