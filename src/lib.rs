// ==========================================
// Si-Eligible - core library
// ==========================================
// Per-major eligibility ranking for school admission quotas
// Stack: Rust + SQLite (rusqlite)
// ==========================================

// ==========================================
// Modules
// ==========================================

// Domain - entities and enums
pub mod domain;

// Repository - SQL lives here only
pub mod repository;

// Engine - ranking rules and run orchestration
pub mod engine;

// Import - CSV / Excel rosters and grades
pub mod importer;

// Export - partner CSV
pub mod exporter;

// Config - config_kv settings
pub mod config;

// SQLite connection setup and schema
pub mod db;

// Logging
pub mod logging;

// API - entry points
pub mod api;

// App - wiring of all layers
pub mod app;

// ==========================================
// Re-exports
// ==========================================

pub use domain::types::{DisputeStatus, RunAtomicity, RunStatus};

pub use domain::{
    ActionLog, ActionType, GradeDispute, Major, MajorRankingOutcome, RankingCandidate,
    RankingRun, RankingRunSummary, Student,
};

pub use engine::{
    AverageScoreCalculator, RankingCore, RankingEngine, RankingError, RankingOrchestrator,
};

pub use api::{ApiError, ApiResult, ConfigApi, DisputeApi, ImportApi, RankingApi, StudentApi};

pub use app::AppState;

// ==========================================
// Constants
// ==========================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const APP_NAME: &str = "Si-Eligible";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
