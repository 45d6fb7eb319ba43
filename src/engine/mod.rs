// ==========================================
// Si-Eligible - engine layer
// ==========================================
// Business rules only, no SQL
// ==========================================

pub mod average;
pub mod error;
pub mod orchestrator;
pub mod ranking;
pub mod ranking_core;
pub mod repositories;

pub use average::AverageScoreCalculator;
pub use error::{RankingError, RankingResult};
pub use orchestrator::RankingOrchestrator;
pub use ranking::RankingEngine;
pub use ranking_core::RankingCore;
pub use repositories::RankingRepositories;
