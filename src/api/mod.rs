// ==========================================
// Si-Eligible - API layer
// ==========================================
// Entry points used by the CLI (and any future front end)
// ==========================================

pub mod config_api;
pub mod dispute_api;
pub mod error;
pub mod import_api;
pub mod ranking_api;
pub mod student_api;

pub use config_api::ConfigApi;
pub use dispute_api::DisputeApi;
pub use error::{ApiError, ApiResult};
pub use import_api::ImportApi;
pub use ranking_api::RankingApi;
pub use student_api::StudentApi;
