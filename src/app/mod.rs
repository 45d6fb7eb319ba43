// ==========================================
// Si-Eligible - application layer
// ==========================================

pub mod state;

pub use state::{get_default_db_path, AppState, DB_PATH_ENV};
