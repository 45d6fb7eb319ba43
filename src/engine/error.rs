// ==========================================
// Si-Eligible - ranking run errors
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RankingError {
    /// Another compute_rankings() call holds the run guard
    #[error("a ranking run is already in progress")]
    AlreadyRunning,

    #[error("ranking output rejected for major {major_code}: {message}")]
    InvalidOutcome { major_code: String, message: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type RankingResult<T> = Result<T, RankingError>;
