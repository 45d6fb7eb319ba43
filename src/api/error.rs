// ==========================================
// Si-Eligible - API errors
// ==========================================
// Maps repository / engine / import failures to caller-facing errors
// ==========================================

use crate::engine::error::RankingError;
use crate::exporter::ExportError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    // ===== Business rules =====
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("business rule violated: {0}")]
    BusinessRuleViolation(String),

    #[error("invalid state transition: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    // ===== Concurrency =====
    #[error("a ranking run is already in progress")]
    RankingInProgress,

    // ===== Data access =====
    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("database connection failed: {0}")]
    DatabaseConnectionError(String),

    // ===== Files =====
    #[error("import failed: {0}")]
    ImportError(String),

    #[error("export failed: {0}")]
    ExportError(String),

    // ===== General =====
    #[error("internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("lock acquisition failed: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("unique constraint: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("foreign key constraint: {}", msg))
            }
            RepositoryError::InvalidStateTransition { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

impl From<RankingError> for ApiError {
    fn from(err: RankingError) -> Self {
        match err {
            RankingError::AlreadyRunning => ApiError::RankingInProgress,
            RankingError::InvalidOutcome { major_code, message } => {
                ApiError::InternalError(format!("major {}: {}", major_code, message))
            }
            RankingError::Repository(e) => e.into(),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Repository(e) => e.into(),
            ImportError::Other(e) => ApiError::Other(e),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        ApiError::ExportError(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_running_maps_to_ranking_in_progress() {
        let err: ApiError = RankingError::AlreadyRunning.into();
        assert!(matches!(err, ApiError::RankingInProgress));
    }

    #[test]
    fn test_repository_errors_pass_through_engine_and_import() {
        let not_found = || RepositoryError::NotFound {
            entity: "Major".to_string(),
            id: "7".to_string(),
        };
        assert!(matches!(
            ApiError::from(RankingError::Repository(not_found())),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(ImportError::Repository(not_found())),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(ImportError::MissingColumn("nisn".into())),
            ApiError::ImportError(_)
        ));
    }
}
