// ==========================================
// Si-Eligible - repository layer
// ==========================================
// Data access only, no business rules
// All queries are parameterised
// All repositories share one Arc<Mutex<Connection>>
// ==========================================

pub mod action_log_repo;
pub mod dispute_repo;
pub mod error;
pub mod grade_repo;
pub mod import_repo;
pub mod major_repo;
pub mod ranking_repo;
pub mod student_repo;
pub mod subject_repo;

pub use action_log_repo::ActionLogRepository;
pub use dispute_repo::{AcceptedClaim, DisputeResolution, GradeDisputeRepository};
pub use error::{RepositoryError, RepositoryResult};
pub use grade_repo::GradeRepository;
pub use import_repo::{GradeImportRow, StudentImportRepository, StudentImportRow};
pub use major_repo::MajorRepository;
pub use ranking_repo::{RankingRepository, RankingRunRepository, RunCounters};
pub use student_repo::StudentRepository;
pub use subject_repo::SubjectRepository;

use chrono::NaiveDateTime;

/// Timestamp format used in every TEXT timestamp column
pub const DB_TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn format_db_ts(ts: &NaiveDateTime) -> String {
    ts.format(DB_TS_FORMAT).to_string()
}

pub(crate) fn parse_db_ts(raw: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(raw, DB_TS_FORMAT).unwrap_or_default()
}
