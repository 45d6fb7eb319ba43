// ==========================================
// Si-Eligible - domain layer
// ==========================================
// Entities and enums only, no data access and no engine logic
// ==========================================

pub mod action_log;
pub mod dispute;
pub mod major;
pub mod ranking;
pub mod student;
pub mod types;

pub use action_log::{ActionLog, ActionType};
pub use dispute::GradeDispute;
pub use major::Major;
pub use ranking::{
    MajorRankingOutcome, RankedStudent, RankingCandidate, RankingExportRow, RankingRun,
    RankingRunSummary,
};
pub use student::{Grade, Student, Subject};
pub use types::{DisputeStatus, RunAtomicity, RunStatus};
