// ==========================================
// Si-Eligible - ranking domain models
// ==========================================
// Candidate  : read model fed into the ranking engine
// Outcome    : engine output for one major, persisted as a unit
// RankingRun : audit record of one compute_rankings() invocation
// ==========================================

use crate::domain::types::{RunAtomicity, RunStatus};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// RankingCandidate - one student as seen by the engine
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingCandidate {
    pub student_id: i64,
    pub nisn: String,
    pub name: String,
    pub average_score: Option<f64>,
    /// Sum of grade scores over priority subjects
    pub priority_score: f64,
}

// ==========================================
// RankedStudent - candidate after sort + quota cut
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedStudent {
    pub student_id: i64,
    pub nisn: String,
    pub ranking: i64,
    pub is_eligible: bool,
    pub average_score: Option<f64>,
    pub priority_score: f64,
}

// ==========================================
// MajorRankingOutcome - engine output for one major
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MajorRankingOutcome {
    pub major_id: i64,
    pub major_code: String,
    pub quota_percentage: f64,
    pub total_students: i64,
    pub quota_count: i64,
    pub ranked: Vec<RankedStudent>, // ordered by ranking ascending
}

impl MajorRankingOutcome {
    pub fn eligible_count(&self) -> usize {
        self.ranked.iter().filter(|s| s.is_eligible).count()
    }
}

// ==========================================
// RankingRun - persisted run record
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingRun {
    pub run_id: String,
    pub started_at: NaiveDateTime,
    pub finished_at: Option<NaiveDateTime>,
    pub status: RunStatus,
    pub atomicity: RunAtomicity,
    pub majors_processed: i64,
    pub students_ranked: i64,
    pub eligible_count: i64,
    pub config_snapshot_json: Option<String>,
    pub error_message: Option<String>,
    pub triggered_by: String,
}

// ==========================================
// RankingRunSummary - returned to the caller on success
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRunSummary {
    pub run_id: String,
    pub majors_processed: usize,
    pub students_ranked: usize,
    pub eligible_count: usize,
}

// ==========================================
// RankingExportRow - one line of the partner export
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingExportRow {
    pub ranking: i64,
    pub nisn: String,
    pub name: String,
    pub major_code: String,
    pub average_score: Option<f64>,
    pub priority_score: f64,
    pub eligible: bool,
}
