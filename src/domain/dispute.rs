// ==========================================
// Si-Eligible - grade dispute domain model
// ==========================================

use crate::domain::types::DisputeStatus;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// GradeDispute - a student's challenge to one grade
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeDispute {
    pub dispute_id: String, // uuid v4
    pub student_id: i64,
    pub grade_id: i64,

    pub original_score: f64, // grade score when the dispute was raised
    pub claimed_score: f64,
    pub reason: String,

    pub status: DisputeStatus,
    pub created_at: NaiveDateTime,
    pub created_by: String,

    // ===== Resolution =====
    pub resolved_at: Option<NaiveDateTime>,
    pub resolved_by: Option<String>,
    pub resolution_note: Option<String>,
}
