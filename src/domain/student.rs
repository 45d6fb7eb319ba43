// ==========================================
// Si-Eligible - Student / Subject / Grade domain models
// ==========================================
// ranking / is_eligible are stale snapshots of the last ranking run
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Lowest / highest score a grade may hold
pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

/// Semesters counted for SNBP (grade 10 to grade 12, two per year)
pub const MIN_SEMESTER: i32 = 1;
pub const MAX_SEMESTER: i32 = 6;

// ==========================================
// Student
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub student_id: i64,
    pub nisn: String, // national student number, unique
    pub name: String,
    pub major_id: Option<i64>,
    pub average_score: Option<f64>,

    // ===== Ranking snapshot =====
    pub ranking: Option<i64>,
    pub is_eligible: bool,

    pub updated_at: NaiveDateTime,
}

// ==========================================
// Subject
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub subject_id: i64,
    pub code: String,
    pub name: String,
    /// Counted in the ranking tie-break sum
    pub is_priority: bool,
}

// ==========================================
// Grade - one scored subject entry of one student
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub grade_id: i64,
    pub student_id: i64,
    pub subject_id: i64,
    pub semester: i32,
    pub score: f64,
}

/// Score bounds check shared by importer and dispute flow
pub fn is_valid_score(score: f64) -> bool {
    score.is_finite() && (MIN_SCORE..=MAX_SCORE).contains(&score)
}

pub fn is_valid_semester(semester: i32) -> bool {
    (MIN_SEMESTER..=MAX_SEMESTER).contains(&semester)
}
