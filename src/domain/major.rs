// ==========================================
// Si-Eligible - Major domain model
// ==========================================
// total_students / quota_count are written only by a ranking run
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Major - academic track (e.g. TKJ, AKL)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Major {
    pub major_id: i64,
    pub code: String,
    pub name: String,

    /// Per-major quota percentage, falls back to the global config when None
    pub quota_percentage: Option<f64>,

    // ===== Snapshot of the last ranking run =====
    pub total_students: i64,
    pub quota_count: i64,
}

impl Major {
    /// New, never-ranked major
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            major_id: 0,
            code: code.into(),
            name: name.into(),
            quota_percentage: None,
            total_students: 0,
            quota_count: 0,
        }
    }

    pub fn with_quota_percentage(mut self, pct: f64) -> Self {
        self.quota_percentage = Some(pct);
        self
    }
}
