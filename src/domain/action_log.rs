// ==========================================
// Si-Eligible - action log (audit) domain model
// ==========================================
// Every write operation leaves one record
// ==========================================

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use uuid::Uuid;

// ==========================================
// ActionLog
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,
    pub action_type: String, // ActionType as stored string
    pub action_ts: NaiveDateTime,
    pub actor: String,
    pub payload_json: Option<JsonValue>,
    pub detail: Option<String>,
}

impl ActionLog {
    pub fn new(
        action_type: ActionType,
        actor: &str,
        payload_json: Option<JsonValue>,
        detail: Option<String>,
    ) -> Self {
        Self {
            action_id: Uuid::new_v4().to_string(),
            action_type: action_type.to_string(),
            action_ts: Utc::now().naive_utc(),
            actor: actor.to_string(),
            payload_json,
            detail,
        }
    }
}

// ==========================================
// ActionType
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    ComputeRankings,
    ImportStudents,
    ImportGrades,
    ExportRankings,
    RecalcAverages,
    RaiseDispute,
    ResolveDispute,
    UpdateQuota,
    UpdateMajorQuota,
    UpdateAtomicity,
    UpdateSubjectPriority,
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionType::ComputeRankings => "COMPUTE_RANKINGS",
            ActionType::ImportStudents => "IMPORT_STUDENTS",
            ActionType::ImportGrades => "IMPORT_GRADES",
            ActionType::ExportRankings => "EXPORT_RANKINGS",
            ActionType::RecalcAverages => "RECALC_AVERAGES",
            ActionType::RaiseDispute => "RAISE_DISPUTE",
            ActionType::ResolveDispute => "RESOLVE_DISPUTE",
            ActionType::UpdateQuota => "UPDATE_QUOTA",
            ActionType::UpdateMajorQuota => "UPDATE_MAJOR_QUOTA",
            ActionType::UpdateAtomicity => "UPDATE_ATOMICITY",
            ActionType::UpdateSubjectPriority => "UPDATE_SUBJECT_PRIORITY",
        };
        write!(f, "{}", s)
    }
}
