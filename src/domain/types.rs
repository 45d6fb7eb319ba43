// ==========================================
// Si-Eligible - domain enums
// ==========================================
// Stored in SQLite as SCREAMING_SNAKE_CASE strings
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Dispute status
// ==========================================
// OPEN -> ACCEPTED | REJECTED, terminal once resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisputeStatus {
    Open,     // waiting for review
    Accepted, // claimed score written back to the grade
    Rejected, // grade left untouched
}

impl DisputeStatus {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "OPEN" => Some(DisputeStatus::Open),
            "ACCEPTED" => Some(DisputeStatus::Accepted),
            "REJECTED" => Some(DisputeStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, DisputeStatus::Open)
    }
}

impl fmt::Display for DisputeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisputeStatus::Open => write!(f, "OPEN"),
            DisputeStatus::Accepted => write!(f, "ACCEPTED"),
            DisputeStatus::Rejected => write!(f, "REJECTED"),
        }
    }
}

// ==========================================
// Ranking run atomicity
// ==========================================
// WHOLE_RUN: every major commits together or not at all
// PER_MAJOR: one transaction per major, earlier majors survive a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunAtomicity {
    #[default]
    WholeRun,
    PerMajor,
}

impl RunAtomicity {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "WHOLE_RUN" => Some(RunAtomicity::WholeRun),
            "PER_MAJOR" => Some(RunAtomicity::PerMajor),
            _ => None,
        }
    }
}

impl fmt::Display for RunAtomicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunAtomicity::WholeRun => write!(f, "WHOLE_RUN"),
            RunAtomicity::PerMajor => write!(f, "PER_MAJOR"),
        }
    }
}

// ==========================================
// Ranking run status
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn from_db_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "RUNNING" => RunStatus::Running,
            "COMPLETED" => RunStatus::Completed,
            _ => RunStatus::Failed,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Running => write!(f, "RUNNING"),
            RunStatus::Completed => write!(f, "COMPLETED"),
            RunStatus::Failed => write!(f, "FAILED"),
        }
    }
}
