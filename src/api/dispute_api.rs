// ==========================================
// Si-Eligible - grade dispute API
// ==========================================
// raise -> OPEN -> ACCEPTED | REJECTED
// Accepting rewrites the grade and the student's average, never the ranking
// ==========================================

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::dispute::GradeDispute;
use crate::domain::student::is_valid_score;
use crate::domain::types::DisputeStatus;
use crate::repository::{
    AcceptedClaim, ActionLogRepository, DisputeResolution, GradeDisputeRepository, GradeRepository,
};

pub struct DisputeApi {
    dispute_repo: Arc<GradeDisputeRepository>,
    grade_repo: Arc<GradeRepository>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl DisputeApi {
    pub fn new(
        dispute_repo: Arc<GradeDisputeRepository>,
        grade_repo: Arc<GradeRepository>,
        action_log_repo: Arc<ActionLogRepository>,
    ) -> Self {
        Self {
            dispute_repo,
            grade_repo,
            action_log_repo,
        }
    }

    /// Open a dispute against one grade
    ///
    /// # Errors
    /// - InvalidInput: score outside 0..=100 or empty reason
    /// - NotFound: unknown grade
    /// - BusinessRuleViolation: the grade already has an OPEN dispute
    pub fn raise_dispute(
        &self,
        grade_id: i64,
        claimed_score: f64,
        reason: &str,
        actor: &str,
    ) -> ApiResult<GradeDispute> {
        if !is_valid_score(claimed_score) {
            return Err(ApiError::InvalidInput(format!(
                "claimed score {} is outside 0..=100",
                claimed_score
            )));
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ApiError::InvalidInput("dispute reason is empty".to_string()));
        }

        let grade = self
            .grade_repo
            .find_by_id(grade_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Grade(id={})", grade_id)))?;

        if self.dispute_repo.has_open_for_grade(grade_id)? {
            return Err(ApiError::BusinessRuleViolation(format!(
                "grade {} already has an open dispute",
                grade_id
            )));
        }

        let dispute = GradeDispute {
            dispute_id: Uuid::new_v4().to_string(),
            student_id: grade.student_id,
            grade_id,
            original_score: grade.score,
            claimed_score,
            reason: reason.to_string(),
            status: DisputeStatus::Open,
            created_at: Utc::now().naive_utc(),
            created_by: actor.to_string(),
            resolved_at: None,
            resolved_by: None,
            resolution_note: None,
        };
        self.dispute_repo.insert(&dispute)?;

        self.action_log_repo.insert(&ActionLog::new(
            ActionType::RaiseDispute,
            actor,
            Some(json!({
                "dispute_id": dispute.dispute_id,
                "grade_id": grade_id,
                "original_score": dispute.original_score,
                "claimed_score": claimed_score,
            })),
            Some(dispute.reason.clone()),
        ))?;

        info!(dispute_id = %dispute.dispute_id, grade_id, "dispute raised");
        Ok(dispute)
    }

    /// Accept or reject an OPEN dispute
    pub fn resolve_dispute(
        &self,
        dispute_id: &str,
        accept: bool,
        note: Option<&str>,
        actor: &str,
    ) -> ApiResult<GradeDispute> {
        let dispute = self
            .dispute_repo
            .find_by_id(dispute_id)?
            .ok_or_else(|| ApiError::NotFound(format!("GradeDispute(id={})", dispute_id)))?;

        let target = if accept {
            DisputeStatus::Accepted
        } else {
            DisputeStatus::Rejected
        };
        if dispute.status.is_terminal() {
            return Err(ApiError::InvalidStateTransition {
                from: dispute.status.to_string(),
                to: target.to_string(),
            });
        }

        let accepted = accept.then(|| AcceptedClaim {
            student_id: dispute.student_id,
            grade_id: dispute.grade_id,
            score: dispute.claimed_score,
        });

        let new_average = self.dispute_repo.apply_resolution(&DisputeResolution {
            dispute_id: dispute_id.to_string(),
            status: target,
            resolved_at: Utc::now().naive_utc(),
            resolved_by: actor.to_string(),
            note: note.map(str::to_string),
            accepted,
        })?;

        self.action_log_repo.insert(&ActionLog::new(
            ActionType::ResolveDispute,
            actor,
            Some(json!({
                "dispute_id": dispute_id,
                "grade_id": dispute.grade_id,
                "status": target.to_string(),
                "new_average": new_average,
            })),
            note.map(str::to_string),
        ))?;

        info!(dispute_id, status = %target, "dispute resolved");

        self.dispute_repo
            .find_by_id(dispute_id)?
            .ok_or_else(|| ApiError::NotFound(format!("GradeDispute(id={})", dispute_id)))
    }

    pub fn list_disputes(&self, status: Option<DisputeStatus>) -> ApiResult<Vec<GradeDispute>> {
        Ok(self.dispute_repo.list(status)?)
    }
}
