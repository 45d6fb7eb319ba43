// ==========================================
// Si-Eligible - configuration API
// ==========================================
// Quota percentage (global + per major), run atomicity, priority subjects
// Every write leaves an ActionLog entry
// ==========================================

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::config::ranking_config::is_valid_percentage;
use crate::config::{config_keys, ConfigManager, RankingConfig, RankingConfigReader};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::student::Subject;
use crate::domain::types::RunAtomicity;
use crate::repository::{ActionLogRepository, MajorRepository, SubjectRepository};

pub struct ConfigApi {
    config_manager: Arc<ConfigManager>,
    major_repo: Arc<MajorRepository>,
    subject_repo: Arc<SubjectRepository>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl ConfigApi {
    pub fn new(
        config_manager: Arc<ConfigManager>,
        major_repo: Arc<MajorRepository>,
        subject_repo: Arc<SubjectRepository>,
        action_log_repo: Arc<ActionLogRepository>,
    ) -> Self {
        Self {
            config_manager,
            major_repo,
            subject_repo,
            action_log_repo,
        }
    }

    /// Effective global quota percentage (40 when unset or invalid)
    pub async fn get_quota_percentage(&self) -> ApiResult<f64> {
        Ok(self.config_manager.get_quota_percentage().await?)
    }

    pub async fn get_ranking_config(&self) -> ApiResult<RankingConfig> {
        Ok(self.config_manager.load_ranking_config().await?)
    }

    pub fn list_configs(&self) -> ApiResult<BTreeMap<String, String>> {
        Ok(self.config_manager.list_global_configs()?)
    }

    pub fn set_quota_percentage(&self, pct: f64, actor: &str) -> ApiResult<()> {
        if !is_valid_percentage(pct) {
            return Err(ApiError::InvalidInput(format!(
                "quota percentage {} is outside 0..=100",
                pct
            )));
        }

        let old = self
            .config_manager
            .get_global_config_value(config_keys::QUOTA_PERCENTAGE)?;
        self.config_manager
            .set_global_config_value(config_keys::QUOTA_PERCENTAGE, &pct.to_string())?;

        self.action_log_repo.insert(&ActionLog::new(
            ActionType::UpdateQuota,
            actor,
            Some(json!({ "old_value": old, "new_value": pct })),
            None,
        ))?;

        info!(quota_percentage = pct, actor, "global quota percentage updated");
        Ok(())
    }

    /// Set (Some) or clear (None) a major's own quota percentage
    pub fn set_major_quota_override(
        &self,
        major_id: i64,
        pct: Option<f64>,
        actor: &str,
    ) -> ApiResult<()> {
        if let Some(p) = pct {
            if !is_valid_percentage(p) {
                return Err(ApiError::InvalidInput(format!(
                    "quota percentage {} is outside 0..=100",
                    p
                )));
            }
        }

        self.major_repo.set_quota_override(major_id, pct)?;

        self.action_log_repo.insert(&ActionLog::new(
            ActionType::UpdateMajorQuota,
            actor,
            Some(json!({ "major_id": major_id, "quota_percentage": pct })),
            None,
        ))?;
        Ok(())
    }

    pub fn set_run_atomicity(&self, atomicity: RunAtomicity, actor: &str) -> ApiResult<()> {
        self.config_manager
            .set_global_config_value(config_keys::RANKING_ATOMICITY, &atomicity.to_string())?;

        self.action_log_repo.insert(&ActionLog::new(
            ActionType::UpdateAtomicity,
            actor,
            Some(json!({ "atomicity": atomicity.to_string() })),
            None,
        ))?;
        Ok(())
    }

    pub fn list_subjects(&self) -> ApiResult<Vec<Subject>> {
        Ok(self.subject_repo.list_all()?)
    }

    /// Flag a subject as counted (or not) in the priority tie-break sum
    pub fn set_subject_priority(
        &self,
        subject_code: &str,
        is_priority: bool,
        actor: &str,
    ) -> ApiResult<()> {
        let subject = self
            .subject_repo
            .find_by_code(subject_code)?
            .ok_or_else(|| ApiError::NotFound(format!("Subject(code={})", subject_code)))?;

        self.subject_repo.set_priority(subject.subject_id, is_priority)?;

        self.action_log_repo.insert(&ActionLog::new(
            ActionType::UpdateSubjectPriority,
            actor,
            Some(json!({ "subject_code": subject_code, "is_priority": is_priority })),
            None,
        ))?;
        Ok(())
    }
}
