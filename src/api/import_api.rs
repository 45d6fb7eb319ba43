// ==========================================
// Si-Eligible - import API
// ==========================================

use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use crate::api::error::ApiResult;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::importer::{ImportSummary, RosterImporter};
use crate::repository::ActionLogRepository;

pub struct ImportApi {
    importer: Arc<RosterImporter>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl ImportApi {
    pub fn new(importer: Arc<RosterImporter>, action_log_repo: Arc<ActionLogRepository>) -> Self {
        Self {
            importer,
            action_log_repo,
        }
    }

    pub fn import_students<P: AsRef<Path>>(&self, path: P, actor: &str) -> ApiResult<ImportSummary> {
        let path = path.as_ref();
        let summary = self.importer.import_students(path)?;
        self.log(ActionType::ImportStudents, actor, path, &summary)?;
        Ok(summary)
    }

    pub fn import_grades<P: AsRef<Path>>(&self, path: P, actor: &str) -> ApiResult<ImportSummary> {
        let path = path.as_ref();
        let summary = self.importer.import_grades(path)?;
        self.log(ActionType::ImportGrades, actor, path, &summary)?;
        Ok(summary)
    }

    fn log(
        &self,
        action_type: ActionType,
        actor: &str,
        path: &Path,
        summary: &ImportSummary,
    ) -> ApiResult<()> {
        self.action_log_repo.insert(&ActionLog::new(
            action_type,
            actor,
            Some(json!({
                "file": path.display().to_string(),
                "total_rows": summary.total_rows,
                "imported": summary.imported,
                "rejected": summary.rejected,
            })),
            None,
        ))?;
        Ok(())
    }
}
