// ==========================================
// Si-Eligible - ranking API
// ==========================================
// Trigger a ranking run, query its results, export the partner list
// ==========================================

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::major::Major;
use crate::domain::ranking::{RankingExportRow, RankingRun, RankingRunSummary};
use crate::engine::RankingOrchestrator;
use crate::exporter::RankingCsvExporter;
use crate::repository::{
    ActionLogRepository, MajorRepository, RankingRepository, RankingRunRepository,
};

pub struct RankingApi {
    orchestrator: Arc<RankingOrchestrator<ConfigManager>>,
    major_repo: Arc<MajorRepository>,
    ranking_repo: Arc<RankingRepository>,
    run_repo: Arc<RankingRunRepository>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl RankingApi {
    pub fn new(
        orchestrator: Arc<RankingOrchestrator<ConfigManager>>,
        major_repo: Arc<MajorRepository>,
        ranking_repo: Arc<RankingRepository>,
        run_repo: Arc<RankingRunRepository>,
        action_log_repo: Arc<ActionLogRepository>,
    ) -> Self {
        Self {
            orchestrator,
            major_repo,
            ranking_repo,
            run_repo,
            action_log_repo,
        }
    }

    /// Recompute rankings for all majors
    ///
    /// # Errors
    /// - RankingInProgress: another run has not finished yet
    pub async fn compute_rankings(&self, actor: &str) -> ApiResult<RankingRunSummary> {
        Ok(self.orchestrator.compute_rankings(actor).await?)
    }

    pub fn is_ranking_running(&self) -> bool {
        self.orchestrator.is_running()
    }

    /// Majors with their last-run total_students / quota_count
    pub fn list_majors(&self) -> ApiResult<Vec<Major>> {
        Ok(self.major_repo.list_all()?)
    }

    pub fn latest_run(&self) -> ApiResult<Option<RankingRun>> {
        Ok(self.run_repo.find_latest()?)
    }

    pub fn get_run(&self, run_id: &str) -> ApiResult<RankingRun> {
        self.run_repo
            .find_by_id(run_id)?
            .ok_or_else(|| ApiError::NotFound(format!("RankingRun(id={})", run_id)))
    }

    pub fn list_ranking_rows(&self, eligible_only: bool) -> ApiResult<Vec<RankingExportRow>> {
        Ok(self.ranking_repo.list_export_rows(eligible_only)?)
    }

    /// Write the ranking CSV, returns the number of data rows
    pub fn export_rankings<W: Write>(
        &self,
        writer: W,
        eligible_only: bool,
        actor: &str,
    ) -> ApiResult<usize> {
        let rows = self.ranking_repo.list_export_rows(eligible_only)?;
        let written = RankingCsvExporter.write(&rows, writer)?;
        self.log_export(actor, eligible_only, written, None)?;
        Ok(written)
    }

    pub fn export_rankings_to_path<P: AsRef<Path>>(
        &self,
        path: P,
        eligible_only: bool,
        actor: &str,
    ) -> ApiResult<usize> {
        let path = path.as_ref();
        let rows = self.ranking_repo.list_export_rows(eligible_only)?;
        let written = RankingCsvExporter.write_to_path(&rows, path)?;
        self.log_export(actor, eligible_only, written, Some(path))?;
        Ok(written)
    }

    fn log_export(
        &self,
        actor: &str,
        eligible_only: bool,
        rows: usize,
        path: Option<&Path>,
    ) -> ApiResult<()> {
        self.action_log_repo.insert(&ActionLog::new(
            ActionType::ExportRankings,
            actor,
            Some(json!({ "eligible_only": eligible_only, "rows": rows })),
            path.map(|p| p.display().to_string()),
        ))?;
        Ok(())
    }
}
