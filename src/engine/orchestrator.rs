// ==========================================
// Si-Eligible - ranking run orchestrator
// ==========================================
// compute_rankings():
//   1. acquire the run guard (one run at a time)
//   2. load config, open a ranking_run record
//   3. rank every major, persist per atomicity mode
//   4. close the run record, write the action log
// ==========================================

use crate::config::{RankingConfig, RankingConfigReader};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::major::Major;
use crate::domain::ranking::{MajorRankingOutcome, RankingCandidate, RankingRun, RankingRunSummary};
use crate::domain::types::{RunAtomicity, RunStatus};
use crate::engine::error::{RankingError, RankingResult};
use crate::engine::ranking::RankingEngine;
use crate::engine::ranking_core::RankingCore;
use crate::engine::repositories::RankingRepositories;
use crate::repository::RunCounters;
use chrono::Utc;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// RunGuard - released on drop, including on error paths
// ==========================================
struct RunGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> RankingResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| RankingError::AlreadyRunning)?;
        Ok(Self { flag })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

// ==========================================
// RankingOrchestrator
// ==========================================
pub struct RankingOrchestrator<C>
where
    C: RankingConfigReader,
{
    config: Arc<C>,
    repos: RankingRepositories,
    engine: RankingEngine,
    running: AtomicBool,
}

impl<C> RankingOrchestrator<C>
where
    C: RankingConfigReader,
{
    pub fn new(config: Arc<C>, repos: RankingRepositories) -> Self {
        Self {
            config,
            repos,
            engine: RankingEngine::new(),
            running: AtomicBool::new(false),
        }
    }

    /// True while a compute_rankings() call is in flight
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Recompute ranking and eligibility for every major
    ///
    /// # Errors
    /// - AlreadyRunning: another run holds the guard, nothing is touched
    /// - Repository / InvalidOutcome: the run record is closed as FAILED;
    ///   in WHOLE_RUN mode no major is updated, in PER_MAJOR mode majors
    ///   persisted before the failure stay updated
    #[instrument(skip(self))]
    pub async fn compute_rankings(&self, actor: &str) -> RankingResult<RankingRunSummary> {
        let _guard = RunGuard::acquire(&self.running)?;
        let started = Instant::now();

        let config = self.config.load_ranking_config().await?;
        let run_id = Uuid::new_v4().to_string();
        self.repos.run_repo.insert(&RankingRun {
            run_id: run_id.clone(),
            started_at: Utc::now().naive_utc(),
            finished_at: None,
            status: RunStatus::Running,
            atomicity: config.atomicity,
            majors_processed: 0,
            students_ranked: 0,
            eligible_count: 0,
            config_snapshot_json: serde_json::to_string(&config).ok(),
            error_message: None,
            triggered_by: actor.to_string(),
        })?;

        info!(
            run_id = %run_id,
            quota_percentage = config.quota_percentage,
            atomicity = %config.atomicity,
            "ranking run started"
        );

        let mut counters = RunCounters::default();
        let result = match config.atomicity {
            RunAtomicity::WholeRun => self.run_whole(&config, &mut counters),
            RunAtomicity::PerMajor => self.run_per_major(&config, &mut counters),
        };
        let finished_at = Utc::now().naive_utc();

        if let Err(e) = result {
            let message = e.to_string();
            if let Err(finish_err) = self.repos.run_repo.finish(
                &run_id,
                RunStatus::Failed,
                finished_at,
                counters,
                Some(&message),
            ) {
                warn!(run_id = %run_id, error = %finish_err, "could not mark ranking run as failed");
            }
            error!(
                run_id = %run_id,
                majors_processed = counters.majors_processed,
                error = %message,
                "ranking run failed"
            );
            return Err(e);
        }

        self.repos
            .run_repo
            .finish(&run_id, RunStatus::Completed, finished_at, counters, None)?;

        let summary = RankingRunSummary {
            run_id: run_id.clone(),
            majors_processed: counters.majors_processed as usize,
            students_ranked: counters.students_ranked as usize,
            eligible_count: counters.eligible_count as usize,
        };

        let log = ActionLog::new(
            ActionType::ComputeRankings,
            actor,
            Some(json!({
                "run_id": run_id,
                "atomicity": config.atomicity.to_string(),
                "quota_percentage": config.quota_percentage,
                "majors_processed": summary.majors_processed,
                "students_ranked": summary.students_ranked,
                "eligible_count": summary.eligible_count,
            })),
            None,
        );
        // rankings are already committed at this point
        if let Err(e) = self.repos.action_log_repo.insert(&log) {
            warn!(run_id = %run_id, error = %e, "could not write action log for ranking run");
        }

        info!(
            run_id = %run_id,
            majors_processed = summary.majors_processed,
            students_ranked = summary.students_ranked,
            eligible_count = summary.eligible_count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "ranking run completed"
        );

        Ok(summary)
    }

    /// Every major read, ranked and written in one transaction
    fn run_whole(&self, config: &RankingConfig, counters: &mut RunCounters) -> RankingResult<()> {
        let outcomes = self
            .repos
            .ranking_repo
            .rank_whole_run(|major, candidates| self.rank_one(major, candidates, config))?;

        for outcome in &outcomes {
            tally(counters, outcome);
        }
        Ok(())
    }

    /// One transaction per major, stops at the first failure
    fn run_per_major(&self, config: &RankingConfig, counters: &mut RunCounters) -> RankingResult<()> {
        let majors = self.repos.major_repo.list_all()?;
        self.repos.ranking_repo.clear_unassigned()?;

        for major in &majors {
            let outcome = self
                .repos
                .ranking_repo
                .rank_major(major, |major, candidates| self.rank_one(major, candidates, config))?;
            tally(counters, &outcome);
        }
        Ok(())
    }

    fn rank_one(
        &self,
        major: &Major,
        candidates: Vec<RankingCandidate>,
        config: &RankingConfig,
    ) -> RankingResult<MajorRankingOutcome> {
        let outcome = self.engine.rank_major(major, candidates, config);

        RankingCore::verify_dense(&outcome.ranked).map_err(|message| {
            RankingError::InvalidOutcome {
                major_code: major.code.clone(),
                message,
            }
        })?;

        Ok(outcome)
    }
}

fn tally(counters: &mut RunCounters, outcome: &MajorRankingOutcome) {
    counters.majors_processed += 1;
    counters.students_ranked += outcome.total_students;
    counters.eligible_count += outcome.eligible_count() as i64;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{config_keys, ConfigManager};
    use crate::repository::{ActionLogRepository, MajorRepository, StudentRepository};
    use rusqlite::Connection;
    use std::sync::Mutex;

    fn setup() -> (Arc<Mutex<Connection>>, RankingOrchestrator<ConfigManager>) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        let config = Arc::new(ConfigManager::from_connection(conn.clone()));
        let orchestrator =
            RankingOrchestrator::new(config, RankingRepositories::from_connection(conn.clone()));
        (conn, orchestrator)
    }

    fn seed_major(conn: &Arc<Mutex<Connection>>, code: &str, averages: &[f64]) -> i64 {
        let majors = MajorRepository::new(conn.clone());
        let students = StudentRepository::new(conn.clone());
        let major_id = majors.create(&Major::new(code, code)).unwrap();
        for (i, avg) in averages.iter().enumerate() {
            let nisn = format!("{}{:04}", code, i);
            students
                .create(&nisn, &nisn, Some(major_id), Some(*avg))
                .unwrap();
        }
        major_id
    }

    #[test]
    fn test_run_guard_is_exclusive_and_released_on_drop() {
        let flag = AtomicBool::new(false);
        let first = RunGuard::acquire(&flag).unwrap();
        assert!(matches!(
            RunGuard::acquire(&flag),
            Err(RankingError::AlreadyRunning)
        ));
        drop(first);
        assert!(RunGuard::acquire(&flag).is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_run_is_rejected_without_side_effects() {
        let (conn, orchestrator) = setup();
        seed_major(&conn, "TKJ", &[90.0, 80.0]);

        orchestrator.running.store(true, Ordering::Release);
        let err = orchestrator.compute_rankings("tester").await.unwrap_err();
        assert!(matches!(err, RankingError::AlreadyRunning));

        let runs = crate::repository::RankingRunRepository::new(conn.clone());
        assert!(runs.find_latest().unwrap().is_none());
        orchestrator.running.store(false, Ordering::Release);
    }

    #[tokio::test]
    async fn test_compute_rankings_records_run_and_action_log() {
        let (conn, orchestrator) = setup();
        seed_major(&conn, "TKJ", &[90.0, 85.0, 80.0, 75.0, 70.0]);
        seed_major(&conn, "AKL", &[88.0, 77.0]);

        let summary = orchestrator.compute_rankings("admin").await.unwrap();
        assert_eq!(summary.majors_processed, 2);
        assert_eq!(summary.students_ranked, 7);
        // floor(5 * 0.4) + floor(2 * 0.4)
        assert_eq!(summary.eligible_count, 2);
        assert!(!orchestrator.is_running());

        let runs = crate::repository::RankingRunRepository::new(conn.clone());
        let run = runs.find_by_id(&summary.run_id).unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.students_ranked, 7);
        assert_eq!(run.triggered_by, "admin");
        assert!(run.finished_at.is_some());

        let logs = ActionLogRepository::new(conn.clone());
        let entries = logs.find_by_action_type("COMPUTE_RANKINGS").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].actor, "admin");
    }

    #[tokio::test]
    async fn test_per_major_mode_is_read_from_config() {
        let (conn, orchestrator) = setup();
        seed_major(&conn, "TKJ", &[90.0, 85.0, 80.0]);
        ConfigManager::from_connection(conn.clone())
            .set_global_config_value(config_keys::RANKING_ATOMICITY, "PER_MAJOR")
            .unwrap();

        let summary = orchestrator.compute_rankings("admin").await.unwrap();
        let runs = crate::repository::RankingRunRepository::new(conn.clone());
        let run = runs.find_by_id(&summary.run_id).unwrap().unwrap();
        assert_eq!(run.atomicity, RunAtomicity::PerMajor);
        assert_eq!(summary.majors_processed, 1);
    }
}
