// ==========================================
// Si-Eligible - repositories used by the ranking run
// ==========================================

use std::sync::Arc;

use crate::repository::{
    ActionLogRepository, MajorRepository, RankingRepository, RankingRunRepository,
};

/// Repositories a ranking run reads and writes
///
/// All of them share one connection, so no two guards may be held at once.
/// Ranking closures run under the RankingRepository guard and stay pure.
#[derive(Clone)]
pub struct RankingRepositories {
    pub major_repo: Arc<MajorRepository>,
    pub ranking_repo: Arc<RankingRepository>,
    pub run_repo: Arc<RankingRunRepository>,
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl RankingRepositories {
    pub fn new(
        major_repo: Arc<MajorRepository>,
        ranking_repo: Arc<RankingRepository>,
        run_repo: Arc<RankingRunRepository>,
        action_log_repo: Arc<ActionLogRepository>,
    ) -> Self {
        Self {
            major_repo,
            ranking_repo,
            run_repo,
            action_log_repo,
        }
    }

    /// Build every repository on one shared connection
    pub fn from_connection(conn: Arc<std::sync::Mutex<rusqlite::Connection>>) -> Self {
        Self::new(
            Arc::new(MajorRepository::new(conn.clone())),
            Arc::new(RankingRepository::new(conn.clone())),
            Arc::new(RankingRunRepository::new(conn.clone())),
            Arc::new(ActionLogRepository::new(conn)),
        )
    }
}
