// ==========================================
// Si-Eligible - application state
// ==========================================
// One shared SQLite connection, every repository / engine / API wired on it
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::api::{ConfigApi, DisputeApi, ImportApi, RankingApi, StudentApi};
use crate::config::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::{RankingOrchestrator, RankingRepositories};
use crate::importer::RosterImporter;
use crate::repository::error::RepositoryResult;
use crate::repository::{
    ActionLogRepository, GradeDisputeRepository, GradeRepository, MajorRepository,
    RankingRepository, RankingRunRepository, StudentImportRepository, StudentRepository,
    SubjectRepository,
};

/// Environment variable overriding the database location
pub const DB_PATH_ENV: &str = "SI_ELIGIBLE_DB";

pub struct AppState {
    pub db_path: String,

    pub ranking_api: Arc<RankingApi>,
    pub student_api: Arc<StudentApi>,
    pub dispute_api: Arc<DisputeApi>,
    pub config_api: Arc<ConfigApi>,
    pub import_api: Arc<ImportApi>,

    /// Audit trail, read by the CLI `log` output
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl AppState {
    /// Open (and if needed create) the database, then wire every layer
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        tracing::info!(db_path, "initialising application state");

        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;
        let conn = Arc::new(Mutex::new(conn));

        // ===== Repositories =====
        let major_repo = Arc::new(MajorRepository::new(conn.clone()));
        let student_repo = Arc::new(StudentRepository::new(conn.clone()));
        let subject_repo = Arc::new(SubjectRepository::new(conn.clone()));
        let grade_repo = Arc::new(GradeRepository::new(conn.clone()));
        let dispute_repo = Arc::new(GradeDisputeRepository::new(conn.clone()));
        let ranking_repo = Arc::new(RankingRepository::new(conn.clone()));
        let run_repo = Arc::new(RankingRunRepository::new(conn.clone()));
        let import_repo = Arc::new(StudentImportRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));
        let config_manager = Arc::new(ConfigManager::from_connection(conn));

        // ===== Engine =====
        let orchestrator = Arc::new(RankingOrchestrator::new(
            config_manager.clone(),
            RankingRepositories::new(
                major_repo.clone(),
                ranking_repo.clone(),
                run_repo.clone(),
                action_log_repo.clone(),
            ),
        ));

        // ===== APIs =====
        let ranking_api = Arc::new(RankingApi::new(
            orchestrator,
            major_repo.clone(),
            ranking_repo,
            run_repo,
            action_log_repo.clone(),
        ));
        let student_api = Arc::new(StudentApi::new(
            student_repo,
            grade_repo.clone(),
            subject_repo.clone(),
            major_repo.clone(),
            action_log_repo.clone(),
        ));
        let dispute_api = Arc::new(DisputeApi::new(
            dispute_repo,
            grade_repo,
            action_log_repo.clone(),
        ));
        let config_api = Arc::new(ConfigApi::new(
            config_manager,
            major_repo,
            subject_repo,
            action_log_repo.clone(),
        ));
        let import_api = Arc::new(ImportApi::new(
            Arc::new(RosterImporter::new(import_repo)),
            action_log_repo.clone(),
        ));

        Ok(Self {
            db_path: db_path.to_string(),
            ranking_api,
            student_api,
            dispute_api,
            config_api,
            import_api,
            action_log_repo,
        })
    }
}

/// Database path: $SI_ELIGIBLE_DB, else <data_dir>/si-eligible/si_eligible.db,
/// else ./si_eligible.db
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./si_eligible.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("si-eligible");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("si_eligible.db");
        }
    }
    path.to_string_lossy().to_string()
}
