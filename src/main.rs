// ==========================================
// Si-Eligible - command line entry point
// ==========================================
// Usage:
//   si-eligible init
//   si-eligible rank
//   si-eligible import-students <file>
//   si-eligible import-grades <file>
//   si-eligible export <file> [--eligible-only]
//   si-eligible recalc-averages
//   si-eligible set-quota <percentage>
//   si-eligible log [limit]
//
// Database: $SI_ELIGIBLE_DB or the platform data directory
// ==========================================

use anyhow::{bail, Context, Result};
use si_eligible::app::{get_default_db_path, AppState};
use si_eligible::importer::ImportSummary;
use si_eligible::logging;

const USAGE: &str = "usage: si-eligible <init|rank|import-students <file>|import-grades <file>|\
export <file> [--eligible-only]|recalc-averages|set-quota <pct>|log [limit]>";

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        bail!(USAGE);
    };

    let db_path = get_default_db_path();
    tracing::info!(version = si_eligible::VERSION, db_path = %db_path, "{}", si_eligible::APP_NAME);

    let state = AppState::new(&db_path)
        .with_context(|| format!("cannot open database {}", db_path))?;
    let actor = current_actor();

    match command {
        "init" => {
            println!("database ready: {}", state.db_path);
        }
        "rank" => {
            let summary = state.ranking_api.compute_rankings(&actor).await?;
            println!(
                "run {}: {} majors, {} students ranked, {} eligible",
                summary.run_id, summary.majors_processed, summary.students_ranked, summary.eligible_count
            );
        }
        "import-students" => {
            let file = file_arg(&args)?;
            let summary = state.import_api.import_students(file, &actor)?;
            print_import_summary("students", &summary);
        }
        "import-grades" => {
            let file = file_arg(&args)?;
            let summary = state.import_api.import_grades(file, &actor)?;
            print_import_summary("grades", &summary);
        }
        "export" => {
            let file = file_arg(&args)?;
            let eligible_only = args.iter().skip(2).any(|a| a == "--eligible-only");
            let rows = state
                .ranking_api
                .export_rankings_to_path(file, eligible_only, &actor)?;
            println!("{} rows written to {}", rows, file);
        }
        "recalc-averages" => {
            let updated = state.student_api.recalculate_average_scores(&actor)?;
            println!("{} student averages updated", updated);
        }
        "set-quota" => {
            let raw = args.get(1).context("missing quota percentage")?;
            let pct: f64 = raw
                .parse()
                .with_context(|| format!("not a number: {}", raw))?;
            state.config_api.set_quota_percentage(pct, &actor)?;
            println!("quota percentage set to {}", pct);
        }
        "log" => {
            let limit = match args.get(1) {
                Some(raw) => raw.parse::<i64>().with_context(|| format!("not a number: {}", raw))?,
                None => 20,
            };
            for entry in state.action_log_repo.list_recent(limit)? {
                println!(
                    "{}  {:<24} {:<12} {}",
                    entry.action_ts,
                    entry.action_type,
                    entry.actor,
                    entry.payload_json.map(|p| p.to_string()).unwrap_or_default()
                );
            }
        }
        other => bail!("unknown command '{}'\n{}", other, USAGE),
    }

    Ok(())
}

fn file_arg(args: &[String]) -> Result<&str> {
    args.get(1)
        .map(String::as_str)
        .context("missing file argument")
}

fn current_actor() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "cli".to_string())
}

fn print_import_summary(kind: &str, summary: &ImportSummary) {
    println!(
        "{}: {} rows, {} imported, {} rejected",
        kind, summary.total_rows, summary.imported, summary.rejected
    );
    for error in &summary.errors {
        println!("  row {}: {}", error.row, error.message);
    }
}
