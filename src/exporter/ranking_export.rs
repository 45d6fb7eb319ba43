// ==========================================
// Si-Eligible - ranking CSV export
// ==========================================
// Columns: ranking, nisn, name, major_code, average_score, priority_score, eligible
// Row order is whatever the caller passes (major code, then ranking)
// ==========================================

use crate::domain::ranking::RankingExportRow;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

pub const EXPORT_HEADERS: [&str; 7] = [
    "ranking",
    "nisn",
    "name",
    "major_code",
    "average_score",
    "priority_score",
    "eligible",
];

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("export file write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;

pub struct RankingCsvExporter;

impl RankingCsvExporter {
    /// Write header + rows, returns the number of data rows
    pub fn write<W: Write>(&self, rows: &[RankingExportRow], writer: W) -> ExportResult<usize> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);

        csv_writer.write_record(EXPORT_HEADERS)?;
        for row in rows {
            csv_writer.write_record([
                row.ranking.to_string(),
                row.nisn.clone(),
                row.name.clone(),
                row.major_code.clone(),
                row.average_score.map(format_score).unwrap_or_default(),
                format_score(row.priority_score),
                row.eligible.to_string(),
            ])?;
        }
        csv_writer.flush()?;
        Ok(rows.len())
    }

    pub fn write_to_path<P: AsRef<Path>>(&self, rows: &[RankingExportRow], path: P) -> ExportResult<usize> {
        let file = File::create(path)?;
        self.write(rows, file)
    }
}

fn format_score(score: f64) -> String {
    format!("{:.2}", score)
}
