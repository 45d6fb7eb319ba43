// ==========================================
// Si-Eligible - student / grade importer
// ==========================================
// Flow: parse file -> check columns -> validate rows -> persist in one tx
// Invalid rows are rejected and reported, valid rows are written
// ==========================================

use crate::domain::student::{is_valid_score, is_valid_semester, MAX_SEMESTER, MIN_SEMESTER};
use crate::importer::error::ImportResult;
use crate::importer::file_parser::{ParsedSheet, RawRecord, UniversalFileParser};
use crate::repository::{GradeImportRow, StudentImportRepository, StudentImportRow};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub mod columns {
    pub const NISN: &str = "nisn";
    pub const NAME: &str = "name";
    pub const MAJOR: &str = "major";
    pub const AVERAGE_SCORE: &str = "average_score";
    pub const SUBJECT: &str = "subject";
    pub const SEMESTER: &str = "semester";
    pub const SCORE: &str = "score";
}

/// One rejected row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub total_rows: usize,
    pub imported: usize,
    pub rejected: usize,
    pub errors: Vec<RowError>,
}

// ==========================================
// RosterImporter
// ==========================================
pub struct RosterImporter {
    repo: Arc<StudentImportRepository>,
    parser: UniversalFileParser,
}

impl RosterImporter {
    pub fn new(repo: Arc<StudentImportRepository>) -> Self {
        Self {
            repo,
            parser: UniversalFileParser,
        }
    }

    /// Import a student roster (nisn, name, [major], [average_score])
    #[instrument(skip(self, file_path), fields(file = %file_path.as_ref().display()))]
    pub fn import_students<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<ImportSummary> {
        let sheet = self.parser.parse(file_path.as_ref())?;
        sheet.require_columns(&[columns::NISN, columns::NAME])?;

        let (rows, errors) = validate_student_records(&sheet);
        let imported = if rows.is_empty() {
            0
        } else {
            self.repo.import_students(&rows)?
        };

        let summary = summarize(&sheet, imported, errors);
        info!(
            total_rows = summary.total_rows,
            imported = summary.imported,
            rejected = summary.rejected,
            "student import finished"
        );
        Ok(summary)
    }

    /// Import grades (nisn, subject, semester, score); NISNs must already exist
    #[instrument(skip(self, file_path), fields(file = %file_path.as_ref().display()))]
    pub fn import_grades<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<ImportSummary> {
        let sheet = self.parser.parse(file_path.as_ref())?;
        sheet.require_columns(&[
            columns::NISN,
            columns::SUBJECT,
            columns::SEMESTER,
            columns::SCORE,
        ])?;

        let known = self.repo.known_nisns()?;
        let (rows, errors) = validate_grade_records(&sheet, &known);
        let imported = if rows.is_empty() {
            0
        } else {
            self.repo.import_grades(&rows)?
        };

        let summary = summarize(&sheet, imported, errors);
        info!(
            total_rows = summary.total_rows,
            imported = summary.imported,
            rejected = summary.rejected,
            "grade import finished"
        );
        Ok(summary)
    }
}

fn summarize(sheet: &ParsedSheet, imported: usize, errors: Vec<RowError>) -> ImportSummary {
    for e in &errors {
        warn!(row = e.row, reason = %e.message, "import row rejected");
    }
    ImportSummary {
        total_rows: sheet.records.len(),
        imported,
        rejected: errors.len(),
        errors,
    }
}

// ==========================================
// Row validation
// ==========================================

fn required<'a>(record: &'a RawRecord, column: &str) -> Result<&'a str, RowError> {
    record.get(column).ok_or_else(|| RowError {
        row: record.row,
        message: format!("{} is empty", column),
    })
}

fn parse_score(record: &RawRecord, column: &str, raw: &str) -> Result<f64, RowError> {
    match raw.parse::<f64>() {
        Ok(score) if is_valid_score(score) => Ok(score),
        Ok(score) => Err(RowError {
            row: record.row,
            message: format!("{} {} is outside 0..=100", column, score),
        }),
        Err(_) => Err(RowError {
            row: record.row,
            message: format!("{} '{}' is not a number", column, raw),
        }),
    }
}

/// Excel hands integers back as "3" or "3.0"
fn parse_semester(record: &RawRecord, raw: &str) -> Result<i32, RowError> {
    let parsed = raw
        .parse::<i32>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().filter(|f| f.fract() == 0.0).map(|f| f as i32));

    match parsed {
        Some(semester) if is_valid_semester(semester) => Ok(semester),
        _ => Err(RowError {
            row: record.row,
            message: format!(
                "semester '{}' is outside {}..={}",
                raw, MIN_SEMESTER, MAX_SEMESTER
            ),
        }),
    }
}

fn student_row(record: &RawRecord) -> Result<StudentImportRow, RowError> {
    let nisn = required(record, columns::NISN)?;
    let name = required(record, columns::NAME)?;
    let average_score = record
        .get(columns::AVERAGE_SCORE)
        .map(|raw| parse_score(record, columns::AVERAGE_SCORE, raw))
        .transpose()?;

    Ok(StudentImportRow {
        nisn: nisn.to_string(),
        name: name.to_string(),
        major_code: record.get(columns::MAJOR).map(str::to_string),
        average_score,
    })
}

fn grade_row(record: &RawRecord, known_nisns: &HashSet<String>) -> Result<GradeImportRow, RowError> {
    let nisn = required(record, columns::NISN)?;
    if !known_nisns.contains(nisn) {
        return Err(RowError {
            row: record.row,
            message: format!("unknown nisn {}", nisn),
        });
    }
    let subject = required(record, columns::SUBJECT)?;
    let semester = parse_semester(record, required(record, columns::SEMESTER)?)?;
    let score = parse_score(record, columns::SCORE, required(record, columns::SCORE)?)?;

    Ok(GradeImportRow {
        nisn: nisn.to_string(),
        subject_code: subject.to_string(),
        semester,
        score,
    })
}

pub fn validate_student_records(sheet: &ParsedSheet) -> (Vec<StudentImportRow>, Vec<RowError>) {
    partition(sheet.records.iter().map(student_row))
}

pub fn validate_grade_records(
    sheet: &ParsedSheet,
    known_nisns: &HashSet<String>,
) -> (Vec<GradeImportRow>, Vec<RowError>) {
    partition(sheet.records.iter().map(|r| grade_row(r, known_nisns)))
}

fn partition<T>(results: impl Iterator<Item = Result<T, RowError>>) -> (Vec<T>, Vec<RowError>) {
    let mut ok = Vec::new();
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(row) => ok.push(row),
            Err(e) => errors.push(e),
        }
    }
    (ok, errors)
}
