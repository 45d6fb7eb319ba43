// ==========================================
// Si-Eligible - file parsers
// ==========================================
// Excel (.xlsx/.xls) / CSV (.csv) -> header-keyed records
// Headers are trimmed and lowercased, cells are trimmed
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// One non-blank data row
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// 1-based line in the source file (header is line 1)
    pub row: usize,
    pub fields: HashMap<String, String>,
}

impl RawRecord {
    /// Trimmed cell, None when absent or empty
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .get(column)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Parsed sheet: normalised headers + data rows
#[derive(Debug, Clone, Default)]
pub struct ParsedSheet {
    pub headers: Vec<String>,
    pub records: Vec<RawRecord>,
}

impl ParsedSheet {
    /// Fail on the first required column not present in the header row
    pub fn require_columns(&self, columns: &[&str]) -> ImportResult<()> {
        for column in columns {
            if !self.headers.iter().any(|h| h == column) {
                return Err(ImportError::MissingColumn((*column).to_string()));
            }
        }
        Ok(())
    }
}

pub trait FileParser {
    fn parse(&self, file_path: &Path) -> ImportResult<ParsedSheet>;
}

fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn build_sheet<I, R>(headers: Vec<String>, rows: I) -> ParsedSheet
where
    I: Iterator<Item = R>,
    R: IntoIterator<Item = String>,
{
    let mut records = Vec::new();
    for (idx, row) in rows.enumerate() {
        let mut fields = HashMap::new();
        for (col_idx, value) in row.into_iter().enumerate() {
            if let Some(header) = headers.get(col_idx) {
                fields.insert(header.clone(), value.trim().to_string());
            }
        }

        if fields.values().all(|v| v.is_empty()) {
            continue;
        }

        records.push(RawRecord { row: idx + 2, fields });
    }

    ParsedSheet { headers, records }
}

// ==========================================
// CsvParser
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse(&self, file_path: &Path) -> ImportResult<ParsedSheet> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let headers: Vec<String> = reader.headers()?.iter().map(normalize_header).collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        Ok(build_sheet(headers, rows.into_iter()))
    }
}

// ==========================================
// ExcelParser - first worksheet only
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse(&self, file_path: &Path) -> ImportResult<ParsedSheet> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("workbook has no worksheet".to_string()))?;
        let range = workbook.worksheet_range(&sheet_name)?;

        let mut rows = range.rows();
        let header_row = rows
            .next()
            .ok_or_else(|| ImportError::ExcelParseError("worksheet is empty".to_string()))?;
        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| normalize_header(&cell.to_string()))
            .collect();

        let data = rows.map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<_>>());
        Ok(build_sheet(headers, data))
    }
}

// ==========================================
// UniversalFileParser - dispatch on extension
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<ParsedSheet> {
        let path = file_path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvParser.parse(path),
            "xlsx" | "xls" => ExcelParser.parse(path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn csv_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_csv_headers_are_normalised_and_blank_rows_skipped() {
        let file = csv_file(" NISN ,Name,Major\n001, Ani ,TKJ\n,,\n002,Budi,\n");
        let sheet = UniversalFileParser.parse(file.path()).unwrap();

        assert_eq!(sheet.headers, vec!["nisn", "name", "major"]);
        assert_eq!(sheet.records.len(), 2);
        assert_eq!(sheet.records[0].get("name"), Some("Ani"));
        assert_eq!(sheet.records[0].row, 2);
        assert_eq!(sheet.records[1].row, 4);
        assert_eq!(sheet.records[1].get("major"), None);
    }

    #[test]
    fn test_require_columns() {
        let file = csv_file("nisn,nama\n001,Ani\n");
        let sheet = CsvParser.parse(file.path()).unwrap();
        assert!(sheet.require_columns(&["nisn"]).is_ok());
        assert!(matches!(
            sheet.require_columns(&["nisn", "name"]),
            Err(ImportError::MissingColumn(c)) if c == "name"
        ));
    }

    #[test]
    fn test_unsupported_and_missing_files() {
        assert!(matches!(
            UniversalFileParser.parse("students.txt"),
            Err(ImportError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            UniversalFileParser.parse("/nonexistent/students.csv"),
            Err(ImportError::FileNotFound(_))
        ));
    }
}
