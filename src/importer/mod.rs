// ==========================================
// Si-Eligible - import layer
// ==========================================
// Student rosters and grade sheets from CSV / Excel
// ==========================================

pub mod error;
pub mod file_parser;
pub mod roster_importer;

pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, FileParser, ParsedSheet, RawRecord, UniversalFileParser};
pub use roster_importer::{ImportSummary, RosterImporter, RowError};
