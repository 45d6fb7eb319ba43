// ==========================================
// Si-Eligible - export layer
// ==========================================

pub mod ranking_export;

pub use ranking_export::{ExportError, ExportResult, RankingCsvExporter, EXPORT_HEADERS};
