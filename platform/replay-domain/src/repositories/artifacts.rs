use crate::services::audit::AuditEvent;
use crate::services::replay::ReplaySummary;
use crate::value_objects::ledger::LedgerEvent;
use crate::value_objects::series::SeriesTrade;
use std::path::Path;

pub trait ArtifactWriter {
    fn ensure_dir(&self, path: &Path) -> Result<(), String>;
    fn write_series_csv(&self, path: &Path, series: &[SeriesTrade]) -> Result<(), String>;
    fn write_ledger_csv(&self, path: &Path, events: &[LedgerEvent]) -> Result<(), String>;
    /// Spreadsheet-style export: two blank rows, then header, then data.
    fn write_ledger_sheet(&self, path: &Path, events: &[LedgerEvent]) -> Result<(), String>;
    fn write_summary_json(
        &self,
        path: &Path,
        summary: &ReplaySummary,
        meta: Option<&serde_json::Value>,
        config_snapshot: Option<&serde_json::Value>,
    ) -> Result<(), String>;
    fn write_charts_html(
        &self,
        path: &Path,
        series: &[SeriesTrade],
        events: &[LedgerEvent],
        summary: &ReplaySummary,
        meta: Option<&serde_json::Value>,
    ) -> Result<(), String>;
    fn write_audit_jsonl(&self, path: &Path, events: &[AuditEvent]) -> Result<(), String>;
    fn write_config_snapshot_toml(&self, path: &Path, contents: &str) -> Result<(), String>;
}

pub trait ArtifactReader {
    fn read_series_csv(&self, path: &Path) -> Result<Vec<SeriesTrade>, String>;
    fn read_ledger_csv(&self, path: &Path) -> Result<Vec<LedgerEvent>, String>;
    fn read_config_snapshot_toml(&self, path: &Path) -> Result<Option<String>, String>;
    fn exists(&self, path: &Path) -> bool;
}
