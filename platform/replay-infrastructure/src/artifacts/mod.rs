use crate::reporting;
use crate::statements;
use replay_domain::repositories::artifacts::{ArtifactReader, ArtifactWriter};
use replay_domain::repositories::statement::{
    StatementFormat, StatementQuery, StatementReport, StatementSource,
};
use replay_domain::services::audit::AuditEvent;
use replay_domain::services::replay::ReplaySummary;
use replay_domain::value_objects::ledger::LedgerEvent;
use replay_domain::value_objects::series::SeriesTrade;
use replay_domain::value_objects::statement::StatementRecord;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Clone, Copy)]
pub struct FilesystemStatementSource;

impl FilesystemStatementSource {
    pub fn new() -> Self {
        Self
    }
}

impl StatementSource for FilesystemStatementSource {
    fn load_statement(
        &self,
        query: &StatementQuery,
    ) -> Result<(Vec<StatementRecord>, StatementReport), String> {
        match query.format {
            StatementFormat::Html => statements::load_html(query.path.as_path()),
            StatementFormat::Csv => statements::load_csv(query.path.as_path()),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FilesystemArtifactWriter;

impl FilesystemArtifactWriter {
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactWriter for FilesystemArtifactWriter {
    fn ensure_dir(&self, path: &Path) -> Result<(), String> {
        fs::create_dir_all(path)
            .map_err(|err| format!("failed to create dir {}: {}", path.display(), err))
    }

    fn write_series_csv(&self, path: &Path, series: &[SeriesTrade]) -> Result<(), String> {
        reporting::write_series_csv(path, series)
    }

    fn write_ledger_csv(&self, path: &Path, events: &[LedgerEvent]) -> Result<(), String> {
        reporting::write_ledger_csv(path, events)
    }

    fn write_ledger_sheet(&self, path: &Path, events: &[LedgerEvent]) -> Result<(), String> {
        reporting::write_ledger_sheet(path, events)
    }

    fn write_summary_json(
        &self,
        path: &Path,
        summary: &ReplaySummary,
        meta: Option<&serde_json::Value>,
        config_snapshot: Option<&serde_json::Value>,
    ) -> Result<(), String> {
        reporting::write_summary_json(path, summary, meta, config_snapshot)
    }

    fn write_charts_html(
        &self,
        path: &Path,
        series: &[SeriesTrade],
        events: &[LedgerEvent],
        summary: &ReplaySummary,
        meta: Option<&serde_json::Value>,
    ) -> Result<(), String> {
        reporting::write_charts_html(path, series, events, summary, meta)
    }

    fn write_audit_jsonl(&self, path: &Path, events: &[AuditEvent]) -> Result<(), String> {
        reporting::write_audit_jsonl(path, events)
    }

    fn write_config_snapshot_toml(&self, path: &Path, contents: &str) -> Result<(), String> {
        reporting::write_config_snapshot_toml(path, contents)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FilesystemArtifactReader;

impl FilesystemArtifactReader {
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactReader for FilesystemArtifactReader {
    fn read_series_csv(&self, path: &Path) -> Result<Vec<SeriesTrade>, String> {
        reporting::read_series_csv(path)
    }

    fn read_ledger_csv(&self, path: &Path) -> Result<Vec<LedgerEvent>, String> {
        reporting::read_ledger_csv(path)
    }

    fn read_config_snapshot_toml(&self, path: &Path) -> Result<Option<String>, String> {
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(path)
            .map(Some)
            .map_err(|err| format!("failed to read {}: {}", path.display(), err))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}
