use replay_domain::repositories::artifacts::{ArtifactReader, ArtifactWriter};
use replay_domain::services::replay::{summarize_events, ReplaySummary};
use std::path::Path;
use tracing::info_span;

pub struct ReportResult {
    pub run_id: String,
    pub summary: ReplaySummary,
}

/// Rebuilds `summary.json` and `charts.html` from the ledger and series
/// files already present in a run directory.
pub fn generate_report(
    input: &Path,
    reader: &dyn ArtifactReader,
    writer: &dyn ArtifactWriter,
) -> Result<ReportResult, String> {
    let _span = info_span!("generate_report", input = %input.display()).entered();

    let ledger_path = input.join("ledger.csv");
    if !reader.exists(ledger_path.as_path()) {
        return Err(format!("ledger.csv not found in {}", input.display()));
    }
    let events = reader.read_ledger_csv(ledger_path.as_path())?;

    let series_path = input.join("series.csv");
    let series = if reader.exists(series_path.as_path()) {
        reader.read_series_csv(series_path.as_path())?
    } else {
        Vec::new()
    };

    let run_id = run_id_from_snapshot(input, reader)?.unwrap_or_else(|| {
        input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string())
    });

    let summary = summarize_events(&events);
    let meta = serde_json::json!({
        "run_id": run_id,
        "start": summary.first_timestamp,
        "end": summary.last_timestamp,
    });

    writer.write_summary_json(
        input.join("summary.json").as_path(),
        &summary,
        Some(&meta),
        None,
    )?;
    writer.write_charts_html(
        input.join("charts.html").as_path(),
        &series,
        &events,
        &summary,
        Some(&meta),
    )?;

    Ok(ReportResult { run_id, summary })
}

fn run_id_from_snapshot(
    input: &Path,
    reader: &dyn ArtifactReader,
) -> Result<Option<String>, String> {
    let Some(raw) = reader.read_config_snapshot_toml(input.join("config_snapshot.toml").as_path())?
    else {
        return Ok(None);
    };
    let config: crate::config::Config = toml::from_str(&raw)
        .map_err(|err| format!("failed to parse config snapshot in {}: {err}", input.display()))?;
    Ok(Some(config.run.run_id))
}
