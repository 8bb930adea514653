use crate::config::Config;
use crate::shared::{resolve_statement_format, timing_event};
use replay_domain::repositories::artifacts::ArtifactWriter;
use replay_domain::repositories::statement::{StatementQuery, StatementSource};
use replay_domain::services::audit::AuditEvent;
use replay_domain::services::replay::replay_balance;
use replay_domain::services::segmenter::segment_deals;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info_span;

/// Runs the full pipeline for one config: ingest the statement, segment the
/// deal sequence into drawdown series, replay the balance under the
/// configured policy, and write the run artifacts. Returns the run directory.
pub fn run_replay(
    config: &Config,
    config_toml: &str,
    out: Option<PathBuf>,
    statements: &dyn StatementSource,
    artifacts: &dyn ArtifactWriter,
) -> Result<PathBuf, String> {
    let _span = info_span!(
        "run_replay",
        run_id = %config.run.run_id,
        statement = %config.run.statement_path
    )
    .entered();

    let settings = crate::config::resolve_settings(config)?;

    let mut audit_events: Vec<AuditEvent> = Vec::new();

    let statement_path = PathBuf::from(&config.run.statement_path);
    let stage_start = Instant::now();
    let (records, statement_report) = statements.load_statement(&StatementQuery {
        path: statement_path.clone(),
        format: resolve_statement_format(&statement_path)?,
    })?;
    metrics::histogram!("replay.run.load_statement_ms")
        .record(stage_start.elapsed().as_millis() as f64);
    audit_events.push(timing_event(
        &config.run.run_id,
        "ingest",
        "load_statement",
        stage_start.elapsed().as_millis() as u64,
        serde_json::json!({
            "rows": statement_report.rows,
            "deals": statement_report.deals,
            "balance_ops": statement_report.balance_ops,
            "out_of_order": statement_report.out_of_order,
        }),
    ));

    if records.len() <= 1 {
        return Err(format!(
            "statement {} contains no deal rows",
            statement_path.display()
        ));
    }

    let stage_start = Instant::now();
    let series = segment_deals(&records);
    metrics::histogram!("replay.run.segment_ms").record(stage_start.elapsed().as_millis() as f64);
    audit_events.push(timing_event(
        &config.run.run_id,
        "segment",
        "segment_deals",
        stage_start.elapsed().as_millis() as u64,
        serde_json::json!({
            "deals": records.len() - 1,
            "series": series.len(),
        }),
    ));
    tracing::info!(
        deals = records.len() - 1,
        series = series.len(),
        "segmented statement"
    );

    let stage_start = Instant::now();
    let outcome = replay_balance(&series, &settings)?;
    metrics::histogram!("replay.run.replay_ms").record(stage_start.elapsed().as_millis() as f64);
    metrics::gauge!("replay.run.events").set(outcome.events.len() as f64);
    metrics::gauge!("replay.run.deposits").set(outcome.summary.deposits as f64);
    metrics::gauge!("replay.run.withdrawals").set(outcome.summary.withdrawals as f64);
    metrics::gauge!("replay.run.final_balance").set(outcome.summary.final_balance);
    audit_events.push(timing_event(
        &config.run.run_id,
        "replay",
        "replay_balance",
        stage_start.elapsed().as_millis() as u64,
        serde_json::json!({
            "events": outcome.events.len(),
            "deposits": outcome.summary.deposits,
            "withdrawals": outcome.summary.withdrawals,
            "final_balance": outcome.summary.final_balance,
        }),
    ));
    tracing::info!(
        events = outcome.events.len(),
        final_balance = outcome.summary.final_balance,
        "replay complete"
    );

    write_outputs(
        config,
        config_toml,
        out,
        &series,
        &outcome,
        &statement_report,
        artifacts,
        audit_events,
    )
}

#[allow(clippy::too_many_arguments)]
fn write_outputs(
    config: &Config,
    config_toml: &str,
    out: Option<PathBuf>,
    series: &[replay_domain::value_objects::series::SeriesTrade],
    outcome: &replay_domain::services::replay::ReplayOutcome,
    statement_report: &replay_domain::repositories::statement::StatementReport,
    artifacts: &dyn ArtifactWriter,
    audit_events: Vec<AuditEvent>,
) -> Result<PathBuf, String> {
    let base_dir = out.unwrap_or_else(|| PathBuf::from(&config.run.out_dir));
    let run_dir = base_dir.join(&config.run.run_id);
    artifacts.ensure_dir(&run_dir)?;

    let meta = serde_json::json!({
        "run_id": config.run.run_id,
        "statement_path": config.run.statement_path,
        "statement_rows": statement_report.rows,
        "start": outcome.summary.first_timestamp,
        "end": outcome.summary.last_timestamp,
    });
    let config_snapshot = serde_json::to_value(config)
        .map_err(|err| format!("failed to serialize config snapshot: {err}"))?;

    artifacts.write_series_csv(run_dir.join("series.csv").as_path(), series)?;
    artifacts.write_ledger_csv(run_dir.join("ledger.csv").as_path(), &outcome.events)?;
    artifacts.write_ledger_sheet(run_dir.join("ledger_sheet.csv").as_path(), &outcome.events)?;
    artifacts.write_summary_json(
        run_dir.join("summary.json").as_path(),
        &outcome.summary,
        Some(&meta),
        Some(&config_snapshot),
    )?;

    if config
        .report
        .as_ref()
        .and_then(|report| report.html)
        .unwrap_or(false)
    {
        artifacts.write_charts_html(
            run_dir.join("charts.html").as_path(),
            series,
            &outcome.events,
            &outcome.summary,
            Some(&meta),
        )?;
    }

    artifacts.write_audit_jsonl(run_dir.join("logs.jsonl").as_path(), &audit_events)?;
    artifacts
        .write_config_snapshot_toml(run_dir.join("config_snapshot.toml").as_path(), config_toml)?;

    Ok(run_dir)
}
