use crate::config::Config;
use crate::shared::resolve_statement_format;
use replay_domain::repositories::statement::{StatementQuery, StatementSource};
use replay_domain::services::segmenter::segment_deals;
use std::path::PathBuf;
use tracing::info_span;

/// Checks a config and its statement without writing any artifacts: settings
/// ranges, statement shape, and basic data quality. In strict mode quality
/// violations fail the run instead of only being reported.
pub fn validate(
    config: &Config,
    strict: bool,
    statements: &dyn StatementSource,
) -> Result<serde_json::Value, String> {
    let _span = info_span!(
        "validate",
        strict = strict,
        run_id = %config.run.run_id
    )
    .entered();

    let settings = crate::config::resolve_settings(config)?;

    let statement_path = PathBuf::from(&config.run.statement_path);
    let (records, report) = statements.load_statement(&StatementQuery {
        path: statement_path.clone(),
        format: resolve_statement_format(&statement_path)?,
    })?;

    let deals = records.len().saturating_sub(1);
    let series = segment_deals(&records);

    if strict {
        if deals == 0 {
            return Err(format!(
                "statement {} contains no deal rows",
                statement_path.display()
            ));
        }
        if report.out_of_order > 0 {
            return Err(format!(
                "statement {} has {} out-of-order rows",
                statement_path.display(),
                report.out_of_order
            ));
        }
    }

    Ok(serde_json::json!({
        "run_id": config.run.run_id,
        "statement_path": config.run.statement_path,
        "rows": report.rows,
        "deals": deals,
        "balance_ops": report.balance_ops,
        "out_of_order": report.out_of_order,
        "series": series.len(),
        "window": settings.window.map(|w| serde_json::json!({
            "start": w.start,
            "end": w.end,
        })),
        "risk_tiers": settings.risk_tiers.as_ref().map(|t| t.tiers().len()),
        "skim_tiers": settings.skim_tiers.as_ref().map(|t| t.tiers().len()),
    }))
}
