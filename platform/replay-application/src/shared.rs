use replay_domain::repositories::statement::StatementFormat;
use replay_domain::services::audit::AuditEvent;
use std::path::Path;

/// Accepts epoch seconds, RFC 3339, or a plain `YYYY-MM-DD` date (midnight).
pub(crate) fn parse_date_like(raw: &str) -> Result<i64, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("timestamp cannot be empty".to_string());
    }
    if let Ok(v) = trimmed.parse::<i64>() {
        return Ok(v);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.timestamp());
    }
    let date = chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|err| {
        format!("invalid timestamp (expected epoch seconds, RFC3339 or YYYY-MM-DD): {err}")
    })?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| format!("invalid date: {trimmed}"))?;
    Ok(midnight.and_utc().timestamp())
}

pub(crate) fn resolve_statement_format(path: &Path) -> Result<StatementFormat, String> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "html" | "htm" => Ok(StatementFormat::Html),
        "csv" => Ok(StatementFormat::Csv),
        other => Err(format!(
            "unsupported statement format '{}' for {}",
            other,
            path.display()
        )),
    }
}

pub(crate) fn timing_event(
    run_id: &str,
    stage: &str,
    action: &str,
    duration_ms: u64,
    details: serde_json::Value,
) -> AuditEvent {
    AuditEvent {
        run_id: run_id.to_string(),
        timestamp: 0,
        stage: stage.to_string(),
        action: action.to_string(),
        error: None,
        details: serde_json::json!({
            "duration_ms": duration_ms,
            "details": details,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_date_like, resolve_statement_format};
    use replay_domain::repositories::statement::StatementFormat;
    use std::path::Path;

    #[test]
    fn parse_date_like_accepts_three_forms() {
        assert_eq!(parse_date_like("0"), Ok(0));
        assert_eq!(parse_date_like(" 1700000000 "), Ok(1_700_000_000));
        assert_eq!(parse_date_like("1970-01-02"), Ok(86_400));
        assert_eq!(parse_date_like("1970-01-01T00:00:05+00:00"), Ok(5));
        assert!(parse_date_like("01.03.2017").is_err());
        assert!(parse_date_like("").is_err());
    }

    #[test]
    fn statement_format_follows_extension() {
        assert_eq!(
            resolve_statement_format(Path::new("files/a.html")),
            Ok(StatementFormat::Html)
        );
        assert_eq!(
            resolve_statement_format(Path::new("files/a.HTM")),
            Ok(StatementFormat::Html)
        );
        assert_eq!(
            resolve_statement_format(Path::new("files/a.csv")),
            Ok(StatementFormat::Csv)
        );
        assert!(resolve_statement_format(Path::new("files/a.xlsx")).is_err());
    }
}
