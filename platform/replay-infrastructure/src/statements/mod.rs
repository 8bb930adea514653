//! Broker statement readers.
//!
//! The HTML reader understands the report layout the terminals export: a
//! single document with several sections, each introduced by a header row;
//! the deals section is located by its localized title, the row after it
//! carries the column labels, and the white-background rows below are the
//! deals themselves. Numbers use thin-space group separators and timestamps
//! are `YYYY.MM.DD HH:MM:SS` in the report's local time.

use replay_domain::value_objects::statement::{RecordKind, StatementRecord};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

mod html;

pub use html::load_html;

/// Localized titles of the deals section.
const DEAL_SECTION_LABELS: [&str; 2] = ["Сделки", "Deals"];

/// Localized column labels, one set per field.
const TIME_LABELS: [&str; 2] = ["Время", "Time"];
const VOLUME_LABELS: [&str; 2] = ["Объем", "Volume"];
const PROFIT_LABELS: [&str; 2] = ["Прибыль", "Profit"];
const BALANCE_LABELS: [&str; 2] = ["Баланс", "Balance"];
const TYPE_LABELS: [&str; 2] = ["Тип", "Type"];

/// Parses a statement decimal, tolerating group separators ("1 234.56",
/// including non-breaking and narrow spaces).
pub(crate) fn parse_decimal(raw: &str) -> Result<f64, String> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{a0}' | '\u{202f}'))
        .collect();
    if cleaned.is_empty() {
        return Err("empty numeric field".to_string());
    }
    cleaned
        .parse::<f64>()
        .map_err(|err| format!("invalid number '{}': {}", raw.trim(), err))
}

/// Statement timestamps: `2024.01.05 12:30:00`, taken as UTC.
pub(crate) fn parse_statement_time(raw: &str) -> Result<i64, String> {
    let dt = chrono::NaiveDateTime::parse_from_str(raw.trim(), "%Y.%m.%d %H:%M:%S")
        .map_err(|err| format!("invalid statement time '{}': {}", raw.trim(), err))?;
    Ok(dt.and_utc().timestamp())
}

/// Columns of a deal row, mapped from localized labels. `kind` is optional;
/// the remaining columns are required.
#[derive(Debug)]
pub(crate) struct ColumnMap {
    pub time: usize,
    pub volume: usize,
    pub profit: usize,
    pub balance: usize,
    pub kind: Option<usize>,
}

pub(crate) fn map_columns(headers: &[String]) -> Result<ColumnMap, String> {
    let find = |labels: &[&str]| {
        headers
            .iter()
            .position(|h| labels.iter().any(|l| h.trim().eq_ignore_ascii_case(l)))
    };
    let require = |labels: &[&str], field: &str| {
        find(labels).ok_or_else(|| format!("statement table is missing the {} column", field))
    };
    Ok(ColumnMap {
        time: require(&TIME_LABELS, "time")?,
        volume: require(&VOLUME_LABELS, "volume")?,
        profit: require(&PROFIT_LABELS, "profit")?,
        balance: require(&BALANCE_LABELS, "balance")?,
        kind: find(&TYPE_LABELS),
    })
}

pub(crate) fn record_from_cells(
    cells: &[String],
    columns: &ColumnMap,
) -> Result<StatementRecord, String> {
    let cell = |idx: usize, field: &str| {
        cells
            .get(idx)
            .ok_or_else(|| format!("deal row is missing the {} cell", field))
    };
    let kind = match columns.kind {
        Some(idx) => cells
            .get(idx)
            .map(|label| RecordKind::from_label(label))
            .unwrap_or(RecordKind::Deal),
        None => RecordKind::Deal,
    };
    Ok(StatementRecord {
        timestamp: parse_statement_time(cell(columns.time, "time")?)?,
        volume: parse_decimal(cell(columns.volume, "volume")?)?,
        profit: parse_decimal(cell(columns.profit, "profit")?)?,
        balance: parse_decimal(cell(columns.balance, "balance")?)?,
        kind,
    })
}

pub(crate) fn is_deal_section_label(label: &str) -> bool {
    DEAL_SECTION_LABELS
        .iter()
        .any(|l| label.trim().eq_ignore_ascii_case(l))
}

pub(crate) fn build_report(
    records: &[StatementRecord],
) -> replay_domain::repositories::statement::StatementReport {
    let mut report = replay_domain::repositories::statement::StatementReport {
        rows: records.len(),
        ..Default::default()
    };
    for record in records {
        match record.kind {
            RecordKind::Deal => report.deals += 1,
            RecordKind::BalanceOp => report.balance_ops += 1,
        }
    }
    for pair in records.windows(2) {
        if pair[1].timestamp < pair[0].timestamp {
            report.out_of_order += 1;
        }
    }
    report
}

/// CSV statements keep the numeric fields as strings so they go through the
/// same separator-tolerant parsing as the HTML report cells.
#[derive(Debug, serde::Deserialize)]
struct CsvStatementRow {
    time: String,
    volume: String,
    profit: String,
    balance: String,
    #[serde(rename = "type")]
    kind: Option<String>,
}

pub fn load_csv(
    path: &Path,
) -> Result<
    (
        Vec<StatementRecord>,
        replay_domain::repositories::statement::StatementReport,
    ),
    String,
> {
    let mut rdr = csv::Reader::from_path(path)
        .map_err(|err| format!("failed to open statement csv {}: {}", path.display(), err))?;
    let mut records = Vec::new();
    for result in rdr.deserialize::<CsvStatementRow>() {
        let row = result.map_err(|err| format!("failed to parse statement row: {}", err))?;
        records.push(StatementRecord {
            timestamp: parse_statement_time(&row.time)?,
            volume: parse_decimal(&row.volume)?,
            profit: parse_decimal(&row.profit)?,
            balance: parse_decimal(&row.balance)?,
            kind: row
                .kind
                .as_deref()
                .map(RecordKind::from_label)
                .unwrap_or(RecordKind::Deal),
        });
    }
    let report = build_report(&records);
    tracing::debug!(
        path = %path.display(),
        rows = report.rows,
        "parsed csv statement"
    );
    Ok((records, report))
}

/// Reads the raw bytes of a report, decoding UTF-16-LE when the BOM says so.
/// The terminals export UTF-16-LE; re-saved copies are usually UTF-8.
pub(crate) fn read_report_text(path: &Path) -> Result<String, String> {
    let bytes = fs::read(path)
        .map_err(|err| format!("failed to read statement {}: {}", path.display(), err))?;
    if bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] == 0xFE {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16(&units)
            .map_err(|err| format!("statement {} is not valid UTF-16: {}", path.display(), err));
    }
    let bytes = match bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        Some(rest) => rest.to_vec(),
        None => bytes,
    };
    String::from_utf8(bytes)
        .map_err(|err| format!("statement {} is not valid UTF-8: {}", path.display(), err))
}

/// Maps a depth→drawdown JSON cell back into the typed map. Used by the
/// series.csv reader in `reporting`.
pub(crate) fn levels_from_json(raw: &str) -> Result<BTreeMap<u32, f64>, String> {
    if raw.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(raw).map_err(|err| format!("invalid drawdown levels '{}': {}", raw, err))
}

#[cfg(test)]
mod tests {
    use super::{build_report, map_columns, parse_decimal, parse_statement_time};
    use replay_domain::value_objects::statement::{RecordKind, StatementRecord};

    #[test]
    fn parse_decimal_strips_group_separators() {
        assert_eq!(parse_decimal("1 234.56"), Ok(1234.56));
        assert_eq!(parse_decimal("\u{a0}2\u{a0}000.00 "), Ok(2000.0));
        assert_eq!(parse_decimal("-15.30"), Ok(-15.3));
        assert!(parse_decimal("").is_err());
        assert!(parse_decimal("12,50").is_err());
    }

    #[test]
    fn parse_statement_time_uses_report_format() {
        assert_eq!(parse_statement_time("1970.01.01 00:00:05"), Ok(5));
        assert_eq!(parse_statement_time(" 1970.01.02 00:00:00 "), Ok(86_400));
        assert!(parse_statement_time("2024-01-05 12:30:00").is_err());
    }

    #[test]
    fn map_columns_accepts_localized_labels() {
        let headers: Vec<String> = ["Время", "Сделка", "Тип", "Объем", "Цена", "Прибыль", "Баланс"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let columns = map_columns(&headers).expect("columns");
        assert_eq!(columns.time, 0);
        assert_eq!(columns.volume, 3);
        assert_eq!(columns.profit, 5);
        assert_eq!(columns.balance, 6);
        assert_eq!(columns.kind, Some(2));

        let english: Vec<String> = ["Time", "Deal", "Volume", "Profit", "Balance"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let columns = map_columns(&english).expect("columns");
        assert_eq!(columns.volume, 2);
        assert_eq!(columns.kind, None);
    }

    #[test]
    fn map_columns_reports_the_missing_field() {
        let headers: Vec<String> = ["Time", "Volume", "Balance"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let err = map_columns(&headers).expect_err("missing profit");
        assert!(err.contains("profit"));
    }

    #[test]
    fn report_counts_kinds_and_order_violations() {
        let record = |timestamp, kind| StatementRecord {
            timestamp,
            volume: 0.0,
            profit: 0.0,
            balance: 0.0,
            kind,
        };
        let records = vec![
            record(100, RecordKind::BalanceOp),
            record(200, RecordKind::Deal),
            record(150, RecordKind::Deal),
            record(300, RecordKind::Deal),
        ];
        let report = build_report(&records);
        assert_eq!(report.rows, 4);
        assert_eq!(report.deals, 3);
        assert_eq!(report.balance_ops, 1);
        assert_eq!(report.out_of_order, 1);
    }
}
