//! Row scanner for the exported HTML trade report. The reports are plain
//! generated markup (no scripting, properly closed tags), so a small tag
//! scanner is enough to pull the deals table out; rows keep their order.

use super::{
    build_report, is_deal_section_label, map_columns, read_report_text, record_from_cells,
};
use replay_domain::repositories::statement::StatementReport;
use replay_domain::value_objects::statement::StatementRecord;
use std::path::Path;

pub fn load_html(path: &Path) -> Result<(Vec<StatementRecord>, StatementReport), String> {
    let content = read_report_text(path)?;
    let records = parse_report(&content)
        .map_err(|err| format!("failed to parse statement {}: {}", path.display(), err))?;
    let report = build_report(&records);
    tracing::debug!(
        path = %path.display(),
        rows = report.rows,
        out_of_order = report.out_of_order,
        "parsed html statement"
    );
    Ok((records, report))
}

fn parse_report(content: &str) -> Result<Vec<StatementRecord>, String> {
    let mut deal_section = false;
    let mut columns = None;
    let mut records = Vec::new();

    for row in extract_rows(content) {
        if !deal_section {
            if let Some(title) = first_cell_text(row.inner, "th") {
                if is_deal_section_label(&title) {
                    deal_section = true;
                }
            }
            continue;
        }

        if columns.is_none() {
            let headers = cell_texts(row.inner, "td");
            if headers.is_empty() {
                continue;
            }
            columns = Some(map_columns(&headers)?);
            continue;
        }

        // Deal rows are the white-background ones; totals and section
        // separators use other colors.
        if !has_background(row.attrs, "#ffffff") {
            continue;
        }
        let cells = cell_texts(row.inner, "td");
        if cells.is_empty() {
            continue;
        }
        let Some(column_map) = &columns else {
            continue;
        };
        records.push(record_from_cells(&cells, column_map)?);
    }

    if !deal_section {
        return Err("no deals section found in report".to_string());
    }
    if columns.is_none() {
        return Err("deals section has no header row".to_string());
    }
    Ok(records)
}

struct Row<'a> {
    attrs: &'a str,
    inner: &'a str,
}

/// ASCII-lowercased shadow of the document; tag names and attribute names
/// are ASCII, and ASCII lowercasing keeps byte offsets stable.
fn ascii_lower(content: &str) -> String {
    content.chars().map(|c| c.to_ascii_lowercase()).collect()
}

fn extract_rows(content: &str) -> Vec<Row<'_>> {
    let lower = ascii_lower(content);
    let mut rows = Vec::new();
    let mut cursor = 0;

    while let Some(open_rel) = lower[cursor..].find("<tr") {
        let open = cursor + open_rel;
        let Some(open_end_rel) = lower[open..].find('>') else {
            break;
        };
        let open_end = open + open_end_rel;
        let Some(close_rel) = lower[open_end..].find("</tr") else {
            break;
        };
        let close = open_end + close_rel;
        rows.push(Row {
            attrs: &content[open + 3..open_end],
            inner: &content[open_end + 1..close],
        });
        cursor = close + 4;
    }
    rows
}

fn has_background(attrs: &str, color: &str) -> bool {
    let lower = ascii_lower(attrs);
    match lower.find("bgcolor") {
        Some(idx) => lower[idx..].contains(color),
        None => false,
    }
}

/// Inner texts of all `<tag>` cells in a row fragment, tags stripped and
/// entities decoded.
fn cell_texts(inner: &str, tag: &str) -> Vec<String> {
    let lower = ascii_lower(inner);
    let open_pat = format!("<{}", tag);
    let close_pat = format!("</{}", tag);
    let mut cells = Vec::new();
    let mut cursor = 0;

    while let Some(open_rel) = lower[cursor..].find(&open_pat) {
        let open = cursor + open_rel;
        let Some(open_end_rel) = lower[open..].find('>') else {
            break;
        };
        let open_end = open + open_end_rel;
        let Some(close_rel) = lower[open_end..].find(&close_pat) else {
            break;
        };
        let close = open_end + close_rel;
        cells.push(clean_text(&inner[open_end + 1..close]));
        cursor = close + close_pat.len();
    }
    cells
}

fn first_cell_text(inner: &str, tag: &str) -> Option<String> {
    cell_texts(inner, tag).into_iter().next()
}

fn clean_text(fragment: &str) -> String {
    decode_entities(&strip_tags(fragment)).trim().to_string()
}

fn strip_tags(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for c in fragment.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", "\u{a0}")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::parse_report;
    use replay_domain::value_objects::statement::RecordKind;

    fn report(body: &str) -> String {
        format!("<html><body><table>{}</table></body></html>", body)
    }

    const RUSSIAN_DEALS: &str = r##"
<tr align="center"><th colspan="13">Сделки</th></tr>
<tr bgcolor="#C0C0C0"><td>Время</td><td>Сделка</td><td>Тип</td><td>Объем</td><td>Прибыль</td><td>Баланс</td></tr>
<tr bgcolor="#FFFFFF" align="right"><td>2017.03.01 10:00:00</td><td>1</td><td>balance</td><td>0.00</td><td>500.00</td><td>500.00</td></tr>
<tr bgcolor="#FFFFFF" align="right"><td>2017.03.02 11:30:00</td><td>2</td><td>sell</td><td>0.10</td><td>-15.30</td><td>484.70</td></tr>
<tr bgcolor="#FFFFFF" align="right"><td>2017.03.03 09:15:00</td><td>3</td><td>buy</td><td>0.10</td><td>1&nbsp;020.50</td><td>1 505.20</td></tr>
<tr align="right"><td colspan="6">Итого</td></tr>
"##;

    #[test]
    fn parses_deal_rows_after_the_section_header() {
        let records = parse_report(&report(RUSSIAN_DEALS)).expect("report should parse");
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].kind, RecordKind::BalanceOp);
        assert_eq!(records[0].profit, 500.0);

        assert_eq!(records[1].kind, RecordKind::Deal);
        assert_eq!(records[1].volume, 0.1);
        assert_eq!(records[1].profit, -15.3);
        assert_eq!(records[1].balance, 484.7);

        // group separators, plain and non-breaking
        assert_eq!(records[2].profit, 1020.5);
        assert_eq!(records[2].balance, 1505.2);

        assert!(records[0].timestamp < records[1].timestamp);
    }

    #[test]
    fn rows_before_the_deals_section_are_ignored() {
        let body = format!(
            r##"
<tr><th colspan="3">Ордера</th></tr>
<tr bgcolor="#FFFFFF"><td>2017.01.01 00:00:00</td><td>ignored</td></tr>
{}"##,
            RUSSIAN_DEALS
        );
        let records = parse_report(&report(&body)).expect("report should parse");
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn english_reports_parse_too() {
        let body = r##"
<tr><th colspan="6">Deals</th></tr>
<tr bgcolor="#C0C0C0"><td>Time</td><td>Type</td><td>Volume</td><td>Profit</td><td>Balance</td></tr>
<tr bgcolor="#ffffff"><td>2020.05.01 12:00:00</td><td>buy</td><td>0.20</td><td>25.00</td><td>1025.00</td></tr>
"##;
        let records = parse_report(&report(body)).expect("report should parse");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].volume, 0.2);
    }

    #[test]
    fn missing_section_is_terminal() {
        let body = r#"<tr><th>Ордера</th></tr>"#;
        let err = parse_report(&report(body)).expect_err("no deals section");
        assert!(err.contains("deals section"));
    }

    #[test]
    fn malformed_number_is_terminal() {
        let body = r##"
<tr><th>Deals</th></tr>
<tr><td>Time</td><td>Volume</td><td>Profit</td><td>Balance</td></tr>
<tr bgcolor="#FFFFFF"><td>2020.05.01 12:00:00</td><td>0.1</td><td>n/a</td><td>1000</td></tr>
"##;
        let err = parse_report(&report(body)).expect_err("bad number");
        assert!(err.contains("invalid number"));
    }

    #[test]
    fn nested_markup_in_cells_is_stripped() {
        let body = r##"
<tr><th>Deals</th></tr>
<tr><td>Time</td><td>Volume</td><td>Profit</td><td>Balance</td></tr>
<tr bgcolor="#FFFFFF"><td><b>2020.05.01 12:00:00</b></td><td><span>0.1</span></td><td>5.00</td><td>1005.00</td></tr>
"##;
        let records = parse_report(&report(body)).expect("report should parse");
        assert_eq!(records[0].volume, 0.1);
        assert_eq!(records[0].profit, 5.0);
    }
}
