use replay_domain::services::audit::AuditEvent;
use replay_domain::services::replay::ReplaySummary;
use replay_domain::value_objects::ledger::{LedgerEvent, LedgerKind};
use replay_domain::value_objects::series::SeriesTrade;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::Path;

pub mod charts;

pub fn write_audit_jsonl(path: &Path, events: &[AuditEvent]) -> Result<(), String> {
    let mut file =
        fs::File::create(path).map_err(|err| format!("failed to create logs: {}", err))?;
    for event in events {
        let line = serde_json::to_string(event)
            .map_err(|err| format!("failed to serialize audit event: {}", err))?;
        file.write_all(line.as_bytes())
            .and_then(|_| file.write_all(b"\n"))
            .map_err(|err| format!("failed to write audit event: {}", err))?;
    }
    Ok(())
}

pub fn write_series_csv(path: &Path, series: &[SeriesTrade]) -> Result<(), String> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|err| format!("failed to create series csv {}: {}", path.display(), err))?;
    wtr.write_record([
        "timestamp_utc",
        "volume",
        "balance",
        "net_change",
        "drawdown",
        "series_length",
        "drawdown_levels",
    ])
    .map_err(|err| format!("failed to write series csv header: {}", err))?;

    for trade in series {
        let levels = serde_json::to_string(&trade.drawdown_levels)
            .map_err(|err| format!("failed to serialize drawdown levels: {}", err))?;
        wtr.write_record([
            trade.timestamp.to_string(),
            trade.volume.to_string(),
            trade.balance.to_string(),
            trade.net_change.to_string(),
            trade.drawdown.to_string(),
            trade.series_length.to_string(),
            levels,
        ])
        .map_err(|err| format!("failed to write series row: {}", err))?;
    }

    wtr.flush()
        .map_err(|err| format!("failed to flush series csv: {}", err))
}

pub fn write_ledger_csv(path: &Path, events: &[LedgerEvent]) -> Result<(), String> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|err| format!("failed to create ledger csv {}: {}", path.display(), err))?;
    wtr.write_record(LEDGER_COLUMNS)
        .map_err(|err| format!("failed to write ledger csv header: {}", err))?;

    for event in events {
        wtr.write_record(ledger_row(event))
            .map_err(|err| format!("failed to write ledger row: {}", err))?;
    }

    wtr.flush()
        .map_err(|err| format!("failed to flush ledger csv: {}", err))
}

const LEDGER_COLUMNS: [&str; 7] = [
    "timestamp_utc",
    "kind",
    "change",
    "balance",
    "series_length",
    "multiplier",
    "skim",
];

fn ledger_row(event: &LedgerEvent) -> [String; 7] {
    [
        event.timestamp.to_string(),
        event.kind.as_str().to_string(),
        event.change.to_string(),
        event.balance.to_string(),
        event.series_length.to_string(),
        event.multiplier.to_string(),
        event.skim.to_string(),
    ]
}

/// Spreadsheet-style export: the header/data block starts after two blank
/// rows, where downstream sheets expect it.
pub fn write_ledger_sheet(path: &Path, events: &[LedgerEvent]) -> Result<(), String> {
    let mut file = fs::File::create(path)
        .map_err(|err| format!("failed to create ledger sheet {}: {}", path.display(), err))?;
    file.write_all(b"\n\n")
        .map_err(|err| format!("failed to write sheet offset rows: {}", err))?;

    let mut wtr = csv::Writer::from_writer(file);
    wtr.write_record(LEDGER_COLUMNS)
        .map_err(|err| format!("failed to write sheet header: {}", err))?;
    for event in events {
        wtr.write_record(ledger_row(event))
            .map_err(|err| format!("failed to write sheet row: {}", err))?;
    }

    wtr.flush()
        .map_err(|err| format!("failed to flush ledger sheet: {}", err))
}

pub fn write_summary_json(
    path: &Path,
    summary: &ReplaySummary,
    meta: Option<&serde_json::Value>,
    config_snapshot: Option<&serde_json::Value>,
) -> Result<(), String> {
    let json = serde_json::json!({
        "meta": meta,
        "config_snapshot": config_snapshot,
        "summary": summary,
    });
    let json = serde_json::to_string_pretty(&json)
        .map_err(|err| format!("failed to serialize summary: {}", err))?;
    let mut file =
        fs::File::create(path).map_err(|err| format!("failed to create summary: {}", err))?;
    file.write_all(json.as_bytes())
        .map_err(|err| format!("failed to write summary: {}", err))
}

pub fn write_config_snapshot_toml(path: &Path, contents: &str) -> Result<(), String> {
    fs::write(path, contents).map_err(|err| {
        format!(
            "failed to write config snapshot {}: {}",
            path.display(),
            err
        )
    })
}

pub fn write_charts_html(
    path: &Path,
    series: &[SeriesTrade],
    events: &[LedgerEvent],
    summary: &ReplaySummary,
    meta: Option<&serde_json::Value>,
) -> Result<(), String> {
    let run_id = meta
        .and_then(|m| m.get("run_id"))
        .and_then(|v| v.as_str())
        .unwrap_or("unknown");

    let chart = charts::weekly_chart_data(series, events);
    let chart_json = serde_json::to_string(&chart)
        .map_err(|err| format!("failed to serialize chart data: {err}"))?;

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8"/>
  <title>Balance Replay Charts</title>
  <style>
    body {{ font-family: ui-sans-serif, system-ui; padding: 24px; }}
    code {{ background: #f2f2f2; padding: 2px 6px; border-radius: 4px; }}
    .grid {{ display: grid; grid-template-columns: 1fr; gap: 16px; }}
    .card {{ border: 1px solid #ddd; border-radius: 10px; padding: 16px; background: #fff; }}
    canvas {{ width: 100%; height: 260px; border: 1px solid #eee; border-radius: 8px; }}
    .muted {{ color: #666; }}
  </style>
</head>
<body>
  <h1>Balance Replay Charts</h1>
  <p class="muted">
    run_id: <code>{run_id}</code>
    · deposited: <code>{deposited:.2}</code> over {deposits} deposits
    · withdrawn: <code>{withdrawn:.2}</code> over {withdrawals} withdrawals
    · skimmed: <code>{skimmed:.2}</code>
    · final balance: <code>{final_balance:.2}</code>
  </p>

  <div class="grid">
    <div class="card">
      <h2>Weekly series sizes</h2>
      <canvas id="series"></canvas>
    </div>
    <div class="card">
      <h2>Weekly balance</h2>
      <canvas id="balance"></canvas>
    </div>
  </div>

  <script>
    const chart = {chart_json};

    function frame(canvas) {{
      const ctx = canvas.getContext('2d');
      const w = canvas.width = canvas.clientWidth * window.devicePixelRatio;
      const h = canvas.height = canvas.clientHeight * window.devicePixelRatio;
      ctx.clearRect(0, 0, w, h);
      const pad = 24 * window.devicePixelRatio;
      return {{ ctx, x0: pad, y0: pad, x1: w - pad, y1: h - pad }};
    }}

    function weekX(f, week) {{
      const weeks = Math.max(chart.weeks, 1);
      return f.x0 + (week / weeks) * (f.x1 - f.x0);
    }}

    function drawMarks(f) {{
      for (const mark of chart.month_marks) {{
        f.ctx.strokeStyle = '#f0a500';
        f.ctx.lineWidth = window.devicePixelRatio;
        f.ctx.beginPath();
        f.ctx.moveTo(weekX(f, mark.week), f.y0);
        f.ctx.lineTo(weekX(f, mark.week), f.y1);
        f.ctx.stroke();
      }}
      for (const mark of chart.year_marks) {{
        f.ctx.strokeStyle = '#d33';
        f.ctx.lineWidth = 2 * window.devicePixelRatio;
        f.ctx.beginPath();
        f.ctx.moveTo(weekX(f, mark.week), f.y0);
        f.ctx.lineTo(weekX(f, mark.week), f.y1);
        f.ctx.stroke();
        f.ctx.fillStyle = '#d33';
        f.ctx.fillText(mark.label, weekX(f, mark.week), f.y0 - 4);
      }}
    }}

    function drawSeries(canvas) {{
      const f = frame(canvas);
      const all = chart.series_lengths.flat();
      if (all.length === 0) {{
        f.ctx.fillStyle = '#666';
        f.ctx.fillText('no series data', 10, 20);
        return;
      }}
      const maxLen = Math.max(...all, 1);
      f.ctx.fillStyle = '#2b6cb0';
      chart.series_lengths.forEach((lengths, week) => {{
        const slot = (f.x1 - f.x0) / Math.max(chart.weeks, 1);
        lengths.forEach((len, i) => {{
          const barW = slot / lengths.length;
          const x = weekX(f, week) + i * barW;
          const barH = (len / maxLen) * (f.y1 - f.y0);
          f.ctx.fillRect(x, f.y1 - barH, Math.max(barW - 1, 1), barH);
        }});
      }});
      drawMarks(f);
    }}

    function drawBalance(canvas) {{
      const f = frame(canvas);
      const known = chart.balances.filter(b => b !== null);
      if (known.length === 0) {{
        f.ctx.fillStyle = '#666';
        f.ctx.fillText('no balance data', 10, 20);
        return;
      }}
      const minV = Math.min(...known);
      const maxV = Math.max(...known);
      const y = v => maxV === minV
        ? (f.y0 + f.y1) / 2
        : f.y1 - ((v - minV) / (maxV - minV)) * (f.y1 - f.y0);
      f.ctx.strokeStyle = '#2b6cb0';
      f.ctx.lineWidth = 3 * window.devicePixelRatio;
      f.ctx.beginPath();
      let started = false;
      chart.balances.forEach((balance, week) => {{
        if (balance === null) return;
        const px = weekX(f, week);
        const py = y(balance);
        if (!started) {{ f.ctx.moveTo(px, py); started = true; }}
        else {{ f.ctx.lineTo(px, py); }}
        f.ctx.lineTo(weekX(f, week + 1), py);
      }});
      f.ctx.stroke();
      drawMarks(f);
    }}

    function drawAll() {{
      drawSeries(document.getElementById('series'));
      drawBalance(document.getElementById('balance'));
    }}
    drawAll();
    window.addEventListener('resize', drawAll);
  </script>
</body>
</html>"#,
        run_id = run_id,
        deposited = summary.deposited_total,
        deposits = summary.deposits,
        withdrawn = summary.withdrawn_total,
        withdrawals = summary.withdrawals,
        skimmed = summary.skimmed_total,
        final_balance = summary.final_balance,
        chart_json = chart_json,
    );

    let mut file =
        fs::File::create(path).map_err(|err| format!("failed to create charts html: {}", err))?;
    file.write_all(html.as_bytes())
        .map_err(|err| format!("failed to write charts html: {}", err))
}

#[derive(Debug, Clone, Deserialize)]
struct SeriesRow {
    timestamp_utc: i64,
    volume: f64,
    balance: f64,
    net_change: f64,
    drawdown: f64,
    series_length: u32,
    drawdown_levels: String,
}

pub fn read_series_csv(path: &Path) -> Result<Vec<SeriesTrade>, String> {
    let mut rdr = csv::Reader::from_path(path)
        .map_err(|err| format!("failed to open series csv {}: {}", path.display(), err))?;
    let mut series = Vec::new();
    for result in rdr.deserialize::<SeriesRow>() {
        let row = result.map_err(|err| format!("failed to parse series row: {}", err))?;
        series.push(SeriesTrade {
            timestamp: row.timestamp_utc,
            volume: row.volume,
            balance: row.balance,
            net_change: row.net_change,
            drawdown: row.drawdown,
            series_length: row.series_length,
            drawdown_levels: crate::statements::levels_from_json(&row.drawdown_levels)?,
        });
    }
    Ok(series)
}

#[derive(Debug, Clone, Deserialize)]
struct LedgerRow {
    timestamp_utc: i64,
    kind: String,
    change: f64,
    balance: f64,
    series_length: u32,
    multiplier: u32,
    skim: f64,
}

pub fn read_ledger_csv(path: &Path) -> Result<Vec<LedgerEvent>, String> {
    let mut rdr = csv::Reader::from_path(path)
        .map_err(|err| format!("failed to open ledger csv {}: {}", path.display(), err))?;
    let mut events = Vec::new();
    for result in rdr.deserialize::<LedgerRow>() {
        let row = result.map_err(|err| format!("failed to parse ledger row: {}", err))?;
        let kind = match row.kind.as_str() {
            "trade" => LedgerKind::Trade,
            "deposit" => LedgerKind::Deposit,
            "withdrawal" => LedgerKind::Withdrawal,
            other => return Err(format!("invalid ledger kind '{}'", other)),
        };
        events.push(LedgerEvent {
            timestamp: row.timestamp_utc,
            change: row.change,
            balance: row.balance,
            series_length: row.series_length,
            multiplier: row.multiplier,
            kind,
            skim: row.skim,
        });
    }
    Ok(events)
}
