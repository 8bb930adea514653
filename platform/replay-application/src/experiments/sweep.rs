use crate::config::Config;
use replay_domain::repositories::artifacts::ArtifactWriter;
use replay_domain::repositories::statement::{
    StatementQuery, StatementReport, StatementSource,
};
use replay_domain::value_objects::statement::StatementRecord;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SweepFile {
    pub base: SweepBase,
    pub sweep: SweepMeta,
    pub grid: SweepGrid,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SweepBase {
    pub config: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SweepMeta {
    pub id: String,
    pub parallelism: Option<usize>,
}

/// Grid axes; an absent axis keeps the base config's value.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SweepGrid {
    pub level_caps: Option<Vec<u32>>,
    pub multipliers: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepRunEntry {
    pub run_id: String,
    pub level_cap: u32,
    pub multiplier: f64,
    pub status: String,
    pub error: Option<String>,
    pub metrics: Option<RunMetrics>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RunMetrics {
    pub trades: u64,
    pub deposits: u64,
    pub withdrawals: u64,
    pub final_balance: f64,
    pub net_result: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepResult {
    pub sweep_id: String,
    pub sweep_dir: PathBuf,
    pub base_config: String,
    pub runs: Vec<SweepRunEntry>,
}

/// Runs a level-cap / multiplier grid over one statement. The statement is
/// ingested once; replay runs are independent and fan out across threads
/// when `parallelism` asks for it.
pub fn run_sweep(
    sweep_path: &Path,
    statements: &dyn StatementSource,
    artifacts: &(dyn ArtifactWriter + Sync),
) -> Result<SweepResult, String> {
    let raw = std::fs::read_to_string(sweep_path).map_err(|err| {
        format!(
            "failed to read sweep config {}: {err}",
            sweep_path.display()
        )
    })?;
    let sweep: SweepFile = toml::from_str(&raw)
        .map_err(|err| format!("failed to parse sweep TOML {}: {err}", sweep_path.display()))?;

    let base_config_path = resolve_base_config_path(sweep_path, &sweep.base.config);
    let (base_config, _base_toml) =
        crate::config::load_config_with_source(base_config_path.as_path())?;

    let out_dir = PathBuf::from(&base_config.run.out_dir);
    let sweep_dir = out_dir.join("sweeps").join(&sweep.sweep.id);
    std::fs::create_dir_all(&sweep_dir)
        .map_err(|err| format!("failed to create sweep dir {}: {err}", sweep_dir.display()))?;

    // One ingestion serves every run in the grid.
    let statement_path = PathBuf::from(&base_config.run.statement_path);
    let (records, report) = statements.load_statement(&StatementQuery {
        path: statement_path.clone(),
        format: crate::shared::resolve_statement_format(&statement_path)?,
    })?;
    let in_memory = InMemoryStatementSource { records, report };

    let plans = expand_grid(&sweep, &base_config)?;
    let parallelism = sweep.sweep.parallelism.unwrap_or(1).max(1);

    let mut executed = if parallelism <= 1 || plans.len() <= 1 {
        execute_plans_serial(&plans, &in_memory, artifacts)?
    } else {
        execute_plans_parallel(&plans, parallelism, &in_memory, artifacts)?
    };
    executed.sort_by_key(|(order_idx, _)| *order_idx);

    let result = SweepResult {
        sweep_id: sweep.sweep.id.clone(),
        sweep_dir: sweep_dir.clone(),
        base_config: base_config_path.display().to_string(),
        runs: executed.into_iter().map(|(_, entry)| entry).collect(),
    };

    write_manifest(&sweep_dir, &result)?;
    write_results_csv(&sweep_dir, &result)?;
    write_leaderboard_csv(&sweep_dir, &result)?;

    Ok(result)
}

#[derive(Debug, Clone)]
struct SweepRunPlan {
    order_idx: usize,
    run_id: String,
    level_cap: u32,
    multiplier: f64,
    config: Config,
    config_toml: String,
    summary_path: PathBuf,
}

fn expand_grid(sweep: &SweepFile, base_config: &Config) -> Result<Vec<SweepRunPlan>, String> {
    let level_caps = sweep
        .grid
        .level_caps
        .clone()
        .unwrap_or_else(|| vec![base_config.simulation.level_cap]);
    let multipliers = sweep
        .grid
        .multipliers
        .clone()
        .unwrap_or_else(|| vec![base_config.simulation.multiplier]);
    if level_caps.is_empty() || multipliers.is_empty() {
        return Err("sweep grid axes cannot be empty".to_string());
    }

    let out_dir = PathBuf::from(&base_config.run.out_dir);
    let mut plans = Vec::with_capacity(level_caps.len() * multipliers.len());
    for level_cap in &level_caps {
        for multiplier in &multipliers {
            let run_id = format!("{}__cap{}_x{}", sweep.sweep.id, level_cap, multiplier);
            let mut config = base_config.clone();
            config.run.run_id = run_id.clone();
            config.simulation.level_cap = *level_cap;
            config.simulation.multiplier = *multiplier;
            let config_toml = crate::config::to_toml_pretty(&config)?;

            plans.push(SweepRunPlan {
                order_idx: plans.len(),
                summary_path: out_dir.join(&run_id).join("summary.json"),
                run_id,
                level_cap: *level_cap,
                multiplier: *multiplier,
                config,
                config_toml,
            });
        }
    }
    Ok(plans)
}

fn execute_plans_serial(
    plans: &[SweepRunPlan],
    statements: &(dyn StatementSource + Sync),
    artifacts: &(dyn ArtifactWriter + Sync),
) -> Result<Vec<(usize, SweepRunEntry)>, String> {
    let mut out = Vec::with_capacity(plans.len());
    for plan in plans {
        out.push((plan.order_idx, execute_run_plan(plan, statements, artifacts)));
    }
    Ok(out)
}

fn execute_plans_parallel(
    plans: &[SweepRunPlan],
    parallelism: usize,
    statements: &(dyn StatementSource + Sync),
    artifacts: &(dyn ArtifactWriter + Sync),
) -> Result<Vec<(usize, SweepRunEntry)>, String> {
    let worker_count = parallelism.min(plans.len());
    let next_index = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel::<(usize, SweepRunEntry)>();

    std::thread::scope(|scope| {
        for _ in 0..worker_count {
            let tx = tx.clone();
            let next_index_ref = &next_index;
            scope.spawn(move || loop {
                let plan_idx = next_index_ref.fetch_add(1, Ordering::Relaxed);
                if plan_idx >= plans.len() {
                    break;
                }
                let entry = execute_run_plan(&plans[plan_idx], statements, artifacts);
                if tx.send((plans[plan_idx].order_idx, entry)).is_err() {
                    break;
                }
            });
        }

        drop(tx);

        let mut entries: Vec<(usize, SweepRunEntry)> = Vec::with_capacity(plans.len());
        while let Ok(pair) = rx.recv() {
            entries.push(pair);
        }

        if entries.len() != plans.len() {
            return Err(format!(
                "internal sweep error: expected {} results, got {}",
                plans.len(),
                entries.len()
            ));
        }
        Ok(entries)
    })
}

/// A failing run becomes an error entry; it never aborts the rest of the grid.
fn execute_run_plan(
    plan: &SweepRunPlan,
    statements: &(dyn StatementSource + Sync),
    artifacts: &(dyn ArtifactWriter + Sync),
) -> SweepRunEntry {
    let result = crate::replaying::run_replay(
        &plan.config,
        &plan.config_toml,
        None,
        statements,
        artifacts,
    );

    match result {
        Ok(_) => SweepRunEntry {
            run_id: plan.run_id.clone(),
            level_cap: plan.level_cap,
            multiplier: plan.multiplier,
            status: "ok".to_string(),
            error: None,
            metrics: read_metrics_from_summary(&plan.summary_path).ok(),
        },
        Err(err) => SweepRunEntry {
            run_id: plan.run_id.clone(),
            level_cap: plan.level_cap,
            multiplier: plan.multiplier,
            status: "error".to_string(),
            error: Some(err),
            metrics: None,
        },
    }
}

fn resolve_base_config_path(sweep_path: &Path, base: &str) -> PathBuf {
    let p = PathBuf::from(base);
    if p.is_absolute() {
        p
    } else {
        sweep_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(p)
    }
}

fn read_metrics_from_summary(path: &Path) -> Result<RunMetrics, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|err| format!("failed to parse {}: {err}", path.display()))?;
    let summary = value.get("summary").unwrap_or(&value);
    let deposited = summary
        .get("deposited_total")
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    let withdrawn = summary
        .get("withdrawn_total")
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    let skimmed = summary
        .get("skimmed_total")
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    let final_balance = summary
        .get("final_balance")
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    Ok(RunMetrics {
        trades: summary.get("trades").and_then(|v| v.as_u64()).unwrap_or(0),
        deposits: summary
            .get("deposits")
            .and_then(|v| v.as_u64())
            .unwrap_or(0),
        withdrawals: summary
            .get("withdrawals")
            .and_then(|v| v.as_u64())
            .unwrap_or(0),
        final_balance,
        net_result: final_balance + withdrawn + skimmed - deposited,
    })
}

fn write_manifest(dir: &Path, result: &SweepResult) -> Result<(), String> {
    let path = dir.join("manifest.json");
    let json = serde_json::to_string_pretty(result)
        .map_err(|err| format!("failed to serialize manifest: {err}"))?;
    std::fs::write(&path, json)
        .map_err(|err| format!("failed to write {}: {err}", path.display()))?;
    Ok(())
}

fn write_results_csv(dir: &Path, result: &SweepResult) -> Result<(), String> {
    let path = dir.join("results.csv");
    let mut wtr = csv::Writer::from_path(&path)
        .map_err(|err| format!("failed to create {}: {err}", path.display()))?;
    wtr.write_record([
        "run_id",
        "level_cap",
        "multiplier",
        "status",
        "trades",
        "deposits",
        "withdrawals",
        "final_balance",
        "net_result",
        "error",
    ])
    .map_err(|err| format!("failed to write results header: {err}"))?;

    for r in &result.runs {
        let m = r.metrics;
        let record = vec![
            r.run_id.clone(),
            r.level_cap.to_string(),
            r.multiplier.to_string(),
            r.status.clone(),
            m.map(|m| m.trades.to_string()).unwrap_or_default(),
            m.map(|m| m.deposits.to_string()).unwrap_or_default(),
            m.map(|m| m.withdrawals.to_string()).unwrap_or_default(),
            m.map(|m| m.final_balance.to_string()).unwrap_or_default(),
            m.map(|m| m.net_result.to_string()).unwrap_or_default(),
            r.error.clone().unwrap_or_default(),
        ];
        wtr.write_record(record)
            .map_err(|err| format!("failed to write results row: {err}"))?;
    }
    wtr.flush()
        .map_err(|err| format!("failed to flush {}: {err}", path.display()))?;
    Ok(())
}

fn write_leaderboard_csv(dir: &Path, result: &SweepResult) -> Result<(), String> {
    let mut rows: Vec<&SweepRunEntry> = result
        .runs
        .iter()
        .filter(|r| r.status == "ok" && r.metrics.is_some())
        .collect();
    rows.sort_by(|a, b| {
        let av = a.metrics.map(|m| m.net_result).unwrap_or(f64::MIN);
        let bv = b.metrics.map(|m| m.net_result).unwrap_or(f64::MIN);
        bv.partial_cmp(&av).unwrap_or(std::cmp::Ordering::Equal)
    });

    let path = dir.join("leaderboard.csv");
    let mut wtr = csv::Writer::from_path(&path)
        .map_err(|err| format!("failed to create {}: {err}", path.display()))?;
    wtr.write_record([
        "rank",
        "run_id",
        "level_cap",
        "multiplier",
        "final_balance",
        "net_result",
    ])
    .map_err(|err| format!("failed to write leaderboard header: {err}"))?;

    for (idx, r) in rows.iter().enumerate() {
        let m = r.metrics.unwrap_or(RunMetrics {
            trades: 0,
            deposits: 0,
            withdrawals: 0,
            final_balance: 0.0,
            net_result: 0.0,
        });
        wtr.write_record([
            (idx + 1).to_string(),
            r.run_id.clone(),
            r.level_cap.to_string(),
            r.multiplier.to_string(),
            m.final_balance.to_string(),
            m.net_result.to_string(),
        ])
        .map_err(|err| format!("failed to write leaderboard row: {err}"))?;
    }
    wtr.flush()
        .map_err(|err| format!("failed to flush {}: {err}", path.display()))?;
    Ok(())
}

#[derive(Debug, Clone)]
struct InMemoryStatementSource {
    records: Vec<StatementRecord>,
    report: StatementReport,
}

impl StatementSource for InMemoryStatementSource {
    fn load_statement(
        &self,
        _query: &StatementQuery,
    ) -> Result<(Vec<StatementRecord>, StatementReport), String> {
        Ok((self.records.clone(), self.report.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::{expand_grid, SweepBase, SweepFile, SweepGrid, SweepMeta};
    use crate::config::Config;

    fn base_config() -> Config {
        toml::from_str(
            r#"
[run]
run_id = "base"
statement_path = "files/history.html"
out_dir = "runs/"

[simulation]
initial_balance = 500.0
level_cap = 8
multiplier = 500.0
"#,
        )
        .expect("config should parse")
    }

    fn sweep_file(grid: SweepGrid) -> SweepFile {
        SweepFile {
            base: SweepBase {
                config: "base.toml".to_string(),
            },
            sweep: SweepMeta {
                id: "cap_explore".to_string(),
                parallelism: None,
            },
            grid,
        }
    }

    #[test]
    fn grid_is_a_cross_product_in_stable_order() {
        let sweep = sweep_file(SweepGrid {
            level_caps: Some(vec![4, 8]),
            multipliers: Some(vec![500.0, 1000.0]),
        });
        let plans = expand_grid(&sweep, &base_config()).expect("grid");
        assert_eq!(plans.len(), 4);
        assert_eq!(plans[0].run_id, "cap_explore__cap4_x500");
        assert_eq!(plans[1].run_id, "cap_explore__cap4_x1000");
        assert_eq!(plans[3].run_id, "cap_explore__cap8_x1000");
        assert_eq!(plans[2].config.simulation.level_cap, 8);
        assert_eq!(plans[2].config.simulation.multiplier, 500.0);
    }

    #[test]
    fn missing_axis_falls_back_to_base_value() {
        let sweep = sweep_file(SweepGrid {
            level_caps: Some(vec![2, 3]),
            multipliers: None,
        });
        let plans = expand_grid(&sweep, &base_config()).expect("grid");
        assert_eq!(plans.len(), 2);
        assert!(plans.iter().all(|p| p.config.simulation.multiplier == 500.0));
    }

    #[test]
    fn empty_axis_is_rejected() {
        let sweep = sweep_file(SweepGrid {
            level_caps: Some(Vec::new()),
            multipliers: None,
        });
        assert!(expand_grid(&sweep, &base_config()).is_err());
    }
}
