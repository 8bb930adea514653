use crate::shared::parse_date_like;
use replay_domain::entities::policy::{DateWindow, ReplaySettings, TierTable};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub run: RunConfig,
    pub simulation: SimulationConfig,
    pub risk_tiers: Option<Vec<TierConfig>>,
    pub skim_tiers: Option<Vec<TierConfig>>,
    pub report: Option<ReportConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub run_id: String,
    pub statement_path: String,
    pub out_dir: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    pub initial_balance: f64,
    pub level_cap: u32,
    pub multiplier: f64,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
#[serde(deny_unknown_fields)]
pub struct TierConfig {
    pub threshold: f64,
    pub percent: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    pub html: Option<bool>,
}

pub fn load_config(path: &Path) -> Result<Config, String> {
    let (config, _source) = load_config_with_source(path)?;
    Ok(config)
}

pub fn load_config_with_source(path: &Path) -> Result<(Config, String), String> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read config {}: {}", path.display(), err))?;
    let config = toml::from_str(&contents)
        .map_err(|err| format!("failed to parse TOML {}: {}", path.display(), err))?;
    Ok((config, contents))
}

pub fn to_toml_pretty(config: &Config) -> Result<String, String> {
    toml::to_string_pretty(config)
        .map_err(|err| format!("failed to serialize config as TOML: {err}"))
}

/// Resolves the TOML config into validated domain settings. Fails fast on
/// out-of-range values before any trade is processed.
pub fn resolve_settings(config: &Config) -> Result<ReplaySettings, String> {
    let start = config
        .simulation
        .start_date
        .as_deref()
        .map(parse_date_like)
        .transpose()
        .map_err(|err| format!("invalid simulation.start_date: {err}"))?;
    let end = config
        .simulation
        .end_date
        .as_deref()
        .map(parse_date_like)
        .transpose()
        .map_err(|err| format!("invalid simulation.end_date: {err}"))?;
    let window = if start.is_some() || end.is_some() {
        Some(DateWindow { start, end })
    } else {
        None
    };

    let settings = ReplaySettings {
        initial_balance: config.simulation.initial_balance,
        level_cap: config.simulation.level_cap,
        multiplier: config.simulation.multiplier,
        window,
        risk_tiers: build_tier_table(config.risk_tiers.as_deref())
            .map_err(|err| format!("invalid risk_tiers: {err}"))?,
        skim_tiers: build_tier_table(config.skim_tiers.as_deref())
            .map_err(|err| format!("invalid skim_tiers: {err}"))?,
    };
    settings.validate()?;
    Ok(settings)
}

fn build_tier_table(tiers: Option<&[TierConfig]>) -> Result<Option<TierTable>, String> {
    match tiers {
        None => Ok(None),
        Some(tiers) => TierTable::new(
            tiers
                .iter()
                .map(|tier| (tier.threshold, tier.percent))
                .collect(),
        )
        .map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::{resolve_settings, Config};

    fn minimal_toml() -> &'static str {
        r#"
[run]
run_id = "h1_baseline"
statement_path = "files/history_h1.html"
out_dir = "runs/"

[simulation]
initial_balance = 500.0
level_cap = 8
multiplier = 500.0
"#
    }

    #[test]
    fn parse_minimal_config() {
        let config: Config = toml::from_str(minimal_toml()).expect("config should parse");
        assert_eq!(config.run.run_id, "h1_baseline");
        assert_eq!(config.simulation.level_cap, 8);
        assert!(config.risk_tiers.is_none());
        assert!(config.report.is_none());
    }

    #[test]
    fn parse_config_rejects_unknown_fields() {
        let toml_str = format!("{}\nunknown_field = 1\n", minimal_toml());
        let err = toml::from_str::<Config>(&toml_str).expect_err("unknown field should fail");
        assert!(err.to_string().to_lowercase().contains("unknown field"));
    }

    #[test]
    fn parse_config_with_tiers_and_window() {
        let toml_str = r#"
[run]
run_id = "tiered"
statement_path = "files/history_h1.html"
out_dir = "runs/"

[simulation]
initial_balance = 500.0
level_cap = 6
multiplier = 1000.0
start_date = "2017-03-01"
end_date = "2024-01-01"

[[risk_tiers]]
threshold = 0.0
percent = 100.0

[[risk_tiers]]
threshold = 10000.0
percent = 60.0

[[skim_tiers]]
threshold = 5000.0
percent = 50.0

[report]
html = true
"#;
        let config: Config = toml::from_str(toml_str).expect("config should parse");
        let settings = resolve_settings(&config).expect("settings should resolve");

        let window = settings.window.expect("window");
        assert!(window.start.is_some());
        assert!(window.end.is_some());
        assert!(window.start < window.end);

        let risk = settings.risk_tiers.expect("risk tiers");
        assert_eq!(risk.lookup(12_000.0), Some(60.0));
        assert_eq!(risk.lookup(100.0), Some(100.0));
        assert!(settings.skim_tiers.is_some());
    }

    #[test]
    fn resolve_settings_rejects_bad_multiplier() {
        let toml_str = r#"
[run]
run_id = "bad"
statement_path = "files/history_h1.html"
out_dir = "runs/"

[simulation]
initial_balance = 500.0
level_cap = 8
multiplier = 0.0
"#;
        let config: Config = toml::from_str(toml_str).expect("config should parse");
        let err = resolve_settings(&config).expect_err("zero multiplier should fail");
        assert!(err.contains("multiplier"));
    }

    #[test]
    fn resolve_settings_rejects_bad_date() {
        let toml_str = r#"
[run]
run_id = "bad"
statement_path = "files/history_h1.html"
out_dir = "runs/"

[simulation]
initial_balance = 500.0
level_cap = 8
multiplier = 500.0
start_date = "03/01/2017"
"#;
        let config: Config = toml::from_str(toml_str).expect("config should parse");
        let err = resolve_settings(&config).expect_err("bad date should fail");
        assert!(err.contains("start_date"));
    }
}
