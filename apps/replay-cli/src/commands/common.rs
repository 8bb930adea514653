use replay_application::config::Config;
use replay_application::meta::engine_name;
use std::path::PathBuf;

pub(super) fn print_config_summary(command: &str, config: &Config, out: Option<&PathBuf>) {
    println!(
        "{} cli: {} (run_id={}, statement={}, initial_balance={}, level_cap={}, multiplier={})",
        engine_name(),
        command,
        config.run.run_id,
        config.run.statement_path,
        config.simulation.initial_balance,
        config.simulation.level_cap,
        config.simulation.multiplier
    );
    println!(
        "out: {}",
        out.map(|p| p.display().to_string())
            .unwrap_or_else(|| config.run.out_dir.clone())
    );
}
