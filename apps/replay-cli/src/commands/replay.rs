use std::path::PathBuf;

pub(super) fn run_replay(config_path: PathBuf, out: Option<PathBuf>) -> Result<(), String> {
    let (config, config_toml) =
        replay_application::config::load_config_with_source(&config_path)?;
    super::common::print_config_summary("replay", &config, out.as_ref());

    let overall_start = std::time::Instant::now();
    let deps = crate::infra::build_run_deps();

    let run_dir = replay_application::replaying::run_replay(
        &config,
        &config_toml,
        out,
        deps.statements.as_ref(),
        deps.artifacts.as_ref(),
    )?;

    println!("run output: {}", run_dir.display());
    println!(
        "{} cli: replay total_ms={}",
        replay_application::meta::engine_name(),
        overall_start.elapsed().as_millis()
    );
    Ok(())
}
