use std::path::PathBuf;

pub(super) fn run_validate(config_path: PathBuf, strict: bool) -> Result<(), String> {
    let config = replay_application::config::load_config(&config_path)?;
    super::common::print_config_summary("validate", &config, None);

    let deps = crate::infra::build_run_deps();
    let result =
        replay_application::validation::validate(&config, strict, deps.statements.as_ref())?;

    let pretty = serde_json::to_string_pretty(&result)
        .map_err(|err| format!("failed to serialize validation result: {err}"))?;
    println!("{}", pretty);
    Ok(())
}
