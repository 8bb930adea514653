use std::path::PathBuf;

pub(super) fn run_sweep(sweep_path: PathBuf) -> Result<(), String> {
    let overall_start = std::time::Instant::now();
    let deps = crate::infra::build_sweep_deps();

    let result = replay_application::experiments::sweep::run_sweep(
        &sweep_path,
        deps.statements.as_ref(),
        &deps.artifacts,
    )?;

    let ok = result.runs.iter().filter(|r| r.status == "ok").count();
    let failed = result.runs.len() - ok;
    println!(
        "{} cli: sweep {} finished (runs={}, ok={}, failed={}, total_ms={})",
        replay_application::meta::engine_name(),
        result.sweep_id,
        result.runs.len(),
        ok,
        failed,
        overall_start.elapsed().as_millis()
    );
    println!("sweep output: {}", result.sweep_dir.display());
    Ok(())
}
