use std::path::PathBuf;

pub(super) fn run_report(input: PathBuf) -> Result<(), String> {
    let deps = crate::infra::build_reporting_deps();
    let result = replay_application::reporting::generate_report(
        input.as_path(),
        deps.reader.as_ref(),
        deps.writer.as_ref(),
    )?;
    println!(
        "{} cli: report regenerated (run_id={}, trades={}, deposits={}, withdrawals={}, final_balance={})",
        replay_application::meta::engine_name(),
        result.run_id,
        result.summary.trades,
        result.summary.deposits,
        result.summary.withdrawals,
        result.summary.final_balance
    );
    Ok(())
}
