mod common;
mod replay;
mod report;
mod sweep;
mod validate;

use std::path::PathBuf;

pub enum Command {
    Replay {
        config: PathBuf,
        out: Option<PathBuf>,
    },
    Validate {
        config: PathBuf,
        strict: bool,
    },
    Sweep {
        config: PathBuf,
    },
    Report {
        input: PathBuf,
    },
}

pub fn run(command: Command) -> Result<(), String> {
    match command {
        Command::Replay { config, out } => replay::run_replay(config, out),
        Command::Validate { config, strict } => validate::run_validate(config, strict),
        Command::Sweep { config } => sweep::run_sweep(config),
        Command::Report { input } => report::run_report(input),
    }
}
