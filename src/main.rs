use clap::Parser;
use std::process::ExitCode;

use tdigest::cli::{Cli, Command};
use tdigest::config::load_config;
use tdigest::{logging, pipeline, TdigestError};

fn run() -> Result<(), TdigestError> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    if let Some(path) = logging::init(cli.verbose, config.logging.dir.as_deref())? {
        log::debug!("logging to {}", path.display());
    }

    match &cli.command {
        Command::Run(args) => pipeline::handle_run(&config, args),
        Command::Tasks(args) => pipeline::handle_tasks(&config, args),
        Command::History(args) => pipeline::handle_history(&config, args),
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("tdigest: {e}");
            ExitCode::from(1)
        }
    }
}
