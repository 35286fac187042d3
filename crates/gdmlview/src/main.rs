use std::process::ExitCode;

use clap::Parser;
use gdmlview::{launch, Cli, StartupError};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    let args: Vec<String> = std::env::args().collect();
    match launch(&cli, &args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("startup failed: {err}");
            eprintln!("{}", err.report());
            if matches!(err, StartupError::MissingSource) {
                eprintln!("Try `gdmlview --help' for more information.");
            }
            ExitCode::FAILURE
        }
    }
}
