use std::{io, process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, info};

use infra_diagram::cli::{self, Args};

fn main() {
    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    info!(log_level:?; "Starting infra-diagram");
    debug!(args:?; "Parsed arguments");

    let result = cli::run(&args);
    let code = cli::report(
        &result,
        args.format(),
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
    )
    .unwrap_or(cli::EXIT_FAILURE);

    if code == cli::EXIT_SUCCESS {
        info!("Completed successfully");
    }
    process::exit(code);
}
