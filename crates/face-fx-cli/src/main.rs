//! Face FX CLI - Replays recorded camera sessions through the face-fx pipeline.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::run::RunArgs;
use commands::{Cli, Commands, ExitCode};
use config::AppConfig;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = AppConfig::load();

    let args = match cli.command {
        Some(Commands::Run(args)) => args,
        None => {
            // Default behavior: run with flattened args
            if cli.run.frames.is_none() {
                eprintln!("error: No frames directory specified. Use --help for usage information.");
                return ExitCode::Error.into();
            }
            cli.run
        }
    };

    let exit_code = match commands::run::run(&RunArgs::with_config(args, &config)) {
        Ok(result) => result.exit_code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::Error
        }
    };

    exit_code.into()
}
