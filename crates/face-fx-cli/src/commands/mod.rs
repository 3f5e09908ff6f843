//! CLI command definitions and handlers.

pub mod run;

use clap::{Parser, Subcommand};

/// Face FX - Blink counting, head direction and face overlays for recorded sessions
#[derive(Parser)]
#[command(name = "face-fx")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Shared run arguments (frames, recording, tuning, output).
    #[command(flatten)]
    pub run: run::RunArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Replay a frame directory with recorded face detections
    Run(run::RunArgs),
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Session processed.
    Success = 0,
    /// Invalid input or processing error.
    Error = 2,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}
