//! Command line arguments.

use clap::Parser;
use std::path::PathBuf;

/// Replay a recorded annotation session and write the defect report.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "defectmark", version, about)]
pub struct Args {
    /// Event script to replay.
    pub script: PathBuf,
    /// Report destination; stdout when absent.
    #[arg(short, long, value_name = "REPORT")]
    pub output: Option<PathBuf>,
    /// Editor config; the user config file when absent.
    #[arg(long, value_name = "CONFIG")]
    pub config: Option<PathBuf>,
}
