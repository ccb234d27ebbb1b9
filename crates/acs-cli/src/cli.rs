//! Command-line argument definitions.

use std::path::PathBuf;

use clap::Parser;

/// Turnstile log report builder.
///
/// Pairs enter and exit scans from ACS exports and writes a workbook with
/// one sheet per unit: dates down, employees across, seconds in the cells.
#[derive(Debug, Parser)]
#[command(name = "acs-report", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to config file (TOML, or JSON with a `.json` extension).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Report file to write (default: `result.xlsx`).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write the reconciled sessions of every file as JSON.
    #[arg(long, value_name = "FILE")]
    pub sessions_json: Option<PathBuf>,

    /// ACS export files, or folders to scan recursively.
    #[arg(value_name = "PATHS")]
    pub paths: Vec<PathBuf>,
}
