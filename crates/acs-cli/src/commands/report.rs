//! Report command: parse every export, aggregate, write the workbook.
//!
//! Files are parsed in parallel; the fold into the aggregate runs
//! afterwards in input order so the output does not depend on scheduling.

use std::path::{Path, PathBuf};

use acs_core::{Aggregate, AggregateStats, EmployeeAccess, ReaderConfig, distinct_units};
use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;

use crate::config::Config;
use crate::discover::discover_inputs;

/// Reconciled sessions of one input file, as written by `--sessions-json`.
#[derive(Debug, Serialize)]
pub struct FileSessions {
    pub file: PathBuf,
    pub employees: Vec<EmployeeAccess>,
}

/// What a report run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub files_found: usize,
    pub files_parsed: usize,
    pub stats: AggregateStats,
}

/// Parses all files, skipping the ones that fail.
///
/// Results keep the order of `files`.
pub fn parse_files(files: &[PathBuf], config: &ReaderConfig) -> Vec<FileSessions> {
    files
        .par_iter()
        .filter_map(|path| match acs_xlsx::parse_file(path, config) {
            Ok(employees) => {
                let units = distinct_units(&employees);
                if units.len() > 1 {
                    tracing::warn!(path = %path.display(), ?units, "file contains more than one unit");
                }
                Some(FileSessions {
                    file: path.clone(),
                    employees,
                })
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable file");
                None
            }
        })
        .collect()
}

/// Renders parsed files as pretty-printed JSON.
pub fn format_sessions_json(parsed: &[FileSessions]) -> Result<String> {
    serde_json::to_string_pretty(parsed).context("failed to serialize sessions")
}

/// Runs the full pipeline for the given CLI paths.
pub fn run(paths: &[PathBuf], config: &Config, sessions_json: Option<&Path>) -> Result<RunSummary> {
    let files = discover_inputs(paths);
    if files.is_empty() {
        tracing::warn!("no ACS exports found; writing an empty report");
    }
    tracing::info!(files = files.len(), "found input files");

    let parsed = parse_files(&files, &config.reader);
    let files_parsed = parsed.len();

    if let Some(path) = sessions_json {
        let json = format_sessions_json(&parsed)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write sessions to {}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote sessions JSON");
    }

    let records: Vec<EmployeeAccess> = parsed.into_iter().flat_map(|f| f.employees).collect();
    let aggregate = Aggregate::build(&records, config.negative_duration);

    if let Some(parent) = config.output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context("failed to create output directory")?;
    }
    acs_xlsx::write_report(&aggregate, &config.output_path)
        .with_context(|| format!("failed to write report to {}", config.output_path.display()))?;

    let stats = aggregate.stats();
    tracing::info!(
        output = %config.output_path.display(),
        units = aggregate.units().len(),
        dates = aggregate.dates().len(),
        employees = stats.employees,
        closed_sessions = stats.closed_sessions,
        open_sessions = stats.open_sessions,
        negative_durations = stats.negative_durations,
        "summary"
    );

    Ok(RunSummary {
        files_found: files.len(),
        files_parsed,
        stats,
    })
}
