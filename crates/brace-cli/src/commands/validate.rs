/*
 * validate.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Validate command implementation
 */

//! Validate command implementation.
//!
//! Runs the static validator over each template and prints every finding.
//! The command fails when any template is invalid.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use brace_template::{ValidationReport, validate};

/// Arguments for the validate command
#[derive(Debug)]
pub struct ValidateArgs {
    /// Template files
    pub templates: Vec<PathBuf>,
    /// Print reports as JSON
    pub json: bool,
}

/// Execute the validate command
pub fn execute(args: ValidateArgs) -> Result<()> {
    let reports = collect_reports(&args.templates)?;

    if args.json {
        let by_file: BTreeMap<String, &ValidationReport> = reports
            .iter()
            .map(|(path, report)| (path.display().to_string(), report))
            .collect();
        println!("{}", serde_json::to_string_pretty(&by_file)?);
    } else {
        for (path, report) in &reports {
            for line in format_report(&path.display().to_string(), report) {
                println!("{}", line);
            }
        }
    }

    let invalid = reports.iter().filter(|(_, r)| !r.valid).count();
    info!(checked = reports.len(), invalid, "Validation finished");
    if invalid > 0 {
        anyhow::bail!("{} of {} template(s) failed validation", invalid, reports.len());
    }
    Ok(())
}

/// Validate every template file, in argument order.
pub fn collect_reports(templates: &[PathBuf]) -> Result<Vec<(PathBuf, ValidationReport)>> {
    templates
        .iter()
        .map(|path| {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read template: {}", path.display()))?;
            Ok((path.clone(), validate(&text)))
        })
        .collect()
}

/// One `file:line:column: TYPE: message` line per finding, or a single
/// `file: ok` line for a clean template.
pub fn format_report(name: &str, report: &ValidationReport) -> Vec<String> {
    if report.valid {
        return vec![format!("{}: ok", name)];
    }
    report
        .errors
        .iter()
        .map(|error| format!("{}:{}", name, error))
        .collect()
}
