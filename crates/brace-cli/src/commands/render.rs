/*
 * render.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Render command implementation
 */

//! Render command implementation.
//!
//! Reads a template and an optional context file, renders through
//! brace-template and writes the result to stdout or a file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use brace_template::{FileSystemResolver, RenderOptions, TemplateContext, render};

/// Arguments for the render command
#[derive(Debug)]
pub struct RenderArgs {
    /// Template file
    pub template: PathBuf,
    /// Context file; an empty context when absent
    pub context: Option<PathBuf>,
    /// Partials directory; partial tags render empty when absent
    pub partials: Option<PathBuf>,
    /// Partial depth ceiling
    pub max_partial_depth: usize,
    /// Output file; stdout when absent
    pub output: Option<PathBuf>,
    /// Refuse interleaved blocks before rendering
    pub tag_check: bool,
}

/// Execute the render command
pub fn execute(args: RenderArgs) -> Result<()> {
    let output = render_to_string(&args)?;

    match &args.output {
        Some(path) => {
            fs::write(path, &output)
                .with_context(|| format!("Failed to write output: {}", path.display()))?;
            info!(output = %path.display(), "Rendered {}", args.template.display());
        }
        None => print!("{}", output),
    }
    Ok(())
}

/// Render the template described by `args` without writing it anywhere.
pub fn render_to_string(args: &RenderArgs) -> Result<String> {
    let template = fs::read_to_string(&args.template)
        .with_context(|| format!("Failed to read template: {}", args.template.display()))?;

    let context = match &args.context {
        Some(path) => load_context(path)?,
        None => TemplateContext::new(),
    };

    let resolver = args.partials.as_ref().map(FileSystemResolver::new);

    let mut options = RenderOptions::new()
        .with_max_partial_depth(args.max_partial_depth)
        .with_tag_check(args.tag_check);
    if let Some(resolver) = &resolver {
        options = options.with_resolver(resolver);
    }
    debug!(?options, "Render options");

    render(&template, &context, &options).map_err(|err| {
        anyhow::anyhow!(
            "{}: {}: {}",
            args.template.display(),
            err.code(),
            err
        )
    })
}

/// Load a context file. `.yaml` and `.yml` files are parsed as YAML,
/// everything else as JSON.
pub fn load_context(path: &Path) -> Result<TemplateContext> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read context: {}", path.display()))?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    let json: serde_json::Value = if is_yaml {
        serde_yaml::from_str(&text)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?
    } else {
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?
    };

    TemplateContext::from_json(json)
        .map_err(|err| anyhow::anyhow!("{}: {}: {}", path.display(), err.code(), err))
}
