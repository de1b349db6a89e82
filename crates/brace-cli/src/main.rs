/*
 * main.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! brace CLI - Main entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "brace")]
#[command(version)]
#[command(about = "Render and validate brace templates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template against a data context
    Render {
        /// Template file
        template: PathBuf,

        /// Context file (JSON, or YAML for .yaml/.yml)
        #[arg(short = 'c', long)]
        context: Option<PathBuf>,

        /// Directory that partials are loaded from
        #[arg(short = 'p', long)]
        partials: Option<PathBuf>,

        /// Maximum partial nesting depth
        #[arg(long, default_value_t = brace_template::DEFAULT_MAX_PARTIAL_DEPTH)]
        max_partial_depth: usize,

        /// Write output to FILE instead of stdout
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Skip the interleaved-block check before rendering
        #[arg(long)]
        no_tag_check: bool,
    },

    /// Check templates for structural problems without rendering them
    Validate {
        /// Template files
        #[arg(required = true)]
        templates: Vec<PathBuf>,

        /// Print the reports as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "brace=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            template,
            context,
            partials,
            max_partial_depth,
            output,
            no_tag_check,
        } => commands::render::execute(commands::render::RenderArgs {
            template,
            context,
            partials,
            max_partial_depth,
            output,
            tag_check: !no_tag_check,
        }),
        Commands::Validate { templates, json } => {
            commands::validate::execute(commands::validate::ValidateArgs { templates, json })
        }
    }
}
