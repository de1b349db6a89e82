/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for template rendering.
//!
//! Every render-time fault is fatal and carries a stable [`ErrorCode`], a
//! human-readable message (the `Display` impl) and a map of structured
//! details. Static validation diagnostics live in [`crate::validator`] and do
//! not use this type.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Stable, machine-readable error codes for render failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidInput,
    MissingEndEach,
    UnclosedEach,
    InvalidIterable,
    MissingEndif,
    UnclosedIf,
    PartialNotFound,
    PartialDepthExceeded,
    PartialCircular,
    MismatchedTags,
    ProcessFailed,
}

impl ErrorCode {
    /// The stable string form of this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::MissingEndEach => "MISSING_END_EACH",
            ErrorCode::UnclosedEach => "UNCLOSED_EACH",
            ErrorCode::InvalidIterable => "INVALID_ITERABLE",
            ErrorCode::MissingEndif => "MISSING_ENDIF",
            ErrorCode::UnclosedIf => "UNCLOSED_IF",
            ErrorCode::PartialNotFound => "PARTIAL_NOT_FOUND",
            ErrorCode::PartialDepthExceeded => "PARTIAL_DEPTH_EXCEEDED",
            ErrorCode::PartialCircular => "PARTIAL_CIRCULAR",
            ErrorCode::MismatchedTags => "MISMATCHED_TAGS",
            ErrorCode::ProcessFailed => "PROCESS_FAILED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that abort a render.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateError {
    /// The template or context handed to the engine has the wrong shape.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// `{{/each}}` with no `{{#each}}` before it.
    #[error("Found {{{{/each}}}} without a matching {{{{#each}}}}")]
    MissingEndEach,

    /// `{{#each}}` whose closing tag never appears.
    #[error("Unclosed {{{{#each {collection}}}}} block")]
    UnclosedEach { collection: String },

    /// The collection of an `{{#each}}` resolved to something other than a list.
    #[error("Cannot iterate over '{collection}': expected a list, found {kind}")]
    InvalidIterable { collection: String, kind: String },

    /// `{{/if}}` with no `{{#if}}` before it.
    #[error("Found {{{{/if}}}} without a matching {{{{#if}}}}")]
    MissingEndif,

    /// `{{#if}}` whose closing tag never appears.
    #[error("Unclosed {{{{#if {condition}}}}} block")]
    UnclosedIf { condition: String },

    /// The partial resolver has no content for this name.
    #[error("Partial not found: {name} (searched {source_name})")]
    PartialNotFound { name: String, source_name: String },

    /// Partial inclusion nested deeper than the configured ceiling.
    #[error("Partial nesting too deep (depth > {max_depth}) while including: {name}")]
    PartialDepthExceeded { name: String, max_depth: usize },

    /// A partial includes itself through the active expansion chain.
    #[error("Circular partial inclusion: {}", format_chain(.chain, .name))]
    PartialCircular { name: String, chain: Vec<String> },

    /// Blocks of different families are interleaved, e.g. `{{#if}}{{#each}}{{/if}}`.
    #[error("Mismatched tags: {{{{{close}}}}} closes {{{{{open}}}}} at line {line}, column {column}")]
    MismatchedTags {
        open: String,
        close: String,
        line: usize,
        column: usize,
    },

    /// An unexpected failure inside the pipeline.
    #[error("Template processing failed: {message}")]
    ProcessFailed { message: String },
}

fn format_chain(chain: &[String], name: &str) -> String {
    let mut parts: Vec<&str> = chain.iter().map(String::as_str).collect();
    parts.push(name);
    parts.join(" -> ")
}

impl TemplateError {
    /// The stable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            TemplateError::InvalidInput { .. } => ErrorCode::InvalidInput,
            TemplateError::MissingEndEach => ErrorCode::MissingEndEach,
            TemplateError::UnclosedEach { .. } => ErrorCode::UnclosedEach,
            TemplateError::InvalidIterable { .. } => ErrorCode::InvalidIterable,
            TemplateError::MissingEndif => ErrorCode::MissingEndif,
            TemplateError::UnclosedIf { .. } => ErrorCode::UnclosedIf,
            TemplateError::PartialNotFound { .. } => ErrorCode::PartialNotFound,
            TemplateError::PartialDepthExceeded { .. } => ErrorCode::PartialDepthExceeded,
            TemplateError::PartialCircular { .. } => ErrorCode::PartialCircular,
            TemplateError::MismatchedTags { .. } => ErrorCode::MismatchedTags,
            TemplateError::ProcessFailed { .. } => ErrorCode::ProcessFailed,
        }
    }

    /// Structured details about the failure, keyed by field name.
    pub fn details(&self) -> BTreeMap<String, String> {
        let mut details = BTreeMap::new();
        let mut put = |key: &str, value: String| {
            details.insert(key.to_string(), value);
        };
        match self {
            TemplateError::InvalidInput { message } => put("reason", message.clone()),
            TemplateError::MissingEndEach => put("tag", "{{/each}}".to_string()),
            TemplateError::MissingEndif => put("tag", "{{/if}}".to_string()),
            TemplateError::UnclosedEach { collection } => put("collection", collection.clone()),
            TemplateError::InvalidIterable { collection, kind } => {
                put("collection", collection.clone());
                put("kind", kind.clone());
            }
            TemplateError::UnclosedIf { condition } => put("condition", condition.clone()),
            TemplateError::PartialNotFound { name, source_name } => {
                put("partial", name.clone());
                put("source", source_name.clone());
            }
            TemplateError::PartialDepthExceeded { name, max_depth } => {
                put("partial", name.clone());
                put("max_depth", max_depth.to_string());
            }
            TemplateError::PartialCircular { name, chain } => {
                put("partial", name.clone());
                put("chain", format_chain(chain, name));
            }
            TemplateError::MismatchedTags {
                open,
                close,
                line,
                column,
            } => {
                put("open", open.clone());
                put("close", close.clone());
                put("line", line.to_string());
                put("column", column.to_string());
            }
            TemplateError::ProcessFailed { message } => put("cause", message.clone()),
        }
        details
    }
}

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;
