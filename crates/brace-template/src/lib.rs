/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Brace-delimited text template engine.
//!
//! Supported syntax:
//!
//! - Variable interpolation: `{{name}}`, `{{this}}`
//! - Nested field access: `{{employee.salary}}`
//! - Conditionals: `{{#if cond}}...{{/if}}`
//! - Iteration: `{{#each items}}...{{/each}}`, with `this` and `index` bound
//!   for every element
//! - Partials: `{{> name}}`, loaded through a [`PartialResolver`]
//!
//! Whitespace inside the delimiters is insignificant except as the separator
//! after `#if`, `#each` and `>`.
//!
//! # Architecture
//!
//! Rendering is a fixed pipeline over the template text: conditionals, then
//! iterations, then partials, then variables. Each stage finds the leftmost
//! tag it owns, splices in the result and rescans. Every failure is fatal and
//! carries a stable [`ErrorCode`].
//!
//! Because conditionals run first, an `{{#if}}` written inside an
//! `{{#each}}` body is decided by the top-level pass against the outer
//! context, not per element. `{{#each users}}{{#if admin}}*{{/if}}{{/each}}`
//! tests the outer `admin`, not each user's.
//!
//! [`validate`] is an independent static pass. It needs no data, collects
//! every problem instead of stopping at the first, and reports positions as
//! 1-based line/column pairs.
//!
//! # Example
//!
//! ```ignore
//! use brace_template::{MemoryResolver, RenderOptions, TemplateContext, render};
//!
//! let mut ctx = TemplateContext::new();
//! ctx.insert("name", "World");
//!
//! let partials = MemoryResolver::with_partials([("sig", "-- {{name}}")]);
//! let options = RenderOptions::new().with_resolver(&partials);
//!
//! let output = render("Hello, {{name}}!\n{{> sig}}", &ctx, &options)?;
//! assert_eq!(output, "Hello, World!\n-- World");
//! ```

pub mod conditional;
pub mod error;
pub mod iteration;
pub mod partial;
pub mod render;
pub mod resolver;
pub mod session;
pub mod tags;
pub mod validator;
pub mod value;
pub mod variables;

// Re-export main types at crate root
pub use error::{ErrorCode, TemplateError, TemplateResult};
pub use render::{RenderOptions, render, render_json};
pub use resolver::{FileSystemResolver, MemoryResolver, NullResolver, PartialResolver};
pub use session::DEFAULT_MAX_PARTIAL_DEPTH;
pub use validator::{ValidationError, ValidationErrorKind, ValidationReport, validate};
pub use value::{TemplateContext, Value};
