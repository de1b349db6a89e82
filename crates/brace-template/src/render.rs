/*
 * render.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The public render entry points.
//!
//! A render runs a fixed pipeline over the whole template:
//! conditionals, then iterations, then partials, then variables. The order is
//! a precedence rule, not a heuristic: a tag is handled by the first stage
//! that recognizes it.

use crate::conditional::process_conditionals;
use crate::error::{TemplateError, TemplateResult};
use crate::iteration::process_iterations;
use crate::partial::expand_partials;
use crate::resolver::PartialResolver;
use crate::session::{DEFAULT_MAX_PARTIAL_DEPTH, RenderSession};
use crate::tags::find_interleaving;
use crate::validator::line_column;
use crate::value::TemplateContext;
use crate::variables::{ReservedTags, substitute_variables};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Options for a render call.
#[derive(Clone, Copy)]
pub struct RenderOptions<'a> {
    /// Where `{{> name}}` content comes from. Without one, partial tags
    /// render as empty text.
    pub resolver: Option<&'a dyn PartialResolver>,

    /// Maximum partial nesting depth before error.
    pub max_partial_depth: usize,

    /// Refuse templates whose `if`/`each` blocks interleave.
    pub check_tags: bool,
}

impl<'a> RenderOptions<'a> {
    /// Options with no resolver, the default depth ceiling and tag checking on.
    pub fn new() -> Self {
        Self {
            resolver: None,
            max_partial_depth: DEFAULT_MAX_PARTIAL_DEPTH,
            check_tags: true,
        }
    }

    /// Set the partial resolver.
    pub fn with_resolver(mut self, resolver: &'a dyn PartialResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Set the maximum partial nesting depth.
    pub fn with_max_partial_depth(mut self, depth: usize) -> Self {
        self.max_partial_depth = depth;
        self
    }

    /// Enable or disable the up-front interleaving check.
    pub fn with_tag_check(mut self, check: bool) -> Self {
        self.check_tags = check;
        self
    }
}

impl Default for RenderOptions<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RenderOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderOptions")
            .field(
                "resolver",
                &self.resolver.map(|r| r.source_name()),
            )
            .field("max_partial_depth", &self.max_partial_depth)
            .field("check_tags", &self.check_tags)
            .finish()
    }
}

/// Render `template` against `context`.
///
/// Any failure aborts the whole render. A panic raised inside the pipeline
/// (for example by a resolver) is reported as `PROCESS_FAILED`.
pub fn render(
    template: &str,
    context: &TemplateContext,
    options: &RenderOptions<'_>,
) -> TemplateResult<String> {
    tracing::debug!(
        len = template.len(),
        variables = context.len(),
        partials = options.resolver.is_some(),
        "Rendering template"
    );

    panic::catch_unwind(AssertUnwindSafe(|| run_pipeline(template, context, options)))
        .unwrap_or_else(|payload| {
            Err(TemplateError::ProcessFailed {
                message: panic_message(payload),
            })
        })
}

/// Render `template` against a JSON context, which must be an object.
pub fn render_json(
    template: &str,
    context: &serde_json::Value,
    options: &RenderOptions<'_>,
) -> TemplateResult<String> {
    let context = TemplateContext::from_json(context.clone())?;
    render(template, &context, options)
}

fn run_pipeline(
    template: &str,
    context: &TemplateContext,
    options: &RenderOptions<'_>,
) -> TemplateResult<String> {
    if options.check_tags
        && let Some(found) = find_interleaving(template)
    {
        let (line, column) = line_column(template, found.close.range.start);
        return Err(TemplateError::MismatchedTags {
            open: found.open.expr.to_string(),
            close: found.close.expr.to_string(),
            line,
            column,
        });
    }

    let mut session = RenderSession::new()
        .with_resolver(options.resolver)
        .with_max_partial_depth(options.max_partial_depth);

    let text = process_conditionals(template, context)?;
    let text = process_iterations(&text, context, &mut session)?;
    let text = expand_partials(&text, context, &mut session, 0)?;
    Ok(substitute_variables(&text, context, ReservedTags::Strip))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "panic with non-string payload".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::resolver::MemoryResolver;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn render_plain(template: &str, json: serde_json::Value) -> TemplateResult<String> {
        render_json(template, &json, &RenderOptions::new())
    }

    #[test]
    fn test_literal_text() {
        assert_eq!(render_plain("Hello, world!", json!({})).unwrap(), "Hello, world!");
    }

    #[test]
    fn test_full_pipeline() {
        let resolver = MemoryResolver::with_partials([("sig", "-- {{author}}")]);
        let options = RenderOptions::new().with_resolver(&resolver);
        let out = render_json(
            "{{#if title}}# {{title}}\n{{/if}}{{#each items}}- {{this}}\n{{/each}}{{> sig}}",
            &json!({"title": "List", "items": ["a", "b"], "author": "me"}),
            &options,
        )
        .unwrap();
        assert_eq!(out, "# List\n- a\n- b\n-- me");
    }

    #[test]
    fn test_conditionals_run_before_iterations() {
        // The top-level conditional pass sees `flag` in the outer context
        let out = render_plain(
            "{{#each xs}}{{#if flag}}{{this}}{{/if}}{{/each}}",
            json!({"xs": [1, 2], "flag": true}),
        );
        assert_eq!(out.unwrap(), "12");
    }

    #[test]
    fn test_if_in_each_body_ignores_element_keys() {
        let out = render_plain(
            "{{#each users}}{{#if admin}}*{{/if}}{{name}} {{/each}}",
            json!({"users": [{"name": "a", "admin": true}, {"name": "b", "admin": false}]}),
        );
        assert_eq!(out.unwrap(), "a b ");
    }

    #[test]
    fn test_partials_without_resolver_render_empty() {
        assert_eq!(render_plain("a{{> nav}}b", json!({})).unwrap(), "ab");
    }

    #[test]
    fn test_invalid_context() {
        let err = render_plain("x", json!("not a map")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInput);
    }

    #[test]
    fn test_interleaved_blocks_are_refused() {
        let err = render_plain(
            "{{#if a}}{{#each b}}{{/if}}{{/each}}",
            json!({"a": true, "b": [1]}),
        )
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::MismatchedTags);
        assert_eq!(err.details()["open"], "#if a");
        assert_eq!(err.details()["column"], "21");
    }

    #[test]
    fn test_interleaving_behind_stray_braces_is_refused() {
        let err = render_plain(
            "{{ {{#if a}}{{#each b}}X{{/if}}Y{{/each}}",
            json!({"a": true, "b": [1, 2]}),
        )
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::MismatchedTags);
        assert_eq!(err.details()["column"], "25");
    }

    #[test]
    fn test_if_without_condition_is_not_a_block() {
        let template = "{{#each xs}}{{#if}}{{/each}}";
        assert_eq!(render_plain(template, json!({"xs": [1]})).unwrap(), "");

        let options = RenderOptions::new().with_tag_check(false);
        assert_eq!(
            render_json(template, &json!({"xs": [1]}), &options).unwrap(),
            ""
        );
    }

    #[test]
    fn test_substituted_values_are_rescanned_by_later_stages() {
        // `this` is interpolated inside the item body; the final variable
        // pass then resolves the tag it produced against the outer context
        let out = render_plain(
            "{{#each xs}}[{{this}}]{{/each}}",
            json!({"xs": ["{{secret}}"], "secret": "s"}),
        );
        assert_eq!(out.unwrap(), "[s]");

        // A top-level value is substituted last and emitted verbatim
        let out = render_plain("{{v}}", json!({"v": "{{secret}}", "secret": "s"}));
        assert_eq!(out.unwrap(), "{{secret}}");
    }

    #[test]
    fn test_tag_check_can_be_disabled() {
        let options = RenderOptions::new().with_tag_check(false);
        let out = render_json(
            "{{#if a}}{{#each b}}{{/if}}{{/each}}",
            &json!({"a": false, "b": [1]}),
            &options,
        );
        // The `if` family is matched independently and removes everything up
        // to its close, leaving a stray `{{/each}}`
        assert_eq!(out.unwrap_err().code(), ErrorCode::MissingEndEach);
    }

    struct PanickingResolver;

    impl PartialResolver for PanickingResolver {
        fn get_partial(&self, _name: &str) -> Option<String> {
            panic!("store exploded");
        }

        fn source_name(&self) -> String {
            "<panics>".to_string()
        }
    }

    #[test]
    fn test_panics_become_process_failed() {
        let resolver = PanickingResolver;
        let options = RenderOptions::new().with_resolver(&resolver);
        let err = render("{{> x}}", &TemplateContext::new(), &options).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProcessFailed);
        assert_eq!(err.details()["cause"], "store exploded");
    }

    #[test]
    fn test_options_debug() {
        let resolver = MemoryResolver::new();
        let options = RenderOptions::new().with_resolver(&resolver).with_max_partial_depth(4);
        let debug = format!("{:?}", options);
        assert!(debug.contains("<memory>"));
        assert!(debug.contains("max_partial_depth: 4"));
    }
}
