/*
 * variables.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Variable interpolation: `{{name}}`, `{{this}}`, `{{a.b.c}}`.

use crate::tags::ANY_TAG;
use crate::value::TemplateContext;
use regex::Captures;

/// Expression prefixes owned by the block and partial processors.
const RESERVED_PREFIXES: [&str; 5] = ["#if", "/if", "#each", "/each", ">"];

/// What to do with block or partial tags the substitutor runs into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservedTags {
    /// Leave them in place for a later stage.
    Keep,
    /// Drop them; nothing after this stage will process them.
    Strip,
}

/// Whether a trimmed tag expression belongs to a block or partial tag.
pub fn is_reserved(expr: &str) -> bool {
    RESERVED_PREFIXES.iter().any(|p| expr.starts_with(p))
}

/// Replace every variable tag in `template` with its value from `context`.
///
/// Unresolved and null values become empty text. Within one call substituted
/// values are not rescanned. Text produced inside an `{{#each}}` body or a
/// partial still goes through the later top-level stages, so a `{{…}}` in
/// such a value is resolved again against the outer context; only the final
/// top-level pass emits values verbatim.
pub fn substitute_variables(
    template: &str,
    context: &TemplateContext,
    reserved: ReservedTags,
) -> String {
    ANY_TAG
        .replace_all(template, |caps: &Captures| {
            let expr = caps[1].trim();
            if is_reserved(expr) {
                return match reserved {
                    ReservedTags::Keep => caps[0].to_string(),
                    ReservedTags::Strip => String::new(),
                };
            }
            context.lookup(expr).map(|v| v.render()).unwrap_or_default()
        })
        .into_owned()
}
