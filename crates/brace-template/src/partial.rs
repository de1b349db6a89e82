/*
 * partial.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Partial expansion: `{{> name}}`.
//!
//! Partials are textual macros. Their content is fetched from the session's
//! resolver, nested partials are expanded first, and variables inside the
//! fetched text are resolved against the *caller's* context before the
//! result is spliced in place of the tag.

use crate::error::{TemplateError, TemplateResult};
use crate::resolver::PartialResolver;
use crate::session::RenderSession;
use crate::tags::PARTIAL_TAG;
use crate::value::TemplateContext;
use crate::variables::{ReservedTags, substitute_variables};
use std::ops::Range;

/// Expand every partial tag in `template`.
///
/// Occurrences are collected in one pass and spliced in reverse document
/// order so earlier offsets stay valid. If the splice introduced new partial
/// tags (through substituted variable values) another pass runs, one level
/// deeper, until none remain or the depth ceiling is hit.
///
/// Without a resolver on the session the template is returned unchanged.
pub fn expand_partials(
    template: &str,
    context: &TemplateContext,
    session: &mut RenderSession<'_>,
    depth: usize,
) -> TemplateResult<String> {
    let Some(resolver) = session.resolver else {
        return Ok(template.to_string());
    };

    let mut current = template.to_string();
    let mut pass_depth = depth;

    loop {
        let occurrences: Vec<(Range<usize>, String)> = PARTIAL_TAG
            .captures_iter(&current)
            .filter_map(|caps| Some((caps.get(0)?.range(), caps.get(1)?.as_str().to_string())))
            .collect();

        if occurrences.is_empty() {
            return Ok(current);
        }

        for (range, name) in occurrences.into_iter().rev() {
            let content = include_partial(&name, resolver, context, session, pass_depth)?;
            current.replace_range(range, &content);
        }
        pass_depth += 1;
    }
}

/// Fetch and fully resolve one partial referenced from a fragment at `depth`.
fn include_partial(
    name: &str,
    resolver: &dyn PartialResolver,
    context: &TemplateContext,
    session: &mut RenderSession<'_>,
    depth: usize,
) -> TemplateResult<String> {
    if session.is_resolving(name) {
        return Err(TemplateError::PartialCircular {
            name: name.to_string(),
            chain: session.resolving_chain().to_vec(),
        });
    }
    if depth + 1 > session.max_partial_depth {
        return Err(TemplateError::PartialDepthExceeded {
            name: name.to_string(),
            max_depth: session.max_partial_depth,
        });
    }

    session.enter_partial(name);
    let result = resolve_content(name, resolver, context, session, depth + 1);
    session.leave_partial(name);
    result
}

fn resolve_content(
    name: &str,
    resolver: &dyn PartialResolver,
    context: &TemplateContext,
    session: &mut RenderSession<'_>,
    depth: usize,
) -> TemplateResult<String> {
    let content = resolver
        .get_partial(name)
        .ok_or_else(|| TemplateError::PartialNotFound {
            name: name.to_string(),
            source_name: resolver.source_name(),
        })?;

    tracing::debug!(partial = name, depth, "Expanding partial");

    let expanded = expand_partials(&content, context, session, depth)?;
    Ok(substitute_variables(&expanded, context, ReservedTags::Keep))
}
