/*
 * iteration.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Iteration blocks: `{{#each collection}}…{{/each}}`.

use crate::conditional::process_conditionals;
use crate::error::{TemplateError, TemplateResult};
use crate::partial::expand_partials;
use crate::session::RenderSession;
use crate::tags::{Block, BlockKind, find_first_block};
use crate::value::{TemplateContext, Value};
use crate::variables::{ReservedTags, substitute_variables};

/// Resolve every `{{#each}}` block in `template` against `context`.
///
/// Blocks are handled leftmost first and the template is rescanned after
/// each replacement. A missing or null collection renders nothing; any other
/// non-list value is an error.
pub fn process_iterations(
    template: &str,
    context: &TemplateContext,
    session: &mut RenderSession<'_>,
) -> TemplateResult<String> {
    let mut current = template.to_string();

    while let Some(block) = find_first_block(&current, BlockKind::Each)? {
        let replacement = render_block(&block, &current, context, session)?;
        current = block.splice(&current, &replacement);
    }

    Ok(current)
}

fn render_block(
    block: &Block,
    template: &str,
    context: &TemplateContext,
    session: &mut RenderSession<'_>,
) -> TemplateResult<String> {
    let items = match context.lookup(&block.header) {
        None | Some(Value::Null) => {
            tracing::trace!(collection = %block.header, "Collection unresolved, skipping block");
            return Ok(String::new());
        }
        Some(Value::List(items)) => items,
        Some(other) => {
            return Err(TemplateError::InvalidIterable {
                collection: block.header.clone(),
                kind: other.kind_name().to_string(),
            });
        }
    };

    tracing::trace!(collection = %block.header, count = items.len(), "Iterating");

    let body = block.inner_text(template);
    let mut output = String::new();
    for (index, item) in items.iter().enumerate() {
        let scope = context.item_scope(item, index);
        output.push_str(&render_item(body, &scope, session)?);
    }
    Ok(output)
}

/// Render one iteration of a block body against its per-item context.
///
/// The body goes through the same fixed order as a whole template, minus the
/// final cleanup: conditionals, nested iterations, partials (when a resolver
/// is configured), then variables.
fn render_item(
    body: &str,
    scope: &TemplateContext,
    session: &mut RenderSession<'_>,
) -> TemplateResult<String> {
    let text = process_conditionals(body, scope)?;
    let text = process_iterations(&text, scope, session)?;
    let text = expand_partials(&text, scope, session, 0)?;
    Ok(substitute_variables(&text, scope, ReservedTags::Keep))
}
