/*
 * conditional.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Conditional blocks: `{{#if cond}}…{{/if}}`.

use crate::error::TemplateResult;
use crate::tags::{BlockKind, find_first_block};
use crate::value::TemplateContext;

/// Resolve every `{{#if}}` block in `template` against `context`.
///
/// Blocks are handled leftmost first. A truthy block is replaced by its inner
/// content (with nested conditionals already resolved); a falsy one is
/// removed. The template is rescanned after each replacement until no
/// opening tag is left.
pub fn process_conditionals(template: &str, context: &TemplateContext) -> TemplateResult<String> {
    let mut current = template.to_string();

    while let Some(block) = find_first_block(&current, BlockKind::If)? {
        let truthy = context
            .lookup(&block.header)
            .is_some_and(|value| value.is_truthy());

        tracing::trace!(condition = %block.header, truthy, "Resolved conditional");

        let replacement = if truthy {
            process_conditionals(block.inner_text(&current), context)?
        } else {
            String::new()
        };
        current = block.splice(&current, &replacement);
    }

    Ok(current)
}
