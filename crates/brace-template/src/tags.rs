/*
 * tags.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Tag patterns and block matching.
//!
//! Block tags come in two families, `{{#if cond}}…{{/if}}` and
//! `{{#each coll}}…{{/each}}`. A single depth-counted matcher serves both:
//! it is parameterized only by the family's open and close patterns.

use crate::error::{TemplateError, TemplateResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

static IF_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*#if\s+([^{}]+?)\s*\}\}").unwrap());
static IF_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{\s*/if\s*\}\}").unwrap());
static EACH_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*#each\s+([^{}]+?)\s*\}\}").unwrap());
static EACH_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{\s*/each\s*\}\}").unwrap());

/// `{{> name}}`, capturing the partial name.
pub(crate) static PARTIAL_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*>\s*([^{}\s]+)\s*\}\}").unwrap());

/// Any `{{…}}` without nested braces, capturing the inner expression.
pub(crate) static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{([^{}]*)\}\}").unwrap());

/// The two block tag families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    If,
    Each,
}

impl BlockKind {
    /// Keyword used in the tags, e.g. `if` for `{{#if}}`/`{{/if}}`.
    pub fn keyword(&self) -> &'static str {
        match self {
            BlockKind::If => "if",
            BlockKind::Each => "each",
        }
    }

    fn open_pattern(&self) -> &'static Regex {
        match self {
            BlockKind::If => &IF_OPEN,
            BlockKind::Each => &EACH_OPEN,
        }
    }

    fn close_pattern(&self) -> &'static Regex {
        match self {
            BlockKind::If => &IF_CLOSE,
            BlockKind::Each => &EACH_CLOSE,
        }
    }

    fn missing_open_error(&self) -> TemplateError {
        match self {
            BlockKind::If => TemplateError::MissingEndif,
            BlockKind::Each => TemplateError::MissingEndEach,
        }
    }

    fn unclosed_error(&self, header: &str) -> TemplateError {
        match self {
            BlockKind::If => TemplateError::UnclosedIf {
                condition: header.to_string(),
            },
            BlockKind::Each => TemplateError::UnclosedEach {
                collection: header.to_string(),
            },
        }
    }
}

/// A matched open/close pair, as byte offsets into the scanned template.
///
/// `start..end` covers both tags; `inner` is the content between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    /// The condition or collection expression from the open tag.
    pub header: String,
    pub start: usize,
    pub end: usize,
    pub inner: Range<usize>,
}

impl Block {
    /// The content between the open and close tags.
    pub fn inner_text<'a>(&self, template: &'a str) -> &'a str {
        &template[self.inner.clone()]
    }

    /// Replace the whole block (both tags included) with `replacement`.
    pub fn splice(&self, template: &str, replacement: &str) -> String {
        let mut out = String::with_capacity(template.len() - (self.end - self.start) + replacement.len());
        out.push_str(&template[..self.start]);
        out.push_str(replacement);
        out.push_str(&template[self.end..]);
        out
    }
}

/// Whether a block tag opens or closes its block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Open,
    Close,
}

/// An `if`/`each` open or close tag, as the block matcher sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTag<'a> {
    pub kind: BlockKind,
    pub edge: Edge,
    /// Byte range of the whole tag, delimiters included.
    pub range: Range<usize>,
    /// The tag text without delimiters, trimmed (`#if ready`, `/each`).
    pub expr: &'a str,
}

/// Every block tag of both families in `template`, in document order.
///
/// Uses the same patterns as [`find_first_block`], so a tag that the
/// renderer would not treat as a block (e.g. `{{#if}}` with no condition)
/// is not reported.
pub fn scan_block_tags(template: &str) -> Vec<BlockTag<'_>> {
    let mut tags = Vec::new();
    for kind in [BlockKind::If, BlockKind::Each] {
        let patterns = [
            (Edge::Open, kind.open_pattern()),
            (Edge::Close, kind.close_pattern()),
        ];
        for (edge, pattern) in patterns {
            tags.extend(pattern.find_iter(template).map(|m| BlockTag {
                kind,
                edge,
                range: m.range(),
                expr: m.as_str()[2..m.len() - 2].trim(),
            }));
        }
    }
    tags.sort_by_key(|tag| tag.range.start);
    tags
}

/// Find the close tag matching an open tag whose text ends at `from`.
///
/// The family's tags at or after `from` are walked from depth 1. The close
/// that brings the depth to 0 is the match; its byte range is returned.
pub fn find_matching_close(template: &str, from: usize, kind: BlockKind) -> Option<Range<usize>> {
    let mut depth = 1usize;
    for tag in scan_block_tags(&template[from..]) {
        if tag.kind != kind {
            continue;
        }
        match tag.edge {
            Edge::Open => depth += 1,
            Edge::Close => {
                depth -= 1;
                if depth == 0 {
                    return Some(from + tag.range.start..from + tag.range.end);
                }
            }
        }
    }
    None
}

/// A close tag that pairs with an open of its own family while a block of
/// the other family, opened later, is still open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interleaving<'a> {
    pub open: BlockTag<'a>,
    pub close: BlockTag<'a>,
}

/// Replay the block tags with one stack and return the first interleaving.
///
/// Each close pairs with the innermost open of its own family. Closes with
/// no open at all are left for the block processors to report.
pub fn find_interleaving(template: &str) -> Option<Interleaving<'_>> {
    let mut stack: Vec<BlockTag<'_>> = Vec::new();

    for tag in scan_block_tags(template) {
        match tag.edge {
            Edge::Open => stack.push(tag),
            Edge::Close => {
                let Some(pos) = stack.iter().rposition(|open| open.kind == tag.kind) else {
                    continue;
                };
                if pos + 1 != stack.len() {
                    return Some(Interleaving {
                        open: stack.swap_remove(pos),
                        close: tag,
                    });
                }
                stack.pop();
            }
        }
    }
    None
}

/// Locate the leftmost block of `kind` in `template`.
///
/// Returns `Ok(None)` when no opening tag remains. A close tag appearing
/// before the leftmost open (or with no open at all) has nothing to pair
/// with and is an error, as is an open tag that is never closed.
pub fn find_first_block(template: &str, kind: BlockKind) -> TemplateResult<Option<Block>> {
    let first_open = kind.open_pattern().captures(template);
    let first_close = kind.close_pattern().find(template);

    let open = match (first_open, first_close) {
        (None, None) => return Ok(None),
        (None, Some(_)) => return Err(kind.missing_open_error()),
        (Some(open), Some(close)) if close.start() < open.get(0).map_or(0, |m| m.start()) => {
            return Err(kind.missing_open_error());
        }
        (Some(open), _) => open,
    };

    let (Some(whole), Some(header)) = (open.get(0), open.get(1)) else {
        return Ok(None);
    };
    let header = header.as_str().trim().to_string();

    match find_matching_close(template, whole.end(), kind) {
        Some(close) => Ok(Some(Block {
            kind,
            header,
            start: whole.start(),
            end: close.end,
            inner: whole.end()..close.start,
        })),
        None => Err(kind.unclosed_error(&header)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_close_simple() {
        let t = "{{#if a}}x{{/if}}";
        let close = find_matching_close(t, 9, BlockKind::If).unwrap();
        assert_eq!(&t[close], "{{/if}}");
    }

    #[test]
    fn test_matching_close_skips_nested() {
        let t = "{{#if a}}1{{#if b}}2{{/if}}3{{/if}}tail";
        let close = find_matching_close(t, 9, BlockKind::If).unwrap();
        assert_eq!(close.end, t.len() - "tail".len());
    }

    #[test]
    fn test_matching_close_ignores_other_family() {
        let t = "{{#each xs}}{{#if a}}{{/if}}{{/each}}";
        let close = find_matching_close(t, 12, BlockKind::Each).unwrap();
        assert_eq!(close.end, t.len());
    }

    #[test]
    fn test_matching_close_none() {
        assert_eq!(find_matching_close("{{#if a}}{{#if b}}{{/if}}", 9, BlockKind::If), None);
    }

    #[test]
    fn test_first_block_spans() {
        let t = "before {{#each items}}[{{this}}]{{/each}} after";
        let block = find_first_block(t, BlockKind::Each).unwrap().unwrap();
        assert_eq!(block.header, "items");
        assert_eq!(block.inner_text(t), "[{{this}}]");
        assert!(block.end > block.start);
        assert_eq!(block.splice(t, "X"), "before X after");
    }

    #[test]
    fn test_first_block_whitespace_in_tags() {
        let t = "{{ #if  flag  }}yes{{ /if }}";
        let block = find_first_block(t, BlockKind::If).unwrap().unwrap();
        assert_eq!(block.header, "flag");
        assert_eq!(block.inner_text(t), "yes");
    }

    #[test]
    fn test_first_block_close_before_open() {
        let err = find_first_block("{{/if}}{{#if a}}{{/if}}", BlockKind::If).unwrap_err();
        assert_eq!(err, TemplateError::MissingEndif);
    }

    #[test]
    fn test_first_block_unclosed() {
        let err = find_first_block("{{#each rows}}", BlockKind::Each).unwrap_err();
        assert_eq!(
            err,
            TemplateError::UnclosedEach {
                collection: "rows".to_string()
            }
        );
    }

    #[test]
    fn test_scan_block_tags_order() {
        let t = "{{#each xs}}{{ #if a }}{{/if}}{{/each}}";
        let found: Vec<(BlockKind, Edge, &str)> = scan_block_tags(t)
            .iter()
            .map(|tag| (tag.kind, tag.edge, tag.expr))
            .collect();
        assert_eq!(
            found,
            vec![
                (BlockKind::Each, Edge::Open, "#each xs"),
                (BlockKind::If, Edge::Open, "#if a"),
                (BlockKind::If, Edge::Close, "/if"),
                (BlockKind::Each, Edge::Close, "/each"),
            ]
        );
    }

    #[test]
    fn test_scan_skips_open_without_header() {
        let tags = scan_block_tags("{{#each xs}}{{#if}}{{/each}}");
        assert_eq!(tags.len(), 2);
        assert!(tags.iter().all(|tag| tag.kind == BlockKind::Each));
        assert_eq!(find_interleaving("{{#each xs}}{{#if}}{{/each}}"), None);
    }

    #[test]
    fn test_interleaving() {
        assert_eq!(find_interleaving("{{#if a}}{{#each b}}{{/each}}{{/if}}"), None);
        assert_eq!(find_interleaving("content{{/if}}"), None);

        let t = "{{#if a}}\n{{#each b}}{{/if}}{{/each}}";
        let found = find_interleaving(t).unwrap();
        assert_eq!(found.open.expr, "#if a");
        assert_eq!(found.close.expr, "/if");
        assert_eq!(found.close.range.start, 21);
    }

    #[test]
    fn test_interleaving_behind_stray_braces() {
        let found = find_interleaving("{{ {{#if a}}{{#each b}}X{{/if}}Y{{/each}}").unwrap();
        assert_eq!(found.open.expr, "#if a");
        assert_eq!(found.close.range.start, 24);
    }

    #[test]
    fn test_first_block_none() {
        assert_eq!(find_first_block("plain {{var}}", BlockKind::If).unwrap(), None);
    }
}
