/*
 * validator.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Static template validation.
//!
//! [`validate`] is a pure function of the template text. It needs no context
//! and no partial resolver, never stops at the first problem, and reports
//! every finding with a 1-based line and column.
//!
//! Three independent passes run over the scanned tags:
//!
//! 1. **Syntax**: each tag must be a variable, a block open/close, or a
//!    partial with a well-formed name
//! 2. **Nesting**: a single stack replay over all block tags; closes that do
//!    not match the innermost open are `UNOPENED_TAG`, leftovers are
//!    `UNCLOSED_TAG`
//! 3. **Integrity**: a second replay pairing each close with the innermost
//!    open of its own family, flagging cross-family interleaving as
//!    `MISMATCHED_TAGS`

use crate::tags::BlockKind;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

static PARTIAL_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_./-]+$").unwrap());

/// Kinds of validation findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationErrorKind {
    /// A tag that is not one of the recognized forms.
    InvalidSyntax,
    /// A close tag with nothing (or the wrong block) open.
    UnopenedTag,
    /// An open tag that is never closed.
    UnclosedTag,
    /// Blocks of different families closed out of order.
    MismatchedTags,
}

impl ValidationErrorKind {
    /// The stable string form of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationErrorKind::InvalidSyntax => "INVALID_SYNTAX",
            ValidationErrorKind::UnopenedTag => "UNOPENED_TAG",
            ValidationErrorKind::UnclosedTag => "UNCLOSED_TAG",
            ValidationErrorKind::MismatchedTags => "MISMATCHED_TAGS",
        }
    }
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// 1-based line.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub column: usize,
    #[serde(rename = "type")]
    pub kind: ValidationErrorKind,
    pub message: String,
    /// The offending tag text.
    pub tag: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}: {}",
            self.line, self.column, self.kind, self.message
        )
    }
}

/// The outcome of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Validate `template` and report every problem found.
pub fn validate(template: &str) -> ValidationReport {
    let tokens = scan_tags(template);
    let index = LineIndex::new(template);
    let mut findings = Vec::new();

    check_syntax(&tokens, &mut findings);
    check_nesting(&tokens, &mut findings);
    for mismatch in replay_families(&tokens) {
        findings.push(Finding {
            offset: mismatch.close.start,
            kind: ValidationErrorKind::MismatchedTags,
            message: mismatch.message(),
            tag: mismatch.close.raw.to_string(),
        });
    }

    findings.sort_by_key(|f| f.offset);
    let errors: Vec<ValidationError> = findings
        .into_iter()
        .map(|f| {
            let (line, column) = index.position(template, f.offset);
            ValidationError {
                line,
                column,
                kind: f.kind,
                message: f.message,
                tag: f.tag,
            }
        })
        .collect();

    tracing::debug!(errors = errors.len(), "Validated template");

    ValidationReport {
        valid: errors.is_empty(),
        errors,
    }
}

/// 1-based line and column (in characters) of a byte offset in `source`.
pub(crate) fn line_column(source: &str, offset: usize) -> (usize, usize) {
    LineIndex::new(source).position(source, offset)
}

#[derive(Debug)]
struct Finding {
    offset: usize,
    kind: ValidationErrorKind,
    message: String,
    tag: String,
}

/// How a scanned `{{…}}` classifies.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TagForm<'a> {
    Variable,
    Open(BlockKind, &'a str),
    Close(BlockKind),
    Partial(&'a str),
    Empty,
    NestedBraces,
    Unrecognized,
    Unterminated,
}

#[derive(Debug, Clone)]
struct Token<'a> {
    start: usize,
    raw: &'a str,
    content: &'a str,
    form: TagForm<'a>,
}

/// Find every `{{…}}` in `template`, in document order.
///
/// Each `{{` is paired with the next `}}`; a `{{` with no `}}` after it
/// yields an unterminated token covering the rest of the text.
fn scan_tags(template: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while let Some(found) = template[pos..].find("{{") {
        let start = pos + found;
        let body_start = start + 2;
        match template[body_start..].find("}}") {
            Some(len) => {
                let end = body_start + len + 2;
                let content = &template[body_start..body_start + len];
                tokens.push(Token {
                    start,
                    raw: &template[start..end],
                    content,
                    form: classify(content),
                });
                pos = end;
            }
            None => {
                tokens.push(Token {
                    start,
                    raw: &template[start..],
                    content: &template[body_start..],
                    form: TagForm::Unterminated,
                });
                break;
            }
        }
    }
    tokens
}

fn classify(content: &str) -> TagForm<'_> {
    let expr = content.trim();
    if expr.contains(['{', '}']) {
        return TagForm::NestedBraces;
    }
    if expr.is_empty() {
        return TagForm::Empty;
    }
    if let Some(rest) = expr.strip_prefix('#') {
        for kind in [BlockKind::If, BlockKind::Each] {
            if let Some(param) = rest.strip_prefix(kind.keyword())
                && (param.is_empty() || param.starts_with(char::is_whitespace))
            {
                return TagForm::Open(kind, param.trim());
            }
        }
        return TagForm::Unrecognized;
    }
    if let Some(rest) = expr.strip_prefix('/') {
        return match rest {
            "if" => TagForm::Close(BlockKind::If),
            "each" => TagForm::Close(BlockKind::Each),
            _ => TagForm::Unrecognized,
        };
    }
    if let Some(name) = expr.strip_prefix('>') {
        return TagForm::Partial(name.trim());
    }
    TagForm::Variable
}

fn check_syntax(tokens: &[Token<'_>], findings: &mut Vec<Finding>) {
    for token in tokens {
        let message = match &token.form {
            TagForm::Variable | TagForm::Close(_) => continue,
            TagForm::Open(kind, param) => {
                if !param.is_empty() {
                    continue;
                }
                match kind {
                    BlockKind::If => "{{#if}} requires a condition".to_string(),
                    BlockKind::Each => "{{#each}} requires a collection name".to_string(),
                }
            }
            TagForm::Partial(name) => {
                if name.is_empty() {
                    "Partial tag requires a name".to_string()
                } else if !PARTIAL_NAME.is_match(name) {
                    format!(
                        "Invalid partial name '{}': use letters, digits, '_', '.', '/' or '-'",
                        name
                    )
                } else {
                    continue;
                }
            }
            TagForm::Empty => "Empty tag".to_string(),
            TagForm::NestedBraces => "Tag contains nested braces".to_string(),
            TagForm::Unrecognized => format!("Unrecognized tag '{}'", token.content.trim()),
            TagForm::Unterminated => "Unterminated tag: missing closing '}}'".to_string(),
        };
        findings.push(Finding {
            offset: token.start,
            kind: ValidationErrorKind::InvalidSyntax,
            message,
            tag: token.raw.to_string(),
        });
    }
}

fn check_nesting(tokens: &[Token<'_>], findings: &mut Vec<Finding>) {
    let mut stack: Vec<(BlockKind, &Token<'_>)> = Vec::new();

    for token in tokens {
        match token.form {
            TagForm::Open(kind, _) => stack.push((kind, token)),
            TagForm::Close(kind) => match stack.last() {
                Some((top, _)) if *top == kind => {
                    stack.pop();
                }
                Some((_, open)) => findings.push(Finding {
                    offset: token.start,
                    kind: ValidationErrorKind::UnopenedTag,
                    message: format!(
                        "{{{{/{}}}}} does not match the open {}",
                        kind.keyword(),
                        open.raw
                    ),
                    tag: token.raw.to_string(),
                }),
                None => findings.push(Finding {
                    offset: token.start,
                    kind: ValidationErrorKind::UnopenedTag,
                    message: format!(
                        "{{{{/{kw}}}}} without a matching {{{{#{kw}}}}}",
                        kw = kind.keyword()
                    ),
                    tag: token.raw.to_string(),
                }),
            },
            _ => {}
        }
    }

    for (_, open) in stack {
        findings.push(Finding {
            offset: open.start,
            kind: ValidationErrorKind::UnclosedTag,
            message: format!("Unclosed {} block", open.raw),
            tag: open.raw.to_string(),
        });
    }
}

struct Mismatch<'t, 'a> {
    open: &'t Token<'a>,
    close: &'t Token<'a>,
    interrupted_by: &'t Token<'a>,
}

impl Mismatch<'_, '_> {
    fn message(&self) -> String {
        format!(
            "{} closes {} while {} is still open",
            self.close.raw, self.open.raw, self.interrupted_by.raw
        )
    }
}

/// Pair every close with the innermost open of the same family.
///
/// A close whose partner is not the innermost open overall means blocks of
/// different families interleave. Closes with no partner at all are left to
/// the nesting pass.
fn replay_families<'t, 'a>(tokens: &'t [Token<'a>]) -> Vec<Mismatch<'t, 'a>> {
    let mut stack: Vec<(BlockKind, &Token<'a>)> = Vec::new();
    let mut mismatches = Vec::new();

    for token in tokens {
        match token.form {
            TagForm::Open(kind, _) => stack.push((kind, token)),
            TagForm::Close(kind) => {
                let Some(pos) = stack.iter().rposition(|(k, _)| *k == kind) else {
                    continue;
                };
                if pos + 1 != stack.len() {
                    mismatches.push(Mismatch {
                        open: stack[pos].1,
                        close: token,
                        interrupted_by: stack[stack.len() - 1].1,
                    });
                }
                stack.remove(pos);
            }
            _ => {}
        }
    }
    mismatches
}

/// Byte offsets of line starts, for offset → (line, column) lookups.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    /// 1-based line and column for a byte offset. Columns count characters.
    fn position(&self, source: &str, offset: usize) -> (usize, usize) {
        let line = match self.starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let line_start = self.starts[line];
        let column = source[line_start..offset].chars().count() + 1;
        (line + 1, column)
    }
}
