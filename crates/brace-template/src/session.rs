/*
 * session.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Per-call render state.
//!
//! A [`RenderSession`] is created fresh for every top-level render call and
//! threaded through the iteration and partial stages. It carries:
//!
//! 1. **Configuration**: the partial resolver and the depth ceiling
//! 2. **State tracking**: the set of partial names on the active expansion
//!    chain, used for cycle detection

use crate::resolver::PartialResolver;

/// Default ceiling for nested partial inclusion.
pub const DEFAULT_MAX_PARTIAL_DEPTH: usize = 10;

/// State threaded through one render call.
pub struct RenderSession<'a> {
    /// Where partial content comes from. `None` disables partial expansion.
    pub resolver: Option<&'a dyn PartialResolver>,

    /// Maximum partial nesting depth before error.
    pub max_partial_depth: usize,

    /// Partial names currently being expanded, outermost first.
    resolving: Vec<String>,
}

impl<'a> RenderSession<'a> {
    /// Create a session with no resolver and the default depth ceiling.
    pub fn new() -> Self {
        Self {
            resolver: None,
            max_partial_depth: DEFAULT_MAX_PARTIAL_DEPTH,
            resolving: Vec::new(),
        }
    }

    /// Set the partial resolver.
    pub fn with_resolver(mut self, resolver: Option<&'a dyn PartialResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Set the maximum partial nesting depth.
    pub fn with_max_partial_depth(mut self, depth: usize) -> Self {
        self.max_partial_depth = depth;
        self
    }

    /// Whether `name` is already on the active expansion chain.
    pub fn is_resolving(&self, name: &str) -> bool {
        self.resolving.iter().any(|n| n == name)
    }

    /// Push `name` onto the expansion chain.
    pub fn enter_partial(&mut self, name: &str) {
        self.resolving.push(name.to_string());
    }

    /// Pop `name` off the expansion chain.
    pub fn leave_partial(&mut self, name: &str) {
        if let Some(pos) = self.resolving.iter().rposition(|n| n == name) {
            self.resolving.remove(pos);
        }
    }

    /// The active expansion chain, outermost first.
    pub fn resolving_chain(&self) -> &[String] {
        &self.resolving
    }
}

impl Default for RenderSession<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::MemoryResolver;

    #[test]
    fn test_session_new() {
        let session = RenderSession::new();
        assert!(session.resolver.is_none());
        assert_eq!(session.max_partial_depth, 10);
        assert!(session.resolving_chain().is_empty());
    }

    #[test]
    fn test_session_configuration() {
        let resolver = MemoryResolver::new();
        let session = RenderSession::new()
            .with_resolver(Some(&resolver))
            .with_max_partial_depth(3);
        assert!(session.resolver.is_some());
        assert_eq!(session.max_partial_depth, 3);
    }

    #[test]
    fn test_resolving_chain() {
        let mut session = RenderSession::new();
        session.enter_partial("a");
        session.enter_partial("b");
        assert!(session.is_resolving("a"));
        assert!(session.is_resolving("b"));
        assert_eq!(session.resolving_chain(), ["a".to_string(), "b".to_string()]);

        session.leave_partial("b");
        assert!(!session.is_resolving("b"));
        assert!(session.is_resolving("a"));

        session.leave_partial("a");
        assert!(session.resolving_chain().is_empty());
    }
}
