/*
 * resolver.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Partial template resolution.
//!
//! The engine never reads partial content itself. It asks an injected
//! [`PartialResolver`] for the text behind a `{{> name}}` tag; this module
//! provides that trait and implementations backed by a directory, an
//! in-memory map, or nothing at all.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Suffixes tried, in order, by [`FileSystemResolver`].
pub const DEFAULT_SUFFIXES: [&str; 4] = ["", ".html", ".md", ".txt"];

/// Trait for loading partial templates.
///
/// Implementations must be read-only and synchronous. A `None` result is
/// fatal to the render that asked for it.
pub trait PartialResolver {
    /// Load a partial template by name, e.g. `"header"` or `"inc/footer"`.
    fn get_partial(&self, name: &str) -> Option<String>;

    /// Human-readable description of where partials are looked up.
    fn source_name(&self) -> String;
}

/// Resolver that loads partials from a directory.
///
/// A name is tried as-is, then with each configured suffix appended
/// (by default `.html`, `.md`, `.txt`). Names that are absolute or contain
/// `..` components are never looked up.
#[derive(Debug, Clone)]
pub struct FileSystemResolver {
    root: PathBuf,
    suffixes: Vec<String>,
}

impl FileSystemResolver {
    /// Create a resolver rooted at `root` with the default suffix order.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            suffixes: DEFAULT_SUFFIXES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the suffix list. Include `""` to try the bare name.
    pub fn with_suffixes(mut self, suffixes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.suffixes = suffixes.into_iter().map(Into::into).collect();
        self
    }

    /// Candidate paths for `name`, in lookup order.
    pub fn candidates(&self, name: &str) -> Vec<PathBuf> {
        if !is_contained(name) {
            return Vec::new();
        }
        self.suffixes
            .iter()
            .map(|suffix| self.root.join(format!("{}{}", name, suffix)))
            .collect()
    }
}

impl PartialResolver for FileSystemResolver {
    fn get_partial(&self, name: &str) -> Option<String> {
        self.candidates(name).into_iter().find_map(|path| {
            if !path.is_file() {
                return None;
            }
            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    tracing::debug!(partial = name, path = %path.display(), "Loaded partial");
                    Some(content)
                }
                Err(e) => {
                    tracing::warn!("Failed to read partial {}: {}", path.display(), e);
                    None
                }
            }
        })
    }

    fn source_name(&self) -> String {
        self.root.display().to_string()
    }
}

/// Whether a partial name stays inside the resolver's directory.
fn is_contained(name: &str) -> bool {
    !name.is_empty()
        && Path::new(name)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Resolver that returns nothing.
///
/// Every lookup fails, so any partial tag reached during a render is an error.
#[derive(Debug, Clone, Default)]
pub struct NullResolver;

impl PartialResolver for NullResolver {
    fn get_partial(&self, _name: &str) -> Option<String> {
        None
    }

    fn source_name(&self) -> String {
        "<none>".to_string()
    }
}

/// Resolver that loads partials from an in-memory map.
///
/// Useful for testing and for scenarios where templates are bundled
/// into the application.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    partials: HashMap<String, String>,
}

impl MemoryResolver {
    /// Create a new empty memory resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a partial to the resolver.
    pub fn add(&mut self, name: impl Into<String>, content: impl Into<String>) -> &mut Self {
        self.partials.insert(name.into(), content.into());
        self
    }

    /// Create a resolver with the given partials.
    pub fn with_partials(
        partials: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        let mut resolver = Self::new();
        for (name, content) in partials {
            resolver.add(name, content);
        }
        resolver
    }
}

impl PartialResolver for MemoryResolver {
    fn get_partial(&self, name: &str) -> Option<String> {
        self.partials.get(name).cloned()
    }

    fn source_name(&self) -> String {
        "<memory>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_candidates_order() {
        let resolver = FileSystemResolver::new("/templates");
        assert_eq!(
            resolver.candidates("header"),
            vec![
                PathBuf::from("/templates/header"),
                PathBuf::from("/templates/header.html"),
                PathBuf::from("/templates/header.md"),
                PathBuf::from("/templates/header.txt"),
            ]
        );
    }

    #[test]
    fn test_candidates_reject_escaping_names() {
        let resolver = FileSystemResolver::new("/templates");
        assert!(resolver.candidates("../secret").is_empty());
        assert!(resolver.candidates("/etc/passwd").is_empty());
        assert!(resolver.candidates("").is_empty());
        assert_eq!(resolver.candidates("inc/./footer").len(), 4);
    }

    #[test]
    fn test_filesystem_resolver_suffix_lookup() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("header.md"), "# Title").unwrap();
        fs::write(dir.path().join("footer.txt"), "bye").unwrap();
        fs::write(dir.path().join("footer.html"), "<p>bye</p>").unwrap();

        let resolver = FileSystemResolver::new(dir.path());
        assert_eq!(resolver.get_partial("header"), Some("# Title".to_string()));
        // .html is tried before .txt
        assert_eq!(resolver.get_partial("footer"), Some("<p>bye</p>".to_string()));
        // Explicit names work through the bare candidate
        assert_eq!(resolver.get_partial("footer.txt"), Some("bye".to_string()));
        assert_eq!(resolver.get_partial("missing"), None);
    }

    #[test]
    fn test_filesystem_resolver_custom_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("nav.tpl"), "nav").unwrap();

        let resolver = FileSystemResolver::new(dir.path()).with_suffixes([".tpl"]);
        assert_eq!(resolver.get_partial("nav"), Some("nav".to_string()));
        assert_eq!(resolver.get_partial("nav.tpl"), None);
    }

    #[test]
    fn test_filesystem_resolver_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("section")).unwrap();
        fs::write(dir.path().join("section.html"), "from file").unwrap();

        let resolver = FileSystemResolver::new(dir.path());
        assert_eq!(resolver.get_partial("section"), Some("from file".to_string()));
    }

    #[test]
    fn test_null_resolver() {
        let resolver = NullResolver;
        assert!(resolver.get_partial("anything").is_none());
    }

    #[test]
    fn test_memory_resolver() {
        let mut resolver = MemoryResolver::new();
        resolver.add("header", "<h1>Title</h1>");
        resolver.add("footer", "<footer>End</footer>");

        assert_eq!(
            resolver.get_partial("header"),
            Some("<h1>Title</h1>".to_string())
        );
        assert!(resolver.get_partial("missing").is_none());
        assert_eq!(resolver.source_name(), "<memory>");
    }

    #[test]
    fn test_memory_resolver_with_partials() {
        let resolver = MemoryResolver::with_partials([("a", "content a"), ("b", "content b")]);
        assert_eq!(resolver.get_partial("a"), Some("content a".to_string()));
        assert_eq!(resolver.get_partial("b"), Some("content b".to_string()));
    }
}
