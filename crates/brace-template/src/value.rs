/*
 * value.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template value and context types.
//!
//! [`Value`] is the closed set of things a context can hold. [`TemplateContext`]
//! is the read-only name → value mapping a render call works against.
//! Lookups go through a typed dot-path accessor that stops at the first
//! missing segment or non-map intermediate.

use crate::error::{TemplateError, TemplateResult};
use std::collections::HashMap;

/// Name bound to the current element inside an `{{#each}}` body.
pub const THIS_KEY: &str = "this";

/// Name bound to the 0-based element position inside an `{{#each}}` body.
pub const INDEX_KEY: &str = "index";

/// A value that can be interpolated, tested or iterated.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// A null/missing value.
    #[default]
    Null,

    /// A boolean value.
    Bool(bool),

    /// A numeric value.
    Number(f64),

    /// A string value.
    String(String),

    /// An ordered sequence of values.
    List(Vec<Value>),

    /// A map of string keys to values.
    Map(HashMap<String, Value>),
}

impl Value {
    /// Check if this value is "truthy" for conditional evaluation.
    ///
    /// - Null is falsy
    /// - Booleans are themselves
    /// - Numbers are truthy when nonzero
    /// - Strings and lists are truthy when non-empty
    /// - Maps are always truthy, even when empty
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(_) => true,
        }
    }

    /// Get a nested field by path.
    ///
    /// Returns `None` as soon as a segment is missing or the value being
    /// walked is not a map.
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        match path.split_first() {
            None => Some(self),
            Some((first, rest)) => match self {
                Value::Map(m) => m.get(*first).and_then(|v| v.get_path(rest)),
                _ => None,
            },
        }
    }

    /// Short name of this value's kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Render this value as text for interpolation.
    ///
    /// - Null: ""
    /// - Bool: "true" / "false"
    /// - Number: integral values without a fractional part ("3", not "3.0")
    /// - String: as-is
    /// - List: rendered elements joined with ","
    /// - Map: compact JSON
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::List(items) => items
                .iter()
                .map(Value::render)
                .collect::<Vec<_>>()
                .join(","),
            Value::Map(_) => serde_json::Value::from(self.clone()).to_string(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Value::Null, Value::Number),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Number(n) => serde_json::Number::from_f64(n)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::String(s) => serde_json::Value::String(s),
            Value::List(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

/// The variable bindings a template is rendered against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateContext {
    variables: HashMap<String, Value>,
}

impl TemplateContext {
    /// Create a new empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from a JSON value, which must be an object.
    pub fn from_json(json: serde_json::Value) -> TemplateResult<Self> {
        match json {
            serde_json::Value::Object(map) => Ok(Self {
                variables: map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            }),
            other => Err(TemplateError::InvalidInput {
                message: format!(
                    "context must be an object, found {}",
                    Value::from(other).kind_name()
                ),
            }),
        }
    }

    /// Insert a variable into the context.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(key.into(), value.into());
    }

    /// Get a top-level variable.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.variables.get(key)
    }

    /// Get a variable by path (e.g. `["employee", "salary"]`).
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        self.get(first).and_then(|v| v.get_path(rest))
    }

    /// Resolve a tag expression such as `name` or `user.address.city`.
    ///
    /// Expressions containing `.` are walked segment by segment; anything else
    /// is looked up as a single key. `None` means unresolved.
    pub fn lookup(&self, expr: &str) -> Option<&Value> {
        let expr = expr.trim();
        if expr.contains('.') {
            let path: Vec<&str> = expr.split('.').collect();
            self.get_path(&path)
        } else {
            self.get(expr)
        }
    }

    /// Build the context for one element of an `{{#each}}` iteration.
    ///
    /// The result is a shallow copy of `self`. When the element is a map its
    /// keys are layered on top, then `this` and `index` are bound. The two
    /// reserved names always refer to the element and its position, even if
    /// the element has keys with the same names.
    pub fn item_scope(&self, element: &Value, index: usize) -> TemplateContext {
        let mut scope = self.clone();
        if let Value::Map(fields) = element {
            for (key, value) in fields {
                scope.variables.insert(key.clone(), value.clone());
            }
        }
        scope.insert(THIS_KEY, element.clone());
        scope.insert(INDEX_KEY, Value::Number(index as f64));
        scope
    }

    /// Number of top-level bindings.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Whether the context has no bindings.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Bool(false).is_truthy());

        assert!(Value::Number(-1.5).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());

        assert!(Value::from("false").is_truthy()); // "false" string is truthy!
        assert!(!Value::from("").is_truthy());

        assert!(Value::List(vec![Value::Bool(false)]).is_truthy());
        assert!(!Value::List(vec![]).is_truthy());

        assert!(Value::Map(HashMap::new()).is_truthy()); // Empty map is still truthy
    }

    #[test]
    fn test_get_path() {
        let value = Value::from(json!({"employee": {"salary": 50000}}));

        assert_eq!(
            value.get_path(&["employee", "salary"]),
            Some(&Value::Number(50000.0))
        );
        assert_eq!(value.get_path(&["employee", "name"]), None);
        assert_eq!(value.get_path(&["employee", "salary", "currency"]), None);
    }

    #[test]
    fn test_lookup_dotted_and_plain() {
        let ctx = TemplateContext::from_json(json!({
            "user": {"address": {"city": "Lisbon"}},
            "a.b": "literal key",
            "name": "Ada"
        }))
        .unwrap();

        assert_eq!(ctx.lookup("user.address.city"), Some(&Value::from("Lisbon")));
        assert_eq!(ctx.lookup(" name "), Some(&Value::from("Ada")));
        // Dotted expressions always walk, they never match a literal dotted key
        assert_eq!(ctx.lookup("a.b"), None);
        assert_eq!(ctx.lookup("user..city"), None);
        assert_eq!(ctx.lookup("name.first"), None);
    }

    #[test]
    fn test_render() {
        assert_eq!(Value::Null.render(), "");
        assert_eq!(Value::Bool(false).render(), "false");
        assert_eq!(Value::Number(3.0).render(), "3");
        assert_eq!(Value::Number(-2.5).render(), "-2.5");
        assert_eq!(Value::from("hi").render(), "hi");
        assert_eq!(
            Value::List(vec![Value::from("a"), Value::Number(1.0)]).render(),
            "a,1"
        );
        assert_eq!(Value::from(json!({"k": "v"})).render(), r#"{"k":"v"}"#);
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let err = TemplateContext::from_json(json!(["a"])).unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::InvalidInput);
        assert!(err.to_string().contains("found list"));
    }

    #[test]
    fn test_item_scope() {
        let mut parent = TemplateContext::new();
        parent.insert("title", "Report");
        parent.insert("name", "outer");

        let element = Value::from(json!({"name": "inner", "index": 99}));
        let scope = parent.item_scope(&element, 2);

        // Element keys shadow outer keys
        assert_eq!(scope.get("name"), Some(&Value::from("inner")));
        // Outer keys remain visible
        assert_eq!(scope.get("title"), Some(&Value::from("Report")));
        // Reserved names win over element keys
        assert_eq!(scope.get(INDEX_KEY), Some(&Value::Number(2.0)));
        assert_eq!(scope.get(THIS_KEY), Some(&element));
        // Parent unchanged
        assert_eq!(parent.get("name"), Some(&Value::from("outer")));
        assert_eq!(parent.get(THIS_KEY), None);
    }
}
