//! Core type system for tfplug
//!
//! Terraform values travel through the framework as [`Dynamic`] trees wrapped
//! in a [`DynamicValue`]. Handlers read configuration and write state through
//! the path-based accessors instead of matching on the tree directly.

use crate::error::{Result, TfplugError};
use std::collections::HashMap;
use std::fmt;

/// Dynamic represents Terraform values that can be of any type
#[derive(Debug, Clone, PartialEq)]
pub enum Dynamic {
    /// Explicit null value
    Null,
    Bool(bool),
    /// Terraform numbers are carried as f64
    Number(f64),
    String(String),
    /// Lists, sets and tuples
    List(Vec<Dynamic>),
    /// Maps and objects
    Map(HashMap<String, Dynamic>),
    /// Value not yet known (during planning)
    Unknown,
}

impl Dynamic {
    /// Builds an object value from `(name, value)` pairs.
    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Dynamic)>,
        K: Into<String>,
    {
        Dynamic::Map(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// `Some(s)` becomes a string, `None` becomes an explicit null.
    pub fn string_or_null<S: Into<String>>(value: Option<S>) -> Self {
        value.map_or(Dynamic::Null, |s| Dynamic::String(s.into()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Dynamic::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Dynamic::Unknown)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Dynamic::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Dynamic::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Dynamic::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Dynamic]> {
        match self {
            Dynamic::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Dynamic>> {
        match self {
            Dynamic::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up an attribute of an object value.
    pub fn get(&self, name: &str) -> Option<&Dynamic> {
        self.as_map().and_then(|m| m.get(name))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Dynamic::Null => "null",
            Dynamic::Bool(_) => "bool",
            Dynamic::Number(_) => "number",
            Dynamic::String(_) => "string",
            Dynamic::List(_) => "list",
            Dynamic::Map(_) => "map",
            Dynamic::Unknown => "unknown",
        }
    }
}

impl From<&str> for Dynamic {
    fn from(value: &str) -> Self {
        Dynamic::String(value.to_string())
    }
}

impl From<String> for Dynamic {
    fn from(value: String) -> Self {
        Dynamic::String(value)
    }
}

impl From<bool> for Dynamic {
    fn from(value: bool) -> Self {
        Dynamic::Bool(value)
    }
}

impl From<f64> for Dynamic {
    fn from(value: f64) -> Self {
        Dynamic::Number(value)
    }
}

/// DynamicValue wraps Dynamic and provides path-based access
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicValue {
    pub value: Dynamic,
}

impl DynamicValue {
    pub fn new(value: Dynamic) -> Self {
        Self { value }
    }

    pub fn null() -> Self {
        Self {
            value: Dynamic::Null,
        }
    }

    pub fn unknown() -> Self {
        Self {
            value: Dynamic::Unknown,
        }
    }

    /// An empty object, the usual starting point for building state.
    pub fn empty_object() -> Self {
        Self {
            value: Dynamic::Map(HashMap::new()),
        }
    }

    /// Returns the value at `path`, or `None` when the path does not exist.
    pub fn get(&self, path: &AttributePath) -> Option<&Dynamic> {
        self.navigate_path(path).ok()
    }

    pub fn get_string(&self, path: &AttributePath) -> Result<String> {
        let value = self.navigate_path(path)?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| type_mismatch(path, "string", value))
    }

    pub fn get_number(&self, path: &AttributePath) -> Result<f64> {
        let value = self.navigate_path(path)?;
        value
            .as_number()
            .ok_or_else(|| type_mismatch(path, "number", value))
    }

    pub fn get_list(&self, path: &AttributePath) -> Result<Vec<Dynamic>> {
        let value = self.navigate_path(path)?;
        value
            .as_list()
            .map(<[Dynamic]>::to_vec)
            .ok_or_else(|| type_mismatch(path, "list", value))
    }

    pub fn get_map(&self, path: &AttributePath) -> Result<HashMap<String, Dynamic>> {
        let value = self.navigate_path(path)?;
        value
            .as_map()
            .cloned()
            .ok_or_else(|| type_mismatch(path, "map", value))
    }

    /// Null, unknown and missing attributes all read as `None`.
    pub fn get_optional_string(&self, path: &AttributePath) -> Result<Option<String>> {
        match self.get(path) {
            None | Some(Dynamic::Null) | Some(Dynamic::Unknown) => Ok(None),
            Some(Dynamic::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(type_mismatch(path, "string", other)),
        }
    }

    pub fn is_unknown_at(&self, path: &AttributePath) -> bool {
        matches!(self.get(path), Some(Dynamic::Unknown))
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    pub fn is_unknown(&self) -> bool {
        self.value.is_unknown()
    }

    pub fn set_string(&mut self, path: &AttributePath, value: String) -> Result<()> {
        self.set_value(path, Dynamic::String(value))
    }

    /// Mark computed values as unknown during planning
    pub fn mark_unknown(&mut self, path: &AttributePath) -> Result<()> {
        self.set_value(path, Dynamic::Unknown)
    }

    pub fn set_value(&mut self, path: &AttributePath, new_value: Dynamic) -> Result<()> {
        let Some((last, parents)) = path.steps.split_last() else {
            self.value = new_value;
            return Ok(());
        };

        if !matches!(self.value, Dynamic::Map(_)) {
            self.value = Dynamic::Map(HashMap::new());
        }

        let mut current = &mut self.value;
        for (idx, step) in parents.iter().enumerate() {
            let next_is_index = matches!(
                path.steps.get(idx + 1),
                Some(AttributePathStep::ElementKeyInt(_))
            );
            current = match (current, step) {
                (Dynamic::Map(m), AttributePathStep::AttributeName(name))
                | (Dynamic::Map(m), AttributePathStep::ElementKeyString(name)) => {
                    let slot = m.entry(name.clone()).or_insert(Dynamic::Null);
                    if slot.is_null() {
                        *slot = if next_is_index {
                            Dynamic::List(Vec::new())
                        } else {
                            Dynamic::Map(HashMap::new())
                        };
                    }
                    slot
                }
                (Dynamic::List(l), AttributePathStep::ElementKeyInt(i)) => {
                    let len = l.len();
                    l.get_mut(*i as usize).ok_or_else(|| {
                        TfplugError::InvalidPath(format!("list index {} out of bounds ({})", i, len))
                    })?
                }
                _ => return Err(TfplugError::InvalidPath(path.to_string())),
            };
        }

        match (current, last) {
            (Dynamic::Map(m), AttributePathStep::AttributeName(name))
            | (Dynamic::Map(m), AttributePathStep::ElementKeyString(name)) => {
                m.insert(name.clone(), new_value);
                Ok(())
            }
            (Dynamic::List(l), AttributePathStep::ElementKeyInt(i)) => {
                let len = l.len();
                let slot = l.get_mut(*i as usize).ok_or_else(|| {
                    TfplugError::InvalidPath(format!("list index {} out of bounds ({})", i, len))
                })?;
                *slot = new_value;
                Ok(())
            }
            _ => Err(TfplugError::InvalidPath(path.to_string())),
        }
    }

    fn navigate_path<'a>(&'a self, path: &AttributePath) -> Result<&'a Dynamic> {
        let mut current = &self.value;

        for step in &path.steps {
            current = match (current, step) {
                (Dynamic::Map(m), AttributePathStep::AttributeName(name))
                | (Dynamic::Map(m), AttributePathStep::ElementKeyString(name)) => m
                    .get(name)
                    .ok_or_else(|| TfplugError::AttributeNotFound(path.to_string()))?,
                (Dynamic::List(l), AttributePathStep::ElementKeyInt(idx)) => l
                    .get(*idx as usize)
                    .ok_or_else(|| TfplugError::AttributeNotFound(path.to_string()))?,
                _ => return Err(TfplugError::InvalidPath(path.to_string())),
            };
        }

        Ok(current)
    }
}

fn type_mismatch(path: &AttributePath, expected: &str, actual: &Dynamic) -> TfplugError {
    TfplugError::TypeMismatch {
        path: path.to_string(),
        expected: expected.to_string(),
        actual: actual.type_name().to_string(),
    }
}

/// AttributePath represents a path to an attribute within a DynamicValue
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct AttributePath {
    pub steps: Vec<AttributePathStep>,
}

impl AttributePath {
    pub fn new(name: &str) -> Self {
        Self {
            steps: vec![AttributePathStep::AttributeName(name.to_string())],
        }
    }

    pub fn root() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn attribute(mut self, name: &str) -> Self {
        self.steps
            .push(AttributePathStep::AttributeName(name.to_string()));
        self
    }

    pub fn index(mut self, idx: i64) -> Self {
        self.steps.push(AttributePathStep::ElementKeyInt(idx));
        self
    }

    pub fn key(mut self, key: &str) -> Self {
        self.steps
            .push(AttributePathStep::ElementKeyString(key.to_string()));
        self
    }

    /// The path with its last step removed.
    pub fn parent(&self) -> Self {
        let mut steps = self.steps.clone();
        steps.pop();
        Self { steps }
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                AttributePathStep::AttributeName(name) if i == 0 => write!(f, "{}", name)?,
                AttributePathStep::AttributeName(name) => write!(f, ".{}", name)?,
                AttributePathStep::ElementKeyString(key) => write!(f, "[{:?}]", key)?,
                AttributePathStep::ElementKeyInt(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

/// Individual step in an AttributePath
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributePathStep {
    /// Access attribute by name in object
    AttributeName(String),
    /// Access element by string key (for maps)
    ElementKeyString(String),
    /// Access element by integer index (for lists and sets)
    ElementKeyInt(i64),
}

/// Diagnostic represents a warning or error from the provider
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub summary: String,
    pub detail: String,
    pub attribute: Option<AttributePath>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn with_attribute(mut self, path: AttributePath) -> Self {
        self.attribute = Some(path);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

/// Severity level for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSeverity {
    Invalid,
    Error,
    Warning,
}

/// Convenience queries over a diagnostics list
pub trait DiagnosticsExt {
    fn has_errors(&self) -> bool;

    /// Appends a diagnostic unless an identical one is already present.
    fn push_unique(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticsExt for Vec<Diagnostic> {
    fn has_errors(&self) -> bool {
        self.iter().any(Diagnostic::is_error)
    }

    fn push_unique(&mut self, diagnostic: Diagnostic) {
        if !self.contains(&diagnostic) {
            self.push(diagnostic);
        }
    }
}

/// ClientCapabilities indicates Terraform client capabilities
#[derive(Debug, Clone, Default)]
pub struct ClientCapabilities {
    pub deferral_allowed: bool,
    pub write_only_attributes_allowed: bool,
}
