//! Attribute validators
//!
//! Validators run during config validation, before any handler sees the
//! configuration. Unknown values are never passed to a validator.

use crate::types::{AttributePath, Diagnostic, DiagnosticsExt, Dynamic};

/// Input to a single validator invocation
pub struct ValidatorRequest<'a> {
    pub value: &'a Dynamic,
    pub path: &'a AttributePath,
    /// The object holding this attribute, when there is one
    pub parent: Option<&'a Dynamic>,
}

pub trait Validator: Send + Sync {
    fn description(&self) -> String;

    fn validate(&self, request: &ValidatorRequest<'_>, diagnostics: &mut Vec<Diagnostic>);
}

pub struct StringPatternValidator {
    pub pattern: regex::Regex,
    pub message: String,
}

impl StringPatternValidator {
    pub fn new(pattern: regex::Regex, message: impl Into<String>) -> Self {
        Self {
            pattern,
            message: message.into(),
        }
    }
}

impl Validator for StringPatternValidator {
    fn description(&self) -> String {
        self.message.clone()
    }

    fn validate(&self, request: &ValidatorRequest<'_>, diagnostics: &mut Vec<Diagnostic>) {
        if let Some(s) = request.value.as_str() {
            if !self.pattern.is_match(s) {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid Attribute Value Match",
                        format!("Attribute {} {}, got: {}", request.path, self.message, s),
                    )
                    .with_attribute(request.path.clone()),
                );
            }
        }
    }
}

pub struct StringOneOfValidator {
    pub allowed: Vec<String>,
}

impl StringOneOfValidator {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }
}

impl Validator for StringOneOfValidator {
    fn description(&self) -> String {
        format!("value must be one of: {:?}", self.allowed)
    }

    fn validate(&self, request: &ValidatorRequest<'_>, diagnostics: &mut Vec<Diagnostic>) {
        if let Some(s) = request.value.as_str() {
            if !self.allowed.iter().any(|a| a == s) {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid Attribute Value Match",
                        format!(
                            "Attribute {} {}, got: {:?}",
                            request.path,
                            self.description(),
                            s
                        ),
                    )
                    .with_attribute(request.path.clone()),
                );
            }
        }
    }
}

/// Bounds the element count of a list or set
pub struct ListLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl ListLengthValidator {
    pub fn at_least(min: usize) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }
}

impl Validator for ListLengthValidator {
    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("list must contain between {} and {} items", min, max),
            (Some(min), None) => format!("list must contain at least {} items", min),
            (None, Some(max)) => format!("list must contain at most {} items", max),
            (None, None) => "list of any size".to_string(),
        }
    }

    fn validate(&self, request: &ValidatorRequest<'_>, diagnostics: &mut Vec<Diagnostic>) {
        if let Some(items) = request.value.as_list() {
            let too_few = self.min.is_some_and(|min| items.len() < min);
            let too_many = self.max.is_some_and(|max| items.len() > max);
            if too_few || too_many {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid Attribute Value",
                        format!(
                            "Attribute {} {}, got: {}",
                            request.path,
                            self.description(),
                            items.len()
                        ),
                    )
                    .with_attribute(request.path.clone()),
                );
            }
        }
    }
}

/// Requires exactly one of a group of sibling attributes to be set.
///
/// Attach the same validator to every attribute of the group. The diagnostic
/// is reported on the enclosing object, so the group yields one error no
/// matter how many members carry the validator.
pub struct ExactlyOneOfValidator {
    pub attributes: Vec<String>,
}

impl ExactlyOneOfValidator {
    pub fn new<I, S>(attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            attributes: attributes.into_iter().map(Into::into).collect(),
        }
    }
}

impl Validator for ExactlyOneOfValidator {
    fn description(&self) -> String {
        format!(
            "Exactly one of these attributes must be configured: [{}]",
            self.attributes.join(",")
        )
    }

    fn validate(&self, request: &ValidatorRequest<'_>, diagnostics: &mut Vec<Diagnostic>) {
        let Some(parent) = request.parent else {
            return;
        };
        if parent.is_null() || parent.is_unknown() {
            return;
        }

        let mut set = 0;
        for name in &self.attributes {
            match parent.get(name) {
                Some(Dynamic::Unknown) => return,
                Some(Dynamic::Null) | None => {}
                Some(_) => set += 1,
            }
        }

        if set != 1 {
            diagnostics.push_unique(
                Diagnostic::error("Invalid Attribute Combination", self.description())
                    .with_attribute(request.path.parent()),
            );
        }
    }
}

/// Rejects list or set elements that share the same value for `key`
pub struct UniqueByValidator {
    pub key: String,
}

impl UniqueByValidator {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Validator for UniqueByValidator {
    fn description(&self) -> String {
        format!("elements must have a unique `{}`", self.key)
    }

    fn validate(&self, request: &ValidatorRequest<'_>, diagnostics: &mut Vec<Diagnostic>) {
        let Some(items) = request.value.as_list() else {
            return;
        };

        let mut seen: Vec<&str> = Vec::new();
        for item in items {
            let Some(value) = item.get(&self.key).and_then(Dynamic::as_str) else {
                continue;
            };
            if seen.contains(&value) {
                diagnostics.push(
                    Diagnostic::error(
                        "Duplicate Attribute Value",
                        format!(
                            "Attribute {} {}, `{}` appears more than once",
                            request.path,
                            self.description(),
                            value
                        ),
                    )
                    .with_attribute(request.path.clone()),
                );
            } else {
                seen.push(value);
            }
        }
    }
}
