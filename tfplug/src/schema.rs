//! Schema types and builders for tfplug
//!
//! Resources, data sources and providers describe their configuration with a
//! [`Schema`]. The schema also drives config validation and the default
//! planning pass.

use crate::plan_modifier::PlanModifier;
use crate::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use crate::validator::{Validator, ValidatorRequest};
use std::collections::HashMap;
use std::sync::Arc;

/// AttributeType defines the type system for Terraform attributes
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Number,
    Bool,
    List(Box<AttributeType>),
    Set(Box<AttributeType>),
    Map(Box<AttributeType>),
    Object(HashMap<String, AttributeType>),
}

/// Schema is returned by providers/resources/data sources
#[derive(Debug, Clone, Default)]
pub struct Schema {
    /// Increment when schema changes require migration
    pub version: i64,
    pub block: Block,
}

#[derive(Debug, Clone, Default)]
pub struct Block {
    pub attributes: Vec<Attribute>,
    pub description: String,
}

/// Attribute represents a single configuration attribute
#[derive(Clone)]
pub struct Attribute {
    pub name: String,
    pub r#type: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub validators: Vec<Arc<dyn Validator>>,
    pub plan_modifiers: Vec<Arc<dyn PlanModifier>>,
    pub nested_type: Option<NestedType>,
}

impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("type", &self.r#type)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("sensitive", &self.sensitive)
            .field("validators", &self.validators.len())
            .field("plan_modifiers", &self.plan_modifiers.len())
            .field("nested_type", &self.nested_type)
            .finish()
    }
}

/// NestedType for attributes with nested structures
#[derive(Debug, Clone)]
pub struct NestedType {
    pub attributes: Vec<Attribute>,
    pub nesting: ObjectNestingMode,
}

impl NestedType {
    pub fn single(attributes: Vec<Attribute>) -> Self {
        Self {
            attributes,
            nesting: ObjectNestingMode::Single,
        }
    }

    pub fn list(attributes: Vec<Attribute>) -> Self {
        Self {
            attributes,
            nesting: ObjectNestingMode::List,
        }
    }

    pub fn set(attributes: Vec<Attribute>) -> Self {
        Self {
            attributes,
            nesting: ObjectNestingMode::Set,
        }
    }

    pub fn map(attributes: Vec<Attribute>) -> Self {
        Self {
            attributes,
            nesting: ObjectNestingMode::Map,
        }
    }
}

/// ObjectNestingMode for nested attribute objects
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObjectNestingMode {
    Single,
    List,
    Set,
    Map,
}

impl Schema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.block.attributes.iter().find(|a| a.name == name)
    }

    /// Checks configuration against the schema and runs attribute validators.
    ///
    /// Unknown values are skipped; they are validated again once known.
    pub fn validate_config(&self, config: &DynamicValue) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        if config.is_null() || config.is_unknown() {
            return diagnostics;
        }
        validate_attributes(
            &self.block.attributes,
            &config.value,
            &AttributePath::root(),
            &mut diagnostics,
        );
        diagnostics
    }
}

fn validate_attributes(
    attributes: &[Attribute],
    parent: &Dynamic,
    path: &AttributePath,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for attr in attributes {
        let attr_path = path.clone().attribute(&attr.name);
        let value = parent.get(&attr.name).unwrap_or(&Dynamic::Null);
        if value.is_unknown() {
            continue;
        }

        if attr.required && value.is_null() {
            diagnostics.push(
                Diagnostic::error(
                    "Missing Configuration for Required Attribute",
                    format!(
                        "Must set a configuration value for the {} attribute as the provider has marked it as required.",
                        attr_path
                    ),
                )
                .with_attribute(attr_path),
            );
            continue;
        }

        if attr.computed && !attr.required && !attr.optional && !value.is_null() {
            diagnostics.push(
                Diagnostic::error(
                    "Invalid Configuration for Read-Only Attribute",
                    format!(
                        "Cannot set value for the {} attribute as the provider has marked it as read-only.",
                        attr_path
                    ),
                )
                .with_attribute(attr_path),
            );
            continue;
        }

        if attr.nested_type.is_none() && !value_matches(&attr.r#type, value) {
            diagnostics.push(
                Diagnostic::error(
                    "Incorrect Attribute Value Type",
                    format!(
                        "The {} attribute expects a {} value, got {}.",
                        attr_path,
                        type_label(&attr.r#type),
                        value.type_name()
                    ),
                )
                .with_attribute(attr_path),
            );
            continue;
        }

        let request = ValidatorRequest {
            value,
            path: &attr_path,
            parent: Some(parent),
        };
        for validator in &attr.validators {
            validator.validate(&request, diagnostics);
        }

        if let Some(nested) = &attr.nested_type {
            validate_nested(nested, value, &attr_path, diagnostics);
        }
    }
}

/// Null and unknown fit every type; collections are checked element-wise.
fn value_matches(expected: &AttributeType, value: &Dynamic) -> bool {
    match (expected, value) {
        (_, Dynamic::Null | Dynamic::Unknown) => true,
        (AttributeType::String, Dynamic::String(_))
        | (AttributeType::Number, Dynamic::Number(_))
        | (AttributeType::Bool, Dynamic::Bool(_)) => true,
        (AttributeType::List(element) | AttributeType::Set(element), Dynamic::List(items)) => {
            items.iter().all(|item| value_matches(element, item))
        }
        (AttributeType::Map(element), Dynamic::Map(entries)) => {
            entries.values().all(|entry| value_matches(element, entry))
        }
        (AttributeType::Object(fields), Dynamic::Map(entries)) => {
            entries.iter().all(|(name, entry)| {
                fields
                    .get(name)
                    .is_some_and(|field| value_matches(field, entry))
            })
        }
        _ => false,
    }
}

fn type_label(expected: &AttributeType) -> &'static str {
    match expected {
        AttributeType::String => "string",
        AttributeType::Number => "number",
        AttributeType::Bool => "bool",
        AttributeType::List(_) => "list",
        AttributeType::Set(_) => "set",
        AttributeType::Map(_) => "map",
        AttributeType::Object(_) => "object",
    }
}

fn validate_nested(
    nested: &NestedType,
    value: &Dynamic,
    path: &AttributePath,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match (nested.nesting, value) {
        (ObjectNestingMode::Single, Dynamic::Map(_)) => {
            validate_attributes(&nested.attributes, value, path, diagnostics);
        }
        (ObjectNestingMode::List | ObjectNestingMode::Set, Dynamic::List(items)) => {
            for (i, item) in items.iter().enumerate() {
                if item.is_unknown() {
                    continue;
                }
                let item_path = path.clone().index(i as i64);
                validate_attributes(&nested.attributes, item, &item_path, diagnostics);
            }
        }
        (ObjectNestingMode::Map, Dynamic::Map(elements)) => {
            for (key, element) in elements {
                if element.is_unknown() {
                    continue;
                }
                let element_path = path.clone().key(key);
                validate_attributes(&nested.attributes, element, &element_path, diagnostics);
            }
        }
        _ => {}
    }
}

/// AttributeBuilder provides fluent API for building attributes
pub struct AttributeBuilder {
    attribute: Attribute,
}

impl AttributeBuilder {
    pub fn new(name: &str, type_: AttributeType) -> Self {
        Self {
            attribute: Attribute {
                name: name.to_string(),
                r#type: type_,
                description: String::new(),
                required: false,
                optional: false,
                computed: false,
                sensitive: false,
                validators: Vec::new(),
                plan_modifiers: Vec::new(),
                nested_type: None,
            },
        }
    }

    /// Starts a nested attribute; the object type is derived from `nested`.
    pub fn nested(name: &str, nested: NestedType) -> Self {
        let object = AttributeType::Object(
            nested
                .attributes
                .iter()
                .map(|a| (a.name.clone(), a.r#type.clone()))
                .collect(),
        );
        let type_ = match nested.nesting {
            ObjectNestingMode::Single => object,
            ObjectNestingMode::List => AttributeType::List(Box::new(object)),
            ObjectNestingMode::Set => AttributeType::Set(Box::new(object)),
            ObjectNestingMode::Map => AttributeType::Map(Box::new(object)),
        };
        let mut builder = Self::new(name, type_);
        builder.attribute.nested_type = Some(nested);
        builder
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.attribute.description = desc.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.attribute.required = true;
        self.attribute.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.attribute.optional = true;
        self.attribute.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.attribute.computed = true;
        self
    }

    /// Mark as sensitive (hidden)
    pub fn sensitive(mut self) -> Self {
        self.attribute.sensitive = true;
        self
    }

    pub fn validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.attribute.validators.push(validator);
        self
    }

    pub fn plan_modifier(mut self, modifier: Arc<dyn PlanModifier>) -> Self {
        self.attribute.plan_modifiers.push(modifier);
        self
    }

    pub fn build(self) -> Attribute {
        self.attribute
    }
}

/// SchemaBuilder provides fluent API for building schemas
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            schema: Schema::default(),
        }
    }

    pub fn version(mut self, version: i64) -> Self {
        self.schema.version = version;
        self
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.schema.block.attributes.push(attr);
        self
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.schema.block.description = desc.to_string();
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

impl std::default::Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
