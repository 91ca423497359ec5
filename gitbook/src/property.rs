//! Entity property codec
//!
//! A property holds exactly one of four variants. Terraform sees it as an
//! object with all four slots present and the unused ones null; the API sees
//! a bare JSON value (or `{"entityId": ...}` for relations).

use serde_json::Value;
use std::collections::BTreeMap;
use tfplug::types::Dynamic;
use thiserror::Error;

use crate::api::entities::UpsertPropertyValue;

pub const STRING: &str = "string";
pub const NUMBER: &str = "number";
pub const BOOLEAN: &str = "boolean";
pub const RELATION: &str = "relation";
pub const RELATION_ENTITY_ID: &str = "entity_id";

/// The four variant slots, in the order they are checked
pub const VARIANTS: [&str; 4] = [STRING, NUMBER, BOOLEAN, RELATION];

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Relation { entity_id: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum PropertyCodecError {
    #[error("Property {name:?} has unsupported type ({kind})")]
    UnsupportedType { name: String, kind: &'static str },

    #[error("Property {name:?} has no value set")]
    Empty { name: String },

    #[error("Property {name:?} has an invalid {slot} value ({kind})")]
    InvalidSlot {
        name: String,
        slot: &'static str,
        kind: &'static str,
    },
}

impl PropertyValue {
    /// Decodes a property as returned by the API.
    pub fn decode(name: &str, value: &Value) -> Result<Self, PropertyCodecError> {
        match value {
            Value::String(s) => Ok(Self::String(s.clone())),
            Value::Number(n) => n
                .as_i64()
                .map(|i| i as f64)
                .or_else(|| n.as_u64().map(|u| u as f64))
                .or_else(|| n.as_f64())
                .map(Self::Number)
                .ok_or_else(|| unsupported(name, value)),
            Value::Bool(b) => Ok(Self::Boolean(*b)),
            Value::Object(fields) => match fields.get("entityId") {
                Some(Value::String(entity_id)) => Ok(Self::Relation {
                    entity_id: entity_id.clone(),
                }),
                _ => Err(unsupported(name, value)),
            },
            Value::Null | Value::Array(_) => Err(unsupported(name, value)),
        }
    }

    /// Encodes the populated variant for an upsert.
    ///
    /// Numbers are narrowed to `f32`.
    pub fn encode(&self) -> UpsertPropertyValue {
        match self {
            Self::String(s) => UpsertPropertyValue::String(s.clone()),
            Self::Number(n) => UpsertPropertyValue::Number(*n as f32),
            Self::Boolean(b) => UpsertPropertyValue::Boolean(*b),
            Self::Relation { entity_id } => UpsertPropertyValue::Relation {
                entity_id: entity_id.clone(),
            },
        }
    }

    /// The Terraform object form: one slot set, the other three null.
    pub fn to_dynamic(&self) -> Dynamic {
        let mut slots = [Dynamic::Null, Dynamic::Null, Dynamic::Null, Dynamic::Null];
        match self {
            Self::String(s) => slots[0] = Dynamic::String(s.clone()),
            Self::Number(n) => slots[1] = Dynamic::Number(*n),
            Self::Boolean(b) => slots[2] = Dynamic::Bool(*b),
            Self::Relation { entity_id } => {
                slots[3] = Dynamic::object([(
                    RELATION_ENTITY_ID,
                    Dynamic::String(entity_id.clone()),
                )])
            }
        }
        Dynamic::object(VARIANTS.into_iter().zip(slots))
    }

    /// Reads the Terraform object form.
    ///
    /// The first non-null slot wins; exactly-one-of is left to config
    /// validation.
    pub fn from_dynamic(name: &str, value: &Dynamic) -> Result<Self, PropertyCodecError> {
        let slot = |slot: &str| value.get(slot).filter(|v| !v.is_null());

        if let Some(v) = slot(STRING) {
            return v
                .as_str()
                .map(|s| Self::String(s.to_string()))
                .ok_or_else(|| invalid_slot(name, STRING, v));
        }
        if let Some(v) = slot(NUMBER) {
            return v
                .as_number()
                .map(Self::Number)
                .ok_or_else(|| invalid_slot(name, NUMBER, v));
        }
        if let Some(v) = slot(BOOLEAN) {
            return v
                .as_bool()
                .map(Self::Boolean)
                .ok_or_else(|| invalid_slot(name, BOOLEAN, v));
        }
        if let Some(v) = slot(RELATION) {
            return v
                .get(RELATION_ENTITY_ID)
                .and_then(Dynamic::as_str)
                .map(|entity_id| Self::Relation {
                    entity_id: entity_id.to_string(),
                })
                .ok_or_else(|| invalid_slot(name, RELATION, v));
        }

        Err(PropertyCodecError::Empty {
            name: name.to_string(),
        })
    }
}

/// Decodes every property of an entity; the first failure aborts the lot.
pub fn decode_properties(
    properties: &BTreeMap<String, Value>,
) -> Result<BTreeMap<String, PropertyValue>, PropertyCodecError> {
    properties
        .iter()
        .map(|(name, value)| Ok((name.clone(), PropertyValue::decode(name, value)?)))
        .collect()
}

fn unsupported(name: &str, value: &Value) -> PropertyCodecError {
    PropertyCodecError::UnsupportedType {
        name: name.to_string(),
        kind: json_kind(value),
    }
}

fn invalid_slot(name: &str, slot: &'static str, value: &Dynamic) -> PropertyCodecError {
    PropertyCodecError::InvalidSlot {
        name: name.to_string(),
        slot,
        kind: value.type_name(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
