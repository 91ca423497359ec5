use std::collections::BTreeMap;
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

use super::{optional_string, required_string};
use crate::api::entities::{Entity, UpsertEntity};
use crate::property::{decode_properties, PropertyValue};

/// A `gitbook_entity` as planned by Terraform
#[derive(Debug, Clone, PartialEq)]
pub struct EntityModel {
    pub organization_id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub properties: BTreeMap<String, PropertyValue>,
}

impl EntityModel {
    pub fn from_value(value: &DynamicValue) -> Result<Self, Diagnostic> {
        let path = AttributePath::new("properties");
        let raw = value.get_map(&path).map_err(|e| {
            Diagnostic::error("Invalid attribute value", e.to_string()).with_attribute(path.clone())
        })?;

        let mut properties = BTreeMap::new();
        for (name, property) in &raw {
            let decoded = PropertyValue::from_dynamic(name, property).map_err(|e| {
                Diagnostic::error("Invalid property value", e.to_string())
                    .with_attribute(path.clone().key(name))
            })?;
            properties.insert(name.clone(), decoded);
        }

        Ok(Self {
            organization_id: required_string(value, "organization_id")?,
            entity_type: required_string(value, "type")?,
            entity_id: required_string(value, "entity_id")?,
            properties,
        })
    }

    pub fn key(&self) -> EntityKey {
        EntityKey {
            organization_id: self.organization_id.clone(),
            entity_type: self.entity_type.clone(),
            entity_id: self.entity_id.clone(),
        }
    }

    pub fn to_upsert(&self) -> UpsertEntity {
        UpsertEntity {
            entity_id: self.entity_id.clone(),
            properties: self
                .properties
                .iter()
                .map(|(name, value)| (name.clone(), value.encode()))
                .collect(),
        }
    }
}

/// Natural key of an entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityKey {
    pub organization_id: String,
    pub entity_type: String,
    pub entity_id: String,
}

impl EntityKey {
    pub const IMPORT_FORMAT: &'static str = "<organization_id>/<type>/<entity_id>";

    /// Reads the key attributes, falling back to an imported `id` of the
    /// form `<organization_id>/<type>/<entity_id>`.
    pub fn from_value(value: &DynamicValue) -> Result<Self, Diagnostic> {
        let organization_id = optional_string(value, "organization_id")?;
        let entity_type = optional_string(value, "type")?;
        let entity_id = optional_string(value, "entity_id")?;

        if let (Some(organization_id), Some(entity_type), Some(entity_id)) =
            (organization_id, entity_type, entity_id)
        {
            return Ok(Self {
                organization_id,
                entity_type,
                entity_id,
            });
        }

        let id = optional_string(value, "id")?.unwrap_or_default();
        Self::parse_import_id(&id)
    }

    pub fn parse_import_id(id: &str) -> Result<Self, Diagnostic> {
        let mut parts = id.splitn(3, '/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(org), Some(ty), Some(entity_id))
                if !org.is_empty() && !ty.is_empty() && !entity_id.is_empty() =>
            {
                Ok(Self {
                    organization_id: org.to_string(),
                    entity_type: ty.to_string(),
                    entity_id: entity_id.to_string(),
                })
            }
            _ => Err(Diagnostic::error(
                "Invalid entity identifier",
                format!(
                    "Expected an identifier of the form {}, got: {:?}",
                    Self::IMPORT_FORMAT,
                    id
                ),
            )
            .with_attribute(AttributePath::new("id"))),
        }
    }
}

/// Full state for an entity.
///
/// Fails without a partial result when any property cannot be decoded.
pub fn entity_state(organization_id: &str, entity: &Entity) -> Result<DynamicValue, Diagnostic> {
    let properties = decode_properties(&entity.properties).map_err(|e| {
        Diagnostic::error("Unsupported property type", e.to_string())
            .with_attribute(AttributePath::new("properties"))
    })?;

    Ok(DynamicValue::new(Dynamic::object([
        ("id", Dynamic::from(entity.id.as_str())),
        ("organization_id", Dynamic::from(organization_id)),
        ("type", Dynamic::from(entity.entity_type.as_str())),
        ("entity_id", Dynamic::from(entity.entity_id.as_str())),
        (
            "properties",
            Dynamic::object(
                properties
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_dynamic())),
            ),
        ),
        (
            "urls",
            Dynamic::object([("location", Dynamic::from(entity.urls.location.as_str()))]),
        ),
    ])))
}
