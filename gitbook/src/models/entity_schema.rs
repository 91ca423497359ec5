use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

use super::{optional_string, required_string};
use crate::api::entity_schemas::{
    EntityPropertySchema, EntitySchema, EntitySchemaTitle, RelatedEntity,
};

/// A `gitbook_entity_schema` as planned by Terraform
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySchemaModel {
    pub organization_id: String,
    pub schema: EntitySchema,
}

impl EntitySchemaModel {
    pub fn from_value(value: &DynamicValue) -> Result<Self, Diagnostic> {
        let title = AttributePath::new("title");
        let singular = value
            .get_string(&title.clone().attribute("singular"))
            .map_err(|e| invalid(&title, e.to_string()))?;
        let plural = value
            .get_string(&title.clone().attribute("plural"))
            .map_err(|e| invalid(&title, e.to_string()))?;

        let properties_path = AttributePath::new("properties");
        let properties = value
            .get_list(&properties_path)
            .map_err(|e| invalid(&properties_path, e.to_string()))?
            .iter()
            .enumerate()
            .map(|(i, property)| property_schema(property, &properties_path.clone().index(i as i64)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            organization_id: required_string(value, "organization_id")?,
            schema: EntitySchema {
                schema_type: required_string(value, "type")?,
                title: EntitySchemaTitle { singular, plural },
                properties,
            },
        })
    }

    pub fn key(&self) -> EntitySchemaKey {
        EntitySchemaKey {
            organization_id: self.organization_id.clone(),
            schema_type: self.schema.schema_type.clone(),
        }
    }
}

fn property_schema(value: &Dynamic, path: &AttributePath) -> Result<EntityPropertySchema, Diagnostic> {
    let string = |name: &str| -> Result<Option<String>, Diagnostic> {
        match value.get(name) {
            None | Some(Dynamic::Null) => Ok(None),
            Some(Dynamic::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(invalid(
                &path.clone().attribute(name),
                format!("expected string, got {}", other.type_name()),
            )),
        }
    };
    let required = |name: &str| -> Result<String, Diagnostic> {
        string(name)?.ok_or_else(|| {
            invalid(&path.clone().attribute(name), format!("{} is required", name))
        })
    };

    let entity = match value.get("entity") {
        None | Some(Dynamic::Null) => None,
        Some(entity) => Some(RelatedEntity {
            integration: entity.get("integration").and_then(Dynamic::as_str).map(str::to_string),
            entity_type: entity
                .get("type")
                .and_then(Dynamic::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    invalid(
                        &path.clone().attribute("entity").attribute("type"),
                        "type is required".to_string(),
                    )
                })?,
        }),
    };

    Ok(EntityPropertySchema {
        name: required("name")?,
        title: required("title")?,
        description: string("description")?,
        property_type: required("type")?,
        entity,
    })
}

fn invalid(path: &AttributePath, detail: String) -> Diagnostic {
    Diagnostic::error("Invalid attribute value", detail).with_attribute(path.clone())
}

/// Natural key of an entity schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchemaKey {
    pub organization_id: String,
    pub schema_type: String,
}

impl EntitySchemaKey {
    pub const IMPORT_FORMAT: &'static str = "<organization_id>/<type>";

    /// Reads the key attributes, falling back to an imported `id` of the
    /// form `<organization_id>/<type>`.
    pub fn from_value(value: &DynamicValue) -> Result<Self, Diagnostic> {
        if let (Some(organization_id), Some(schema_type)) = (
            optional_string(value, "organization_id")?,
            optional_string(value, "type")?,
        ) {
            return Ok(Self {
                organization_id,
                schema_type,
            });
        }

        let id = optional_string(value, "id")?.unwrap_or_default();
        Self::parse_import_id(&id)
    }

    pub fn parse_import_id(id: &str) -> Result<Self, Diagnostic> {
        match id.split_once('/') {
            Some((org, ty)) if !org.is_empty() && !ty.is_empty() && !ty.contains('/') => {
                Ok(Self {
                    organization_id: org.to_string(),
                    schema_type: ty.to_string(),
                })
            }
            _ => Err(Diagnostic::error(
                "Invalid entity schema identifier",
                format!(
                    "Expected an identifier of the form {}, got: {:?}",
                    Self::IMPORT_FORMAT,
                    id
                ),
            )
            .with_attribute(AttributePath::new("id"))),
        }
    }

    pub fn id(&self) -> String {
        format!("{}/{}", self.organization_id, self.schema_type)
    }
}

/// Full state for an entity schema, properties in API order.
pub fn entity_schema_state(organization_id: &str, schema: &EntitySchema) -> DynamicValue {
    let key = EntitySchemaKey {
        organization_id: organization_id.to_string(),
        schema_type: schema.schema_type.clone(),
    };

    let properties = schema
        .properties
        .iter()
        .map(|property| {
            let entity = match &property.entity {
                Some(entity) => Dynamic::object([
                    ("integration", Dynamic::string_or_null(entity.integration.clone())),
                    ("type", Dynamic::from(entity.entity_type.as_str())),
                ]),
                None => Dynamic::Null,
            };
            Dynamic::object([
                ("name", Dynamic::from(property.name.as_str())),
                ("title", Dynamic::from(property.title.as_str())),
                ("description", Dynamic::string_or_null(property.description.clone())),
                ("type", Dynamic::from(property.property_type.as_str())),
                ("entity", entity),
            ])
        })
        .collect();

    DynamicValue::new(Dynamic::object([
        ("id", Dynamic::from(key.id())),
        ("organization_id", Dynamic::from(organization_id)),
        ("type", Dynamic::from(schema.schema_type.as_str())),
        (
            "title",
            Dynamic::object([
                ("singular", Dynamic::from(schema.title.singular.as_str())),
                ("plural", Dynamic::from(schema.title.plural.as_str())),
            ]),
        ),
        ("properties", Dynamic::List(properties)),
    ]))
}
