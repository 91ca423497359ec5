//! Entity schema API implementation

use serde::{Deserialize, Serialize};
use tfplug::Context;

use super::{ApiError, Client};

/// Schema body used both for `PUT` and as the `GET` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub title: EntitySchemaTitle,
    pub properties: Vec<EntityPropertySchema>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySchemaTitle {
    pub singular: String,
    pub plural: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityPropertySchema {
    pub name: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub property_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<RelatedEntity>,
}

/// Target of a `relation` property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration: Option<String>,
    #[serde(rename = "type")]
    pub entity_type: String,
}

pub struct EntitySchemasApi<'a> {
    client: &'a Client,
}

impl<'a> EntitySchemasApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn get(
        &self,
        ctx: &Context,
        organization_id: &str,
        schema_type: &str,
    ) -> Result<EntitySchema, ApiError> {
        self.client
            .get(ctx, &["orgs", organization_id, "schemas", schema_type])
            .await
    }

    /// Creates or replaces the schema
    pub async fn set(
        &self,
        ctx: &Context,
        organization_id: &str,
        schema: &EntitySchema,
    ) -> Result<(), ApiError> {
        self.client
            .put(
                ctx,
                &["orgs", organization_id, "schemas", schema.schema_type.as_str()],
                schema,
            )
            .await
    }

    pub async fn delete(
        &self,
        ctx: &Context,
        organization_id: &str,
        schema_type: &str,
    ) -> Result<(), ApiError> {
        self.client
            .delete(ctx, &["orgs", organization_id, "schemas", schema_type])
            .await
    }
}
