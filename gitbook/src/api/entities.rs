//! Entity API implementation
//!
//! Entities are written through a bulk upsert endpoint that answers
//! `204 No Content`; reads go through the per-entity endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tfplug::Context;

use super::{ApiError, Client};

/// An entity as returned by
/// `GET /v1/orgs/{organization}/schemas/{type}/entities/{entityId}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub entity_id: String,
    /// Raw property values, decoded by [`crate::property::decode_properties`]
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
    pub urls: EntityUrls,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EntityUrls {
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertEntity {
    pub entity_id: String,
    pub properties: BTreeMap<String, UpsertPropertyValue>,
}

/// Wire form of a property value in an upsert
///
/// Numbers travel as 32-bit floats.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UpsertPropertyValue {
    String(String),
    Number(f32),
    Boolean(bool),
    Relation {
        #[serde(rename = "entityId")]
        entity_id: String,
    },
}

/// Request body for `PUT /v1/orgs/{organization}/schemas/{type}/entities`
#[derive(Debug, Default, Serialize)]
pub struct UpsertEntitiesRequest {
    pub entities: Vec<UpsertEntity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Vec<String>>,
}

impl UpsertEntitiesRequest {
    pub fn upsert(entity: UpsertEntity) -> Self {
        Self {
            entities: vec![entity],
            delete: None,
        }
    }

    /// An upsert that creates nothing and deletes `entity_id`
    pub fn delete(entity_id: impl Into<String>) -> Self {
        Self {
            entities: Vec::new(),
            delete: Some(vec![entity_id.into()]),
        }
    }
}

pub struct EntitiesApi<'a> {
    client: &'a Client,
}

impl<'a> EntitiesApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn get(
        &self,
        ctx: &Context,
        organization_id: &str,
        entity_type: &str,
        entity_id: &str,
    ) -> Result<Entity, ApiError> {
        self.client
            .get(
                ctx,
                &[
                    "orgs",
                    organization_id,
                    "schemas",
                    entity_type,
                    "entities",
                    entity_id,
                ],
            )
            .await
    }

    pub async fn upsert(
        &self,
        ctx: &Context,
        organization_id: &str,
        entity_type: &str,
        request: &UpsertEntitiesRequest,
    ) -> Result<(), ApiError> {
        self.client
            .put(
                ctx,
                &["orgs", organization_id, "schemas", entity_type, "entities"],
                request,
            )
            .await
    }
}
