//! Entity resource implementation
//!
//! Entities are written through the bulk upsert endpoint, which answers
//! `204 No Content`; every write is followed by a read to fill computed
//! attributes.

use async_trait::async_trait;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::import::import_state_passthrough_id;
use tfplug::plan_modifier::{RequiresReplaceIfChanged, UseStateForUnknown};
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceSchemaRequest, ResourceSchemaResponse,
    ResourceWithConfigure, ResourceWithImportState, UpdateResourceRequest,
    UpdateResourceResponse,
};
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType, NestedType, SchemaBuilder};
use tfplug::server::provider_not_configured;
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::ExactlyOneOfValidator;

use super::terraform_type_validator;
use crate::api::entities::UpsertEntitiesRequest;
use crate::models::{entity_state, EntityKey, EntityModel};
use crate::property::{BOOLEAN, NUMBER, RELATION, RELATION_ENTITY_ID, STRING};
use crate::provider_data::{downcast_provider_data, GitBookProviderData, HandlerKind};

#[derive(Default)]
pub struct EntityResource {
    provider_data: Option<GitBookProviderData>,
}

impl EntityResource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts the planned entity and reads it back.
    async fn write(
        &self,
        ctx: &Context,
        provider_data: &GitBookProviderData,
        planned_state: &DynamicValue,
        action: WriteAction,
    ) -> Result<DynamicValue, Diagnostic> {
        let model = EntityModel::from_value(planned_state)?;
        let entities = provider_data.client.entities();

        let request = UpsertEntitiesRequest::upsert(model.to_upsert());
        entities
            .upsert(ctx, &model.organization_id, &model.entity_type, &request)
            .await
            .map_err(|e| {
                Diagnostic::error(
                    format!("Error {} GitBook entity", action.verb()),
                    format!("Could not {} GitBook entity: {}", action.infinitive(), e),
                )
            })?;
        tracing::debug!(
            organization_id = %model.organization_id,
            entity_type = %model.entity_type,
            entity_id = %model.entity_id,
            "upserted entity"
        );

        let entity = entities
            .get(ctx, &model.organization_id, &model.entity_type, &model.entity_id)
            .await
            .map_err(|e| {
                Diagnostic::error(
                    format!("Error reading {} GitBook entity", action.participle()),
                    format!(
                        "Could not read {} GitBook entity: {}",
                        action.participle(),
                        e
                    ),
                )
            })?;

        entity_state(&model.organization_id, &entity)
    }
}

#[derive(Debug, Clone, Copy)]
enum WriteAction {
    Create,
    Update,
}

impl WriteAction {
    fn verb(self) -> &'static str {
        match self {
            Self::Create => "creating",
            Self::Update => "updating",
        }
    }

    fn infinitive(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
        }
    }

    fn participle(self) -> &'static str {
        match self {
            Self::Create => "created",
            Self::Update => "updated",
        }
    }
}

/// One property value: exactly one of the typed slots is set.
fn property_attributes() -> Vec<Attribute> {
    let exactly_one = || Arc::new(ExactlyOneOfValidator::new([STRING, NUMBER, BOOLEAN, RELATION]));

    vec![
        AttributeBuilder::new(STRING, AttributeType::String)
            .optional()
            .validator(exactly_one())
            .build(),
        AttributeBuilder::new(NUMBER, AttributeType::Number)
            .optional()
            .validator(exactly_one())
            .build(),
        AttributeBuilder::new(BOOLEAN, AttributeType::Bool)
            .optional()
            .validator(exactly_one())
            .build(),
        AttributeBuilder::nested(
            RELATION,
            NestedType::single(vec![AttributeBuilder::new(
                RELATION_ENTITY_ID,
                AttributeType::String,
            )
            .required()
            .build()]),
        )
        .optional()
        .validator(exactly_one())
        .build(),
    ]
}

#[async_trait]
impl Resource for EntityResource {
    fn type_name(&self) -> &str {
        "gitbook_entity"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Entity resource")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description(
                        "The computed ID of the entity. Not to be confused with the `entity_id` attribute.",
                    )
                    .computed()
                    .plan_modifier(Arc::new(UseStateForUnknown))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("organization_id", AttributeType::String)
                    .description("The ID of the organization that owns the entity.")
                    .required()
                    .plan_modifier(Arc::new(RequiresReplaceIfChanged))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("type", AttributeType::String)
                    .description("The type of the entity schema. Must be prefixed with `terraform:`.")
                    .required()
                    .validator(terraform_type_validator())
                    .plan_modifier(Arc::new(RequiresReplaceIfChanged))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("entity_id", AttributeType::String)
                    .description("The ID of the entity, unique for the related entity schema.")
                    .required()
                    .plan_modifier(Arc::new(RequiresReplaceIfChanged))
                    .build(),
            )
            .attribute(
                AttributeBuilder::nested("properties", NestedType::map(property_attributes()))
                    .description(
                        "Map of properties, where each key is the property name and the value is an object with either a `string`, `number`, `boolean` or `relation` property.",
                    )
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::nested(
                    "urls",
                    NestedType::single(vec![AttributeBuilder::new(
                        "location",
                        AttributeType::String,
                    )
                    .computed()
                    .build()]),
                )
                .computed()
                .plan_modifier(Arc::new(UseStateForUnknown))
                .build(),
            )
            .build();

        ResourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let Some(provider_data) = &self.provider_data else {
            return CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![provider_not_configured()],
            };
        };

        match self
            .write(&ctx, provider_data, &request.planned_state, WriteAction::Create)
            .await
        {
            Ok(new_state) => CreateResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(diag) => CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![diag],
            },
        }
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let Some(provider_data) = &self.provider_data else {
            return ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: vec![provider_not_configured()],
            };
        };

        let key = match EntityKey::from_value(&request.current_state) {
            Ok(key) => key,
            Err(diag) => {
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics: vec![diag],
                }
            }
        };

        let entity = match provider_data
            .client
            .entities()
            .get(&ctx, &key.organization_id, &key.entity_type, &key.entity_id)
            .await
        {
            Ok(entity) => entity,
            Err(e) => {
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics: vec![Diagnostic::error(
                        "Error reading GitBook entity",
                        format!("Could not read GitBook entity: {}", e),
                    )],
                }
            }
        };

        match entity_state(&key.organization_id, &entity) {
            Ok(state) => ReadResourceResponse {
                new_state: Some(state),
                diagnostics: vec![],
            },
            Err(diag) => ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: vec![diag],
            },
        }
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let Some(provider_data) = &self.provider_data else {
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics: vec![provider_not_configured()],
            };
        };

        match self
            .write(&ctx, provider_data, &request.planned_state, WriteAction::Update)
            .await
        {
            Ok(new_state) => UpdateResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(diag) => UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics: vec![diag],
            },
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let Some(provider_data) = &self.provider_data else {
            return DeleteResourceResponse {
                diagnostics: vec![provider_not_configured()],
            };
        };

        let key = match EntityKey::from_value(&request.prior_state) {
            Ok(key) => key,
            Err(diag) => {
                return DeleteResourceResponse {
                    diagnostics: vec![diag],
                }
            }
        };

        let request = UpsertEntitiesRequest::delete(key.entity_id.clone());
        match provider_data
            .client
            .entities()
            .upsert(&ctx, &key.organization_id, &key.entity_type, &request)
            .await
        {
            Ok(()) => DeleteResourceResponse {
                diagnostics: vec![],
            },
            Err(e) => DeleteResourceResponse {
                diagnostics: vec![Diagnostic::error(
                    "Error deleting GitBook entity",
                    format!("Could not delete GitBook entity: {}", e),
                )],
            },
        }
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithImportState for EntityResource {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse {
            imported_resources: vec![],
            diagnostics: vec![],
        };

        // Reject malformed ids up front; read resolves the key again.
        if let Err(diag) = EntityKey::parse_import_id(&request.id) {
            response.diagnostics.push(diag);
            return response;
        }

        import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

#[async_trait]
impl ResourceWithConfigure for EntityResource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        match downcast_provider_data(request.provider_data, HandlerKind::Resource) {
            Ok(provider_data) => {
                self.provider_data = provider_data;
                ConfigureResourceResponse {
                    diagnostics: vec![],
                }
            }
            Err(diag) => ConfigureResourceResponse {
                diagnostics: vec![diag],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfplug::types::Dynamic;

    async fn schema() -> tfplug::schema::Schema {
        EntityResource::new()
            .schema(Context::new(), ResourceSchemaRequest)
            .await
            .schema
    }

    fn config(properties: Dynamic) -> DynamicValue {
        DynamicValue::new(Dynamic::object([
            ("organization_id", Dynamic::from("org-1")),
            ("type", Dynamic::from("terraform:book")),
            ("entity_id", Dynamic::from("dune")),
            ("properties", properties),
        ]))
    }

    #[tokio::test]
    async fn schema_requires_one_slot_per_property() {
        let schema = schema().await;

        let diagnostics = schema.validate_config(&config(Dynamic::object([(
            "title",
            Dynamic::object([
                ("string", Dynamic::from("Dune")),
                ("number", Dynamic::from(1.0)),
            ]),
        )])));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].summary, "Invalid Attribute Combination");
        assert_eq!(
            diagnostics[0].attribute,
            Some(AttributePath::new("properties").key("title"))
        );

        let diagnostics = schema.validate_config(&config(Dynamic::object([(
            "title",
            Dynamic::object([("string", Dynamic::from("Dune"))]),
        )])));
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    }

    #[tokio::test]
    async fn schema_rejects_types_outside_terraform_namespace() {
        let mut value = config(Dynamic::Map(Default::default()));
        value
            .set_string(&AttributePath::new("type"), "book".to_string())
            .unwrap();

        let diagnostics = schema().await.validate_config(&value);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some(AttributePath::new("type")));
    }

    #[tokio::test]
    async fn import_rejects_malformed_ids() {
        let response = EntityResource::new()
            .import_state(
                Context::new(),
                ImportResourceStateRequest {
                    type_name: "gitbook_entity".to_string(),
                    id: "org-1/terraform:book".to_string(),
                },
            )
            .await;
        assert!(response.imported_resources.is_empty());
        assert_eq!(response.diagnostics[0].summary, "Invalid entity identifier");
    }

    #[tokio::test]
    async fn import_passes_composite_id_through() {
        let response = EntityResource::new()
            .import_state(
                Context::new(),
                ImportResourceStateRequest {
                    type_name: "gitbook_entity".to_string(),
                    id: "org-1/terraform:book/dune".to_string(),
                },
            )
            .await;
        assert!(response.diagnostics.is_empty());
        assert_eq!(
            response.imported_resources[0]
                .state
                .get_string(&AttributePath::new("id"))
                .unwrap(),
            "org-1/terraform:book/dune"
        );
    }

    #[tokio::test]
    async fn delete_requires_provider_data() {
        let response = EntityResource::new()
            .delete(
                Context::new(),
                DeleteResourceRequest {
                    type_name: "gitbook_entity".to_string(),
                    prior_state: config(Dynamic::Map(Default::default())),
                },
            )
            .await;
        assert_eq!(response.diagnostics[0].summary, "Provider not configured");
    }
}
