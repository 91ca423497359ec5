//! Entity schema resource implementation

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
use tfplug::schema::{AttributeBuilder, AttributeType, NestedType, SchemaBuilder};
use tfplug::server::provider_not_configured;
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::{ListLengthValidator, StringOneOfValidator, UniqueByValidator};

use super::terraform_type_validator;
use crate::models::{entity_schema_state, EntitySchemaKey, EntitySchemaModel};
use crate::provider_data::{downcast_provider_data, GitBookProviderData, HandlerKind};

/// Property types accepted by the API
pub const PROPERTY_TYPES: [&str; 5] = ["text", "number", "boolean", "date", "relation"];

#[derive(Default)]
pub struct EntitySchemaResource {
    provider_data: Option<GitBookProviderData>,
}

impl EntitySchemaResource {
    pub fn new() -> Self {
        Self::default()
    }

    /// PUTs the planned schema, then reads it back so state matches the API.
    async fn write(
        &self,
        ctx: &Context,
        provider_data: &GitBookProviderData,
        planned_state: &DynamicValue,
        summary: &str,
        verb: &str,
    ) -> Result<DynamicValue, Diagnostic> {
        let model = EntitySchemaModel::from_value(planned_state)?;
        let schemas = provider_data.client.entity_schemas();

        schemas
            .set(ctx, &model.organization_id, &model.schema)
            .await
            .map_err(|e| {
                Diagnostic::error(
                    summary,
                    format!("Could not {} GitBook entity schema: {}", verb, e),
                )
            })?;
        tracing::debug!(
            organization_id = %model.organization_id,
            schema_type = %model.schema.schema_type,
            "stored entity schema"
        );

        let key = model.key();
        let schema = schemas
            .get(ctx, &key.organization_id, &key.schema_type)
            .await
            .map_err(|e| read_error(&key, e))?;

        Ok(entity_schema_state(&key.organization_id, &schema))
    }
}

fn read_error(key: &EntitySchemaKey, e: crate::api::ApiError) -> Diagnostic {
    Diagnostic::error(
        "Error reading GitBook entity schema",
        format!(
            "Could not fetch GitBook entity schema (organization: {:?}, type: {:?}): {}",
            key.organization_id, key.schema_type, e
        ),
    )
}

#[async_trait]
impl Resource for EntitySchemaResource {
    fn type_name(&self) -> &str {
        "gitbook_entity_schema"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let property = vec![
            AttributeBuilder::new("name", AttributeType::String)
                .description("The name of the property. Must be unique within the entity schema.")
                .required()
                .build(),
            AttributeBuilder::new("title", AttributeType::String)
                .description("The title of the property.")
                .required()
                .build(),
            AttributeBuilder::new("description", AttributeType::String)
                .description("The description of the property.")
                .optional()
                .build(),
            AttributeBuilder::new("type", AttributeType::String)
                .description(
                    "The type of the property. Must be one of `text`, `number`, `boolean`, `date`, or `relation`.",
                )
                .required()
                .validator(Arc::new(StringOneOfValidator::new(PROPERTY_TYPES)))
                .build(),
            AttributeBuilder::nested(
                "entity",
                NestedType::single(vec![
                    AttributeBuilder::new("integration", AttributeType::String)
                        .description("The integration owning the related entity schema, if any.")
                        .optional()
                        .build(),
                    AttributeBuilder::new("type", AttributeType::String)
                        .description("The type of the entity schema that can be used for relations.")
                        .required()
                        .build(),
                ]),
            )
            .description("Required when type is `relation`.")
            .optional()
            .build(),
        ];

        let schema = SchemaBuilder::new()
            .version(0)
            .description("Entity schema resource")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("The ID of the entity schema, `<organization_id>/<type>`.")
                    .computed()
                    .plan_modifier(Arc::new(UseStateForUnknown))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("organization_id", AttributeType::String)
                    .description("The ID of the organization that owns the entity schema.")
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
                AttributeBuilder::nested(
                    "title",
                    NestedType::single(vec![
                        AttributeBuilder::new("singular", AttributeType::String)
                            .required()
                            .build(),
                        AttributeBuilder::new("plural", AttributeType::String)
                            .required()
                            .build(),
                    ]),
                )
                .description("The title of the entity schema.")
                .required()
                .build(),
            )
            .attribute(
                AttributeBuilder::nested("properties", NestedType::set(property))
                    .description(
                        "The properties of the entity schema. Each property must have a unique name. At least one property is required.",
                    )
                    .required()
                    .validator(Arc::new(ListLengthValidator::at_least(1)))
                    .validator(Arc::new(UniqueByValidator::new("name")))
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
            .write(
                &ctx,
                provider_data,
                &request.planned_state,
                "Error creating GitBook entity schema",
                "create",
            )
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

        let key = match EntitySchemaKey::from_value(&request.current_state) {
            Ok(key) => key,
            Err(diag) => {
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics: vec![diag],
                }
            }
        };

        match provider_data
            .client
            .entity_schemas()
            .get(&ctx, &key.organization_id, &key.schema_type)
            .await
        {
            Ok(schema) => ReadResourceResponse {
                new_state: Some(entity_schema_state(&key.organization_id, &schema)),
                diagnostics: vec![],
            },
            Err(e) => ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: vec![read_error(&key, e)],
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
            .write(
                &ctx,
                provider_data,
                &request.planned_state,
                "Error updating GitBook entity schema",
                "update",
            )
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

        let key = match EntitySchemaKey::from_value(&request.prior_state) {
            Ok(key) => key,
            Err(diag) => {
                return DeleteResourceResponse {
                    diagnostics: vec![diag],
                }
            }
        };

        match provider_data
            .client
            .entity_schemas()
            .delete(&ctx, &key.organization_id, &key.schema_type)
            .await
        {
            Ok(()) => DeleteResourceResponse {
                diagnostics: vec![],
            },
            Err(e) => {
                tracing::warn!(id = %key.id(), error = %e, "entity schema deletion failed");
                DeleteResourceResponse {
                    diagnostics: vec![Diagnostic::error(
                        "Error deleting GitBook entity schema",
                        format!("Could not delete GitBook entity schema: {}", e),
                    )],
                }
            }
        }
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithImportState for EntitySchemaResource {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse {
            imported_resources: vec![],
            diagnostics: vec![],
        };

        if let Err(diag) = EntitySchemaKey::parse_import_id(&request.id) {
            response.diagnostics.push(diag);
            return response;
        }

        import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

#[async_trait]
impl ResourceWithConfigure for EntitySchemaResource {
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
