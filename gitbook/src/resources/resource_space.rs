//! Space resource implementation

use async_trait::async_trait;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::import::import_state_passthrough_id;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceSchemaRequest, ResourceSchemaResponse,
    ResourceWithConfigure, ResourceWithImportState, UpdateResourceRequest,
    UpdateResourceResponse, ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, NestedType, SchemaBuilder};
use tfplug::server::provider_not_configured;
use tfplug::types::{AttributePath, Diagnostic};

use crate::api::spaces::{CreateSpaceRequest, UpdateSpaceRequest};
use crate::models::{space_state, SpaceModel};
use crate::provider_data::{downcast_provider_data, GitBookProviderData, HandlerKind};

#[derive(Default)]
pub struct SpaceResource {
    provider_data: Option<GitBookProviderData>,
}

impl SpaceResource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Resource for SpaceResource {
    fn type_name(&self) -> &str {
        "gitbook_space"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Space resource")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("The ID of the space")
                    .computed()
                    .plan_modifier(Arc::new(UseStateForUnknown))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("type", AttributeType::String)
                    .description("The type of the space: `document` or `collection`")
                    .optional()
                    .computed()
                    .plan_modifier(Arc::new(UseStateForUnknown))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("title", AttributeType::String)
                    .description("The title of the space")
                    .optional()
                    .computed()
                    .plan_modifier(Arc::new(UseStateForUnknown))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("visibility", AttributeType::String)
                    .description("Who can access the space")
                    .optional()
                    .computed()
                    .plan_modifier(Arc::new(UseStateForUnknown))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("created_at", AttributeType::String)
                    .description("Creation time (RFC 3339)")
                    .computed()
                    .plan_modifier(Arc::new(UseStateForUnknown))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("updated_at", AttributeType::String)
                    .description("Last update time (RFC 3339)")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::nested(
                    "urls",
                    NestedType::single(vec![
                        AttributeBuilder::new("location", AttributeType::String)
                            .computed()
                            .build(),
                        AttributeBuilder::new("app", AttributeType::String)
                            .computed()
                            .build(),
                        AttributeBuilder::new("published", AttributeType::String)
                            .computed()
                            .build(),
                        AttributeBuilder::new("public", AttributeType::String)
                            .computed()
                            .build(),
                    ]),
                )
                .computed()
                .plan_modifier(Arc::new(UseStateForUnknown))
                .build(),
            )
            .attribute(
                AttributeBuilder::new("organization", AttributeType::String)
                    .description("The organization owning the space; required to create one")
                    .optional()
                    .computed()
                    .plan_modifier(Arc::new(UseStateForUnknown))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("parent", AttributeType::String)
                    .description("The collection the space belongs to")
                    .optional()
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

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let mut diagnostics = vec![];

        match SpaceModel::from_value(&request.config) {
            Ok(model) => {
                if let Err(diag) = model.space_type() {
                    diagnostics.push(diag);
                }
                if let Err(diag) = model.visibility() {
                    diagnostics.push(diag);
                }
            }
            Err(diag) => diagnostics.push(diag),
        }

        ValidateResourceConfigResponse { diagnostics }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let Some(provider_data) = &self.provider_data else {
            return CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![provider_not_configured()],
            };
        };

        let model = match SpaceModel::from_value(&request.planned_state) {
            Ok(model) => model,
            Err(diag) => {
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics: vec![diag],
                }
            }
        };

        let organization_id = match model.organization.as_deref() {
            Some(org) if !org.is_empty() => org.to_string(),
            _ => {
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics: vec![Diagnostic::error(
                        "The argument \"organization\" is required to create a space.",
                        "",
                    )
                    .with_attribute(AttributePath::new("organization"))],
                }
            }
        };

        let (space_type, visibility) = match (model.space_type(), model.visibility()) {
            (Ok(space_type), Ok(visibility)) => (space_type, visibility),
            (space_type, visibility) => {
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics: [space_type.err(), visibility.err()]
                        .into_iter()
                        .flatten()
                        .collect(),
                }
            }
        };

        let create_request = CreateSpaceRequest {
            title: model.title.clone(),
            parent: model.parent.clone(),
            space_type,
        };
        let mut space = match provider_data
            .client
            .spaces()
            .create(&ctx, &organization_id, &create_request)
            .await
        {
            Ok(space) => space,
            Err(e) => {
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics: vec![Diagnostic::error(
                        "Error creating GitBook space",
                        format!("Could not create GitBook space: {}", e),
                    )],
                }
            }
        };
        tracing::debug!(space_id = %space.id, "created space");

        // Visibility is not part of the create call.
        if let Some(visibility) = visibility.filter(|v| v.as_str() != space.visibility) {
            let update = UpdateSpaceRequest {
                space_type: None,
                visibility: Some(visibility),
            };
            match provider_data
                .client
                .spaces()
                .update(&ctx, &space.id, &update)
                .await
            {
                Ok(updated) => space = updated,
                Err(e) => {
                    // The space exists; keep it in state so Terraform taints it.
                    return CreateResourceResponse {
                        new_state: space_state(&space),
                        diagnostics: vec![Diagnostic::error(
                            "Error updating GitBook space",
                            format!(
                                "Could not set visibility of GitBook space (id: {:?}): {}",
                                space.id, e
                            ),
                        )],
                    };
                }
            }
        }

        CreateResourceResponse {
            new_state: space_state(&space),
            diagnostics: vec![],
        }
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let Some(provider_data) = &self.provider_data else {
            return ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: vec![provider_not_configured()],
            };
        };

        let space_id = match request.current_state.get_string(&AttributePath::new("id")) {
            Ok(id) => id,
            Err(e) => {
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics: vec![Diagnostic::error("Error reading GitBook space", e.to_string())
                        .with_attribute(AttributePath::new("id"))],
                }
            }
        };

        match provider_data.client.spaces().get(&ctx, &space_id).await {
            Ok(space) => ReadResourceResponse {
                new_state: Some(space_state(&space)),
                diagnostics: vec![],
            },
            Err(e) => ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: vec![Diagnostic::error(
                    "Error reading GitBook space",
                    format!("Could not fetch GitBook space (id: {:?}): {}", space_id, e),
                )],
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

        let model = match SpaceModel::from_value(&request.planned_state) {
            Ok(model) => model,
            Err(diag) => {
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics: vec![diag],
                }
            }
        };

        let (space_type, visibility) = match (model.space_type(), model.visibility()) {
            (Ok(space_type), Ok(visibility)) => (space_type, visibility),
            (space_type, visibility) => {
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics: [space_type.err(), visibility.err()]
                        .into_iter()
                        .flatten()
                        .collect(),
                }
            }
        };

        let space_id = match model
            .id
            .clone()
            .map(Ok)
            .unwrap_or_else(|| request.prior_state.get_string(&AttributePath::new("id")))
        {
            Ok(id) => id,
            Err(e) => {
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics: vec![Diagnostic::error("Error updating GitBook space", e.to_string())],
                }
            }
        };

        let update = UpdateSpaceRequest {
            space_type,
            visibility,
        };
        match provider_data
            .client
            .spaces()
            .update(&ctx, &space_id, &update)
            .await
        {
            Ok(space) => UpdateResourceResponse {
                new_state: space_state(&space),
                diagnostics: vec![],
            },
            Err(e) => UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics: vec![Diagnostic::error(
                    "Error updating GitBook space",
                    format!("Could not update GitBook space (id: {:?}): {}", space_id, e),
                )],
            },
        }
    }

    async fn delete(
        &self,
        _ctx: Context,
        _request: DeleteResourceRequest,
    ) -> DeleteResourceResponse {
        DeleteResourceResponse {
            diagnostics: vec![Diagnostic::error(
                "Deleting a space is not supported in the GitBook API",
                "",
            )],
        }
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithImportState for SpaceResource {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse {
            imported_resources: vec![],
            diagnostics: vec![],
        };
        import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

#[async_trait]
impl ResourceWithConfigure for SpaceResource {
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
