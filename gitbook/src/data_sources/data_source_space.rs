//! Space data source implementation

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, NestedType, SchemaBuilder};
use tfplug::server::provider_not_configured;
use tfplug::types::{AttributePath, Diagnostic};

use crate::models::space_state;
use crate::provider_data::{downcast_provider_data, GitBookProviderData, HandlerKind};

#[derive(Default)]
pub struct SpaceDataSource {
    provider_data: Option<GitBookProviderData>,
}

impl SpaceDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn computed(name: &str, description: &str) -> tfplug::schema::Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .computed()
        .build()
}

#[async_trait]
impl DataSource for SpaceDataSource {
    fn type_name(&self) -> &str {
        "gitbook_space"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Space data source")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("The ID of the space")
                    .required()
                    .build(),
            )
            .attribute(computed("type", "The type of the space"))
            .attribute(computed("title", "The title of the space"))
            .attribute(computed("visibility", "Who can access the space"))
            .attribute(computed("created_at", "Creation time (RFC 3339)"))
            .attribute(computed("updated_at", "Last update time (RFC 3339)"))
            .attribute(
                AttributeBuilder::nested(
                    "urls",
                    NestedType::single(vec![
                        computed("location", ""),
                        computed("app", ""),
                        computed("published", ""),
                        computed("public", ""),
                    ]),
                )
                .computed()
                .build(),
            )
            .attribute(computed("organization", "The organization owning the space"))
            .attribute(computed("parent", "The collection the space belongs to"))
            .build();

        DataSourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn read(&self, ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let Some(provider_data) = &self.provider_data else {
            return ReadDataSourceResponse {
                state: request.config,
                diagnostics: vec![provider_not_configured()],
            };
        };

        let space_id = match request.config.get_string(&AttributePath::new("id")) {
            Ok(id) => id,
            Err(e) => {
                return ReadDataSourceResponse {
                    state: request.config,
                    diagnostics: vec![Diagnostic::error("Error reading GitBook space", e.to_string())
                        .with_attribute(AttributePath::new("id"))],
                }
            }
        };

        match provider_data.client.spaces().get(&ctx, &space_id).await {
            Ok(space) => ReadDataSourceResponse {
                state: space_state(&space),
                diagnostics: vec![],
            },
            Err(e) => ReadDataSourceResponse {
                state: request.config,
                diagnostics: vec![Diagnostic::error(
                    "Error reading GitBook space",
                    format!("Could not fetch GitBook space (id: {:?}): {}", space_id, e),
                )],
            },
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for SpaceDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        match downcast_provider_data(request.provider_data, HandlerKind::DataSource) {
            Ok(provider_data) => {
                self.provider_data = provider_data;
                ConfigureDataSourceResponse {
                    diagnostics: vec![],
                }
            }
            Err(diag) => ConfigureDataSourceResponse {
                diagnostics: vec![diag],
            },
        }
    }
}
