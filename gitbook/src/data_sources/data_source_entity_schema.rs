//! Entity schema data source implementation

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse,
};
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType, NestedType, SchemaBuilder};
use tfplug::server::provider_not_configured;
use tfplug::types::Diagnostic;

use crate::models::{entity_schema_state, EntitySchemaKey};
use crate::provider_data::{downcast_provider_data, GitBookProviderData, HandlerKind};

#[derive(Default)]
pub struct EntitySchemaDataSource {
    provider_data: Option<GitBookProviderData>,
}

impl EntitySchemaDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn computed(name: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .computed()
        .build()
}

#[async_trait]
impl DataSource for EntitySchemaDataSource {
    fn type_name(&self) -> &str {
        "gitbook_entity_schema"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Entity schema data source")
            .attribute(computed("id"))
            .attribute(
                AttributeBuilder::new("organization_id", AttributeType::String)
                    .description("The ID of the organization that owns the entity schema.")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("type", AttributeType::String)
                    .description("The type of the entity schema.")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::nested(
                    "title",
                    NestedType::single(vec![computed("singular"), computed("plural")]),
                )
                .computed()
                .build(),
            )
            .attribute(
                AttributeBuilder::nested(
                    "properties",
                    NestedType::list(vec![
                        computed("name"),
                        computed("title"),
                        computed("description"),
                        computed("type"),
                        AttributeBuilder::nested(
                            "entity",
                            NestedType::single(vec![computed("integration"), computed("type")]),
                        )
                        .computed()
                        .build(),
                    ]),
                )
                .description("The properties of the entity schema, in API order.")
                .computed()
                .build(),
            )
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

        let key = match EntitySchemaKey::from_value(&request.config) {
            Ok(key) => key,
            Err(diag) => {
                return ReadDataSourceResponse {
                    state: request.config,
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
            Ok(schema) => ReadDataSourceResponse {
                state: entity_schema_state(&key.organization_id, &schema),
                diagnostics: vec![],
            },
            Err(e) => ReadDataSourceResponse {
                state: request.config,
                diagnostics: vec![Diagnostic::error(
                    "Error reading GitBook entity schema",
                    format!(
                        "Could not fetch GitBook entity schema (organization: {:?}, type: {:?}): {}",
                        key.organization_id, key.schema_type, e
                    ),
                )],
            },
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for EntitySchemaDataSource {
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
