//! Entity data source implementation

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, NestedType, SchemaBuilder};
use tfplug::server::provider_not_configured;
use tfplug::types::Diagnostic;

use crate::models::{entity_state, EntityKey};
use crate::property::{BOOLEAN, NUMBER, RELATION, RELATION_ENTITY_ID, STRING};
use crate::provider_data::{downcast_provider_data, GitBookProviderData, HandlerKind};

#[derive(Default)]
pub struct EntityDataSource {
    provider_data: Option<GitBookProviderData>,
}

impl EntityDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DataSource for EntityDataSource {
    fn type_name(&self) -> &str {
        "gitbook_entity"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let property = vec![
            AttributeBuilder::new(STRING, AttributeType::String)
                .computed()
                .build(),
            AttributeBuilder::new(NUMBER, AttributeType::Number)
                .computed()
                .build(),
            AttributeBuilder::new(BOOLEAN, AttributeType::Bool)
                .computed()
                .build(),
            AttributeBuilder::nested(
                RELATION,
                NestedType::single(vec![AttributeBuilder::new(
                    RELATION_ENTITY_ID,
                    AttributeType::String,
                )
                .computed()
                .build()]),
            )
            .computed()
            .build(),
        ];

        let schema = SchemaBuilder::new()
            .version(0)
            .description("Entity data source")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("The computed ID of the entity.")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("organization_id", AttributeType::String)
                    .description("The ID of the organization that owns the entity.")
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
                AttributeBuilder::new("entity_id", AttributeType::String)
                    .description("The ID of the entity, unique for the related entity schema.")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::nested("properties", NestedType::map(property))
                    .description("Map of properties, keyed by property name.")
                    .computed()
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

        let key = match EntityKey::from_value(&request.config) {
            Ok(key) => key,
            Err(diag) => {
                return ReadDataSourceResponse {
                    state: request.config,
                    diagnostics: vec![diag],
                }
            }
        };

        let result = provider_data
            .client
            .entities()
            .get(&ctx, &key.organization_id, &key.entity_type, &key.entity_id)
            .await
            .map_err(|e| {
                Diagnostic::error(
                    "Error reading GitBook entity",
                    format!(
                        "Could not fetch GitBook entity (id: {:?}): {}",
                        key.entity_id, e
                    ),
                )
            })
            .and_then(|entity| entity_state(&key.organization_id, &entity));

        match result {
            Ok(state) => ReadDataSourceResponse {
                state,
                diagnostics: vec![],
            },
            Err(diag) => ReadDataSourceResponse {
                state: request.config,
                diagnostics: vec![diag],
            },
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for EntityDataSource {
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
