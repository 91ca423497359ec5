//! Terraform provider for GitBook
//!
//! Exposes spaces, entities and entity schemas as resources and data
//! sources. Configure trades the integration token for an API session once;
//! every handler then shares the resulting [`api::Client`].

pub mod api;
pub mod auth;
pub mod data_sources;
pub mod models;
pub mod property;
pub mod provider_data;
pub mod resources;

pub use provider_data::GitBookProviderData;

use async_trait::async_trait;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, DataSourceFactory, Provider,
    ProviderMetadataRequest, ProviderMetadataResponse, ProviderSchemaRequest,
    ProviderSchemaResponse, ResourceFactory,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::Diagnostic;
use tfplug::{DataSourceWithConfigure, ResourceWithConfigure};

use auth::{exchange_token, user_agent, ProviderConfig};

pub struct GitBookProvider {
    version: String,
    provider_data: Option<GitBookProviderData>,
}

impl Default for GitBookProvider {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_VERSION"))
    }
}

impl GitBookProvider {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            provider_data: None,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Set once configure succeeds
    pub fn provider_data(&self) -> Option<&GitBookProviderData> {
        self.provider_data.as_ref()
    }
}

fn space_resource() -> Box<dyn ResourceWithConfigure> {
    Box::new(resources::SpaceResource::new())
}

fn entity_resource() -> Box<dyn ResourceWithConfigure> {
    Box::new(resources::EntityResource::new())
}

fn entity_schema_resource() -> Box<dyn ResourceWithConfigure> {
    Box::new(resources::EntitySchemaResource::new())
}

fn space_data_source() -> Box<dyn DataSourceWithConfigure> {
    Box::new(data_sources::SpaceDataSource::new())
}

fn entity_data_source() -> Box<dyn DataSourceWithConfigure> {
    Box::new(data_sources::EntityDataSource::new())
}

fn entity_schema_data_source() -> Box<dyn DataSourceWithConfigure> {
    Box::new(data_sources::EntitySchemaDataSource::new())
}

#[async_trait]
impl Provider for GitBookProvider {
    fn type_name(&self) -> &str {
        "gitbook"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: self.type_name().to_string(),
            version: self.version.clone(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ProviderSchemaRequest,
    ) -> ProviderSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Interact with GitBook")
            .attribute(
                AttributeBuilder::new("base_url", AttributeType::String)
                    .description(
                        "Base URL of the GitBook API. May also be provided via the GITBOOK_API_BASE_URL environment variable.",
                    )
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("integration_url", AttributeType::String)
                    .description(
                        "URL of the GitBook Terraform integration. May also be provided via the GITBOOK_INTEGRATION_URL environment variable.",
                    )
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("access_token", AttributeType::String)
                    .description(
                        "Access token of the GitBook Terraform integration. May also be provided via the GITBOOK_ACCESS_TOKEN environment variable.",
                    )
                    .optional()
                    .sensitive()
                    .build(),
            )
            .build();

        ProviderSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        tracing::info!("Configuring GitBook client");

        let config = match ProviderConfig::resolve(&request.config, |name| std::env::var(name).ok())
        {
            Ok(config) => config,
            Err(diagnostics) => {
                return ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                }
            }
        };
        tracing::debug!(
            base_url = %config.api_base_url,
            integration_url = %config.integration_url,
            "Resolved provider configuration"
        );

        let session = match exchange_token(&ctx, &config, &user_agent(&self.version)).await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("Token exchange failed: {}", e);
                return ConfigureProviderResponse {
                    diagnostics: vec![e.to_diagnostic()],
                    provider_data: None,
                };
            }
        };

        let client = match api::Client::new(&session) {
            Ok(client) => client,
            Err(e) => {
                return ConfigureProviderResponse {
                    diagnostics: vec![Diagnostic::error(
                        "Unable to create GitBook API client",
                        e.to_string(),
                    )],
                    provider_data: None,
                };
            }
        };

        let provider_data = GitBookProviderData::new(client);
        self.provider_data = Some(provider_data.clone());
        tracing::info!("Configured GitBook client");

        ConfigureProviderResponse {
            diagnostics: vec![],
            provider_data: Some(Arc::new(provider_data)),
        }
    }

    fn resources(&self) -> Vec<(&'static str, ResourceFactory)> {
        vec![
            ("gitbook_space", space_resource as ResourceFactory),
            ("gitbook_entity", entity_resource as ResourceFactory),
            ("gitbook_entity_schema", entity_schema_resource as ResourceFactory),
        ]
    }

    fn data_sources(&self) -> Vec<(&'static str, DataSourceFactory)> {
        vec![
            ("gitbook_space", space_data_source as DataSourceFactory),
            ("gitbook_entity", entity_data_source as DataSourceFactory),
            (
                "gitbook_entity_schema",
                entity_schema_data_source as DataSourceFactory,
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn metadata_reports_version() {
        let provider = GitBookProvider::new("1.2.3");
        let metadata = provider
            .metadata(Context::new(), ProviderMetadataRequest)
            .await;
        assert_eq!(metadata.type_name, "gitbook");
        assert_eq!(metadata.version, "1.2.3");
    }

    #[test]
    fn default_version_is_crate_version() {
        assert_eq!(
            GitBookProvider::default().version(),
            env!("CARGO_PKG_VERSION")
        );
    }

    #[tokio::test]
    async fn schema_marks_access_token_sensitive() {
        let schema = GitBookProvider::default()
            .schema(Context::new(), ProviderSchemaRequest)
            .await
            .schema;

        let token = schema.attribute("access_token").unwrap();
        assert!(token.optional && token.sensitive);
        assert!(schema.attribute("base_url").unwrap().optional);
        assert!(schema.attribute("integration_url").unwrap().optional);
    }

    #[test]
    fn registry_names_match_handlers() {
        let provider = GitBookProvider::default();

        for (name, factory) in provider.resources() {
            assert_eq!(factory().type_name(), name);
        }
        for (name, factory) in provider.data_sources() {
            assert_eq!(factory().type_name(), name);
        }
        assert_eq!(provider.resources().len(), 3);
        assert_eq!(provider.data_sources().len(), 3);
    }

    #[tokio::test]
    async fn provider_schema_covers_every_handler() {
        let server = tfplug::ProviderServer::new(GitBookProvider::default());
        let response = server.get_provider_schema(Context::new()).await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        let mut resources: Vec<_> = response.resource_schemas.keys().cloned().collect();
        resources.sort();
        assert_eq!(
            resources,
            ["gitbook_entity", "gitbook_entity_schema", "gitbook_space"]
        );
        assert_eq!(response.data_source_schemas.len(), 3);
    }
}
