//! Provider trait and related types
//!
//! A provider owns the provider-level schema, turns the provider block into
//! shared provider data during configure, and exposes a static registry of
//! resource and data source constructors.

use crate::context::Context;
use crate::data_source::DataSourceWithConfigure;
use crate::resource::ResourceWithConfigure;
use crate::schema::Schema;
use crate::types::{ClientCapabilities, Diagnostic, DynamicValue};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

/// Builds a fresh, unconfigured resource
pub type ResourceFactory = fn() -> Box<dyn ResourceWithConfigure>;

/// Builds a fresh, unconfigured data source
pub type DataSourceFactory = fn() -> Box<dyn DataSourceWithConfigure>;

#[async_trait]
pub trait Provider: Send + Sync {
    /// Prefix shared by every resource and data source type name
    fn type_name(&self) -> &str;

    async fn metadata(
        &self,
        ctx: Context,
        request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse;

    async fn schema(&self, ctx: Context, request: ProviderSchemaRequest) -> ProviderSchemaResponse;

    /// Provider data returned here is handed to every resource and data source
    async fn configure(
        &mut self,
        ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse;

    /// Registered resources, in registration order
    fn resources(&self) -> Vec<(&'static str, ResourceFactory)>;

    /// Registered data sources, in registration order
    fn data_sources(&self) -> Vec<(&'static str, DataSourceFactory)>;
}

pub struct ProviderMetadataRequest;

pub struct ProviderMetadataResponse {
    pub type_name: String,
    pub version: String,
}

pub struct ProviderSchemaRequest;

pub struct ProviderSchemaResponse {
    pub schema: Schema,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ConfigureProviderRequest {
    pub terraform_version: String,
    pub config: DynamicValue,
    pub client_capabilities: ClientCapabilities,
}

pub struct ConfigureProviderResponse {
    pub diagnostics: Vec<Diagnostic>,
    pub provider_data: Option<Arc<dyn Any + Send + Sync>>,
}
