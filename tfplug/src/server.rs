//! In-process provider server
//!
//! [`ProviderServer`] plays the role of the plugin host: it owns the
//! provider, instantiates resources and data sources from the provider's
//! registry, hands them the provider data produced by configure, and routes
//! each lifecycle call to the right handler.

use crate::context::Context;
use crate::data_source::{
    ConfigureDataSourceRequest, DataSourceMetadataRequest, DataSourceSchemaRequest,
    DataSourceWithConfigure, ReadDataSourceRequest, ReadDataSourceResponse,
    ValidateDataSourceConfigRequest,
};
use crate::error::TfplugError;
use crate::plan_modifier::{self, PlannedChange};
use crate::provider::{
    ConfigureProviderRequest, Provider, ProviderMetadataRequest, ProviderSchemaRequest,
};
use crate::resource::{
    ConfigureResourceRequest, CreateResourceRequest, DeleteResourceRequest,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, ResourceMetadataRequest, ResourceSchemaRequest, ResourceWithConfigure,
    UpdateResourceRequest, ValidateResourceConfigRequest,
};
use crate::schema::Schema;
use crate::types::{Diagnostic, DiagnosticsExt, DynamicValue};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

type ProviderData = Option<Arc<dyn Any + Send + Sync>>;

/// Schemas of the provider and everything it registers
#[derive(Debug)]
pub struct GetProviderSchemaResponse {
    pub provider: Schema,
    pub resource_schemas: HashMap<String, Schema>,
    pub data_source_schemas: HashMap<String, Schema>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct PlanResourceChangeRequest {
    pub type_name: String,
    pub prior_state: DynamicValue,
    pub proposed_new_state: DynamicValue,
    pub config: DynamicValue,
}

pub type PlanResourceChangeResponse = PlannedChange;

/// One apply step; null prior state creates, null planned state deletes
pub struct ApplyResourceChangeRequest {
    pub type_name: String,
    pub prior_state: DynamicValue,
    pub planned_state: DynamicValue,
    pub config: DynamicValue,
}

pub struct ApplyResourceChangeResponse {
    pub new_state: DynamicValue,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ProviderServer<P: Provider> {
    provider: RwLock<P>,
    provider_data: RwLock<ProviderData>,
}

impl<P: Provider> ProviderServer<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider: RwLock::new(provider),
            provider_data: RwLock::new(None),
        }
    }

    pub async fn get_provider_schema(&self, ctx: Context) -> GetProviderSchemaResponse {
        let provider = self.provider.read().await;
        let mut diagnostics = Vec::new();

        let provider_schema = provider.schema(ctx.clone(), ProviderSchemaRequest).await;
        diagnostics.extend(provider_schema.diagnostics);

        let mut resource_schemas = HashMap::new();
        for (type_name, factory) in provider.resources() {
            let resource = factory();
            let metadata = resource.metadata(ctx.clone(), ResourceMetadataRequest).await;
            if metadata.type_name != type_name {
                diagnostics.push(registry_mismatch(type_name, &metadata.type_name));
            }
            let response = resource.schema(ctx.clone(), ResourceSchemaRequest).await;
            diagnostics.extend(response.diagnostics);
            resource_schemas.insert(type_name.to_string(), response.schema);
        }

        let mut data_source_schemas = HashMap::new();
        for (type_name, factory) in provider.data_sources() {
            let data_source = factory();
            let metadata = data_source
                .metadata(ctx.clone(), DataSourceMetadataRequest)
                .await;
            if metadata.type_name != type_name {
                diagnostics.push(registry_mismatch(type_name, &metadata.type_name));
            }
            let response = data_source.schema(ctx.clone(), DataSourceSchemaRequest).await;
            diagnostics.extend(response.diagnostics);
            data_source_schemas.insert(type_name.to_string(), response.schema);
        }

        GetProviderSchemaResponse {
            provider: provider_schema.schema,
            resource_schemas,
            data_source_schemas,
            diagnostics,
        }
    }

    pub async fn validate_provider_config(&self, ctx: Context, config: &DynamicValue) -> Vec<Diagnostic> {
        let provider = self.provider.read().await;
        let response = provider.schema(ctx, ProviderSchemaRequest).await;
        let mut diagnostics = response.diagnostics;
        diagnostics.extend(response.schema.validate_config(config));
        diagnostics
    }

    /// Configures the provider and keeps its provider data for later calls.
    pub async fn configure_provider(
        &self,
        ctx: Context,
        request: ConfigureProviderRequest,
    ) -> Vec<Diagnostic> {
        let mut provider = self.provider.write().await;
        let metadata = provider.metadata(ctx.clone(), ProviderMetadataRequest).await;
        debug!(
            provider = %metadata.type_name,
            version = %metadata.version,
            terraform_version = %request.terraform_version,
            "configuring provider"
        );

        let response = provider.configure(ctx, request).await;
        if !response.diagnostics.has_errors() {
            *self.provider_data.write().await = response.provider_data;
        } else {
            warn!("provider configuration failed");
        }
        response.diagnostics
    }

    pub async fn validate_resource_config(
        &self,
        ctx: Context,
        type_name: &str,
        config: DynamicValue,
    ) -> Vec<Diagnostic> {
        let resource = match self.new_resource(type_name).await {
            Ok(resource) => resource,
            Err(diagnostic) => return vec![diagnostic],
        };

        let schema = resource.schema(ctx.clone(), ResourceSchemaRequest).await;
        let mut diagnostics = schema.diagnostics;
        diagnostics.extend(schema.schema.validate_config(&config));
        if diagnostics.has_errors() {
            return diagnostics;
        }

        let response = resource
            .validate(
                ctx,
                ValidateResourceConfigRequest {
                    type_name: type_name.to_string(),
                    config,
                },
            )
            .await;
        diagnostics.extend(response.diagnostics);
        diagnostics
    }

    pub async fn validate_data_source_config(
        &self,
        ctx: Context,
        type_name: &str,
        config: DynamicValue,
    ) -> Vec<Diagnostic> {
        let data_source = match self.new_data_source(type_name).await {
            Ok(data_source) => data_source,
            Err(diagnostic) => return vec![diagnostic],
        };

        let schema = data_source.schema(ctx.clone(), DataSourceSchemaRequest).await;
        let mut diagnostics = schema.diagnostics;
        diagnostics.extend(schema.schema.validate_config(&config));
        if diagnostics.has_errors() {
            return diagnostics;
        }

        let response = data_source
            .validate(
                ctx,
                ValidateDataSourceConfigRequest {
                    type_name: type_name.to_string(),
                    config,
                },
            )
            .await;
        diagnostics.extend(response.diagnostics);
        diagnostics
    }

    pub async fn plan_resource_change(
        &self,
        ctx: Context,
        request: PlanResourceChangeRequest,
    ) -> PlanResourceChangeResponse {
        let resource = match self.new_resource(&request.type_name).await {
            Ok(resource) => resource,
            Err(diagnostic) => {
                return PlannedChange {
                    planned_state: request.proposed_new_state,
                    requires_replace: Vec::new(),
                    diagnostics: vec![diagnostic],
                }
            }
        };

        let schema = resource.schema(ctx, ResourceSchemaRequest).await;
        let mut change = plan_modifier::plan_resource_change(
            &schema.schema,
            &request.prior_state,
            &request.proposed_new_state,
            &request.config,
        );
        change.diagnostics.extend(schema.diagnostics);
        change
    }

    pub async fn apply_resource_change(
        &self,
        ctx: Context,
        request: ApplyResourceChangeRequest,
    ) -> ApplyResourceChangeResponse {
        let resource = match self.configured_resource(ctx.clone(), &request.type_name).await {
            Ok(resource) => resource,
            Err(diagnostics) => {
                return ApplyResourceChangeResponse {
                    new_state: request.prior_state,
                    diagnostics,
                }
            }
        };

        if request.planned_state.is_null() {
            debug!(type_name = %request.type_name, "deleting resource");
            let response = resource
                .delete(
                    ctx,
                    DeleteResourceRequest {
                        type_name: request.type_name,
                        prior_state: request.prior_state.clone(),
                    },
                )
                .await;
            let new_state = if response.diagnostics.has_errors() {
                request.prior_state
            } else {
                DynamicValue::null()
            };
            return ApplyResourceChangeResponse {
                new_state,
                diagnostics: response.diagnostics,
            };
        }

        if request.prior_state.is_null() {
            debug!(type_name = %request.type_name, "creating resource");
            let response = resource
                .create(
                    ctx,
                    CreateResourceRequest {
                        type_name: request.type_name,
                        planned_state: request.planned_state,
                        config: request.config,
                    },
                )
                .await;
            return ApplyResourceChangeResponse {
                new_state: response.new_state,
                diagnostics: response.diagnostics,
            };
        }

        debug!(type_name = %request.type_name, "updating resource");
        let response = resource
            .update(
                ctx,
                UpdateResourceRequest {
                    type_name: request.type_name,
                    prior_state: request.prior_state,
                    planned_state: request.planned_state,
                    config: request.config,
                },
            )
            .await;
        ApplyResourceChangeResponse {
            new_state: response.new_state,
            diagnostics: response.diagnostics,
        }
    }

    pub async fn read_resource(
        &self,
        ctx: Context,
        request: ReadResourceRequest,
    ) -> ReadResourceResponse {
        let resource = match self.configured_resource(ctx.clone(), &request.type_name).await {
            Ok(resource) => resource,
            Err(diagnostics) => {
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                }
            }
        };

        debug!(type_name = %request.type_name, "reading resource");
        resource.read(ctx, request).await
    }

    pub async fn import_resource_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let resource = match self.configured_resource(ctx.clone(), &request.type_name).await {
            Ok(resource) => resource,
            Err(diagnostics) => {
                return ImportResourceStateResponse {
                    imported_resources: Vec::new(),
                    diagnostics,
                }
            }
        };

        match resource.as_import_state() {
            Some(importer) => {
                debug!(type_name = %request.type_name, id = %request.id, "importing resource");
                importer.import_state(ctx, request).await
            }
            None => ImportResourceStateResponse {
                imported_resources: Vec::new(),
                diagnostics: vec![Diagnostic::error(
                    "Resource Import Not Implemented",
                    format!(
                        "This resource does not support import: {}",
                        request.type_name
                    ),
                )],
            },
        }
    }

    pub async fn read_data_source(
        &self,
        ctx: Context,
        request: ReadDataSourceRequest,
    ) -> ReadDataSourceResponse {
        let data_source = match self.configured_data_source(ctx.clone(), &request.type_name).await
        {
            Ok(data_source) => data_source,
            Err(diagnostics) => {
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics,
                }
            }
        };

        debug!(type_name = %request.type_name, "reading data source");
        data_source.read(ctx, request).await
    }

    async fn new_resource(
        &self,
        type_name: &str,
    ) -> Result<Box<dyn ResourceWithConfigure>, Diagnostic> {
        let provider = self.provider.read().await;
        provider
            .resources()
            .into_iter()
            .find(|(name, _)| *name == type_name)
            .map(|(_, factory)| factory())
            .ok_or_else(|| {
                Diagnostic::error(
                    "Unknown resource type",
                    TfplugError::ResourceNotFound(type_name.to_string()).to_string(),
                )
            })
    }

    async fn new_data_source(
        &self,
        type_name: &str,
    ) -> Result<Box<dyn DataSourceWithConfigure>, Diagnostic> {
        let provider = self.provider.read().await;
        provider
            .data_sources()
            .into_iter()
            .find(|(name, _)| *name == type_name)
            .map(|(_, factory)| factory())
            .ok_or_else(|| {
                Diagnostic::error(
                    "Unknown data source type",
                    TfplugError::DataSourceNotFound(type_name.to_string()).to_string(),
                )
            })
    }

    async fn configured_resource(
        &self,
        ctx: Context,
        type_name: &str,
    ) -> Result<Box<dyn ResourceWithConfigure>, Vec<Diagnostic>> {
        let mut resource = self.new_resource(type_name).await.map_err(|d| vec![d])?;
        let provider_data = self.provider_data.read().await.clone();
        let response = resource
            .configure(ctx, ConfigureResourceRequest { provider_data })
            .await;
        if response.diagnostics.has_errors() {
            return Err(response.diagnostics);
        }
        Ok(resource)
    }

    async fn configured_data_source(
        &self,
        ctx: Context,
        type_name: &str,
    ) -> Result<Box<dyn DataSourceWithConfigure>, Vec<Diagnostic>> {
        let mut data_source = self.new_data_source(type_name).await.map_err(|d| vec![d])?;
        let provider_data = self.provider_data.read().await.clone();
        let response = data_source
            .configure(ctx, ConfigureDataSourceRequest { provider_data })
            .await;
        if response.diagnostics.has_errors() {
            return Err(response.diagnostics);
        }
        Ok(data_source)
    }
}

fn registry_mismatch(registered: &str, reported: &str) -> Diagnostic {
    Diagnostic::error(
        "Mismatched type name",
        format!(
            "Handler registered as {:?} reports type name {:?}",
            registered, reported
        ),
    )
}

/// The diagnostic handlers report when an operation runs without provider data.
pub fn provider_not_configured() -> Diagnostic {
    Diagnostic::error(
        TfplugError::ProviderNotConfigured.to_string(),
        "The provider has not been configured. Configure the provider before using this resource or data source.",
    )
}
