//! tfplug - an in-process Terraform plugin framework
//!
//! A provider implements [`Provider`] and registers one [`Resource`] or
//! [`DataSource`] factory per type name. [`ProviderServer`] owns the
//! provider and runs each lifecycle call against a freshly built,
//! freshly configured handler.

pub mod context;
pub mod error;
pub mod logging;
pub mod schema;
pub mod types;

pub mod data_source;
pub mod provider;
pub mod resource;
pub mod server;

pub mod import;
pub mod plan_modifier;
pub mod validator;

pub use context::Context;
pub use data_source::{DataSource, DataSourceWithConfigure};
pub use error::{Result, TfplugError};
pub use import::import_state_passthrough_id;
pub use provider::{Provider, ProviderMetadataRequest, ProviderMetadataResponse};
pub use resource::{Resource, ResourceWithConfigure, ResourceWithImportState};
pub use schema::{AttributeBuilder, AttributeType, NestedType, Schema, SchemaBuilder};
pub use server::ProviderServer;
pub use types::{AttributePath, Diagnostic, DiagnosticsExt, Dynamic, DynamicValue};
