//! Drives a small in-memory provider through ProviderServer

#![allow(clippy::disallowed_methods)] // Allow unwrap() in tests for clarity

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tfplug::context::Context;
use tfplug::data_source::*;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::provider::*;
use tfplug::resource::*;
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::server::{
    provider_not_configured, ApplyResourceChangeRequest, PlanResourceChangeRequest,
    ProviderServer,
};
use tfplug::types::{
    AttributePath, ClientCapabilities, Diagnostic, DiagnosticsExt, Dynamic, DynamicValue,
};
use tokio_test::assert_ok;

#[derive(Default)]
struct Store {
    notes: Mutex<HashMap<String, String>>,
    next_id: AtomicUsize,
}

struct MemoProvider;

#[async_trait]
impl Provider for MemoProvider {
    fn type_name(&self) -> &str {
        "memo"
    }

    async fn metadata(&self, _: Context, _: ProviderMetadataRequest) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: "memo".to_string(),
            version: "0.0.1".to_string(),
        }
    }

    async fn schema(&self, _: Context, _: ProviderSchemaRequest) -> ProviderSchemaResponse {
        ProviderSchemaResponse {
            schema: Schema::default(),
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        _: Context,
        _: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        ConfigureProviderResponse {
            diagnostics: vec![],
            provider_data: Some(Arc::new(Arc::new(Store::default()))),
        }
    }

    fn resources(&self) -> Vec<(&'static str, ResourceFactory)> {
        vec![("memo_note", new_note_resource as ResourceFactory)]
    }

    fn data_sources(&self) -> Vec<(&'static str, DataSourceFactory)> {
        vec![("memo_note", new_note_data_source as DataSourceFactory)]
    }
}

fn new_note_resource() -> Box<dyn ResourceWithConfigure> {
    Box::new(NoteResource::default())
}

fn new_note_data_source() -> Box<dyn DataSourceWithConfigure> {
    Box::new(NoteDataSource::default())
}

fn note_schema() -> Schema {
    SchemaBuilder::new()
        .attribute(
            AttributeBuilder::new("id", AttributeType::String)
                .computed()
                .plan_modifier(Arc::new(UseStateForUnknown))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("text", AttributeType::String)
                .required()
                .build(),
        )
        .build()
}

#[derive(Default)]
struct NoteResource {
    store: Option<Arc<Store>>,
}

#[async_trait]
impl Resource for NoteResource {
    fn type_name(&self) -> &str {
        "memo_note"
    }

    async fn schema(&self, _: Context, _: ResourceSchemaRequest) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: note_schema(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let mut diagnostics = vec![];
        let text = request.config.get_string(&AttributePath::new("text"));
        if matches!(text.as_deref(), Ok("")) {
            diagnostics.push(
                Diagnostic::error("Empty note", "text must not be empty")
                    .with_attribute(AttributePath::new("text")),
            );
        }
        ValidateResourceConfigResponse { diagnostics }
    }

    async fn create(&self, _: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let Some(store) = &self.store else {
            return CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![provider_not_configured()],
            };
        };
        let text = request
            .config
            .get_string(&AttributePath::new("text"))
            .unwrap();
        let id = format!("note-{}", store.next_id.fetch_add(1, Ordering::SeqCst));
        store.notes.lock().unwrap().insert(id.clone(), text);

        let mut state = request.planned_state;
        state.set_string(&AttributePath::new("id"), id).unwrap();
        CreateResourceResponse {
            new_state: state,
            diagnostics: vec![],
        }
    }

    async fn read(&self, _: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let store = self.store.as_ref().unwrap();
        let id = request
            .current_state
            .get_string(&AttributePath::new("id"))
            .unwrap();
        let new_state = store.notes.lock().unwrap().get(&id).map(|text| {
            DynamicValue::new(Dynamic::object([
                ("id", Dynamic::from(id.clone())),
                ("text", Dynamic::from(text.clone())),
            ]))
        });
        ReadResourceResponse {
            new_state,
            diagnostics: vec![],
        }
    }

    async fn update(&self, _: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let store = self.store.as_ref().unwrap();
        let id = request
            .planned_state
            .get_string(&AttributePath::new("id"))
            .unwrap();
        let text = request
            .planned_state
            .get_string(&AttributePath::new("text"))
            .unwrap();
        store.notes.lock().unwrap().insert(id, text);
        UpdateResourceResponse {
            new_state: request.planned_state,
            diagnostics: vec![],
        }
    }

    async fn delete(&self, _: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let store = self.store.as_ref().unwrap();
        let id = request
            .prior_state
            .get_string(&AttributePath::new("id"))
            .unwrap();
        store.notes.lock().unwrap().remove(&id);
        DeleteResourceResponse {
            diagnostics: vec![],
        }
    }
}

#[async_trait]
impl ResourceWithConfigure for NoteResource {
    async fn configure(
        &mut self,
        _: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        if let Some(data) = request.provider_data {
            self.store = data.downcast_ref::<Arc<Store>>().cloned();
        }
        ConfigureResourceResponse {
            diagnostics: vec![],
        }
    }
}

#[derive(Default)]
struct NoteDataSource {
    store: Option<Arc<Store>>,
}

#[async_trait]
impl DataSource for NoteDataSource {
    fn type_name(&self) -> &str {
        "memo_note"
    }

    async fn schema(&self, _: Context, _: DataSourceSchemaRequest) -> DataSourceSchemaResponse {
        DataSourceSchemaResponse {
            schema: SchemaBuilder::new()
                .attribute(
                    AttributeBuilder::new("id", AttributeType::String)
                        .required()
                        .build(),
                )
                .attribute(
                    AttributeBuilder::new("text", AttributeType::String)
                        .computed()
                        .build(),
                )
                .build(),
            diagnostics: vec![],
        }
    }

    async fn read(&self, _: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let Some(store) = &self.store else {
            return ReadDataSourceResponse {
                state: request.config,
                diagnostics: vec![provider_not_configured()],
            };
        };
        let id = request.config.get_string(&AttributePath::new("id")).unwrap();
        let text = store.notes.lock().unwrap().get(&id).cloned();

        let mut state = request.config;
        state
            .set_value(&AttributePath::new("text"), Dynamic::string_or_null(text))
            .unwrap();
        ReadDataSourceResponse {
            state,
            diagnostics: vec![],
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for NoteDataSource {
    async fn configure(
        &mut self,
        _: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        if let Some(data) = request.provider_data {
            self.store = data.downcast_ref::<Arc<Store>>().cloned();
        }
        ConfigureDataSourceResponse {
            diagnostics: vec![],
        }
    }
}

fn configure_request() -> ConfigureProviderRequest {
    ConfigureProviderRequest {
        terraform_version: "1.9.0".to_string(),
        config: DynamicValue::null(),
        client_capabilities: ClientCapabilities::default(),
    }
}

fn note(id: Dynamic, text: &str) -> DynamicValue {
    DynamicValue::new(Dynamic::object([("id", id), ("text", Dynamic::from(text))]))
}

#[tokio::test]
async fn schema_covers_registry() {
    let server = ProviderServer::new(MemoProvider);
    let response = server.get_provider_schema(Context::new()).await;

    assert!(response.diagnostics.is_empty());
    assert!(response.resource_schemas.contains_key("memo_note"));
    assert!(response.data_source_schemas.contains_key("memo_note"));
}

#[tokio::test]
async fn unknown_resource_type_is_reported() {
    let server = ProviderServer::new(MemoProvider);
    let diags = server
        .validate_resource_config(Context::new(), "memo_missing", DynamicValue::null())
        .await;

    assert_eq!(diags.len(), 1);
    assert!(diags[0].detail.contains("memo_missing"));
}

#[tokio::test]
async fn validation_requires_text() {
    let server = ProviderServer::new(MemoProvider);
    let config = DynamicValue::new(Dynamic::object([
        ("id", Dynamic::Null),
        ("text", Dynamic::Null),
    ]));

    let diags = server
        .validate_resource_config(Context::new(), "memo_note", config)
        .await;
    assert!(diags.has_errors());
    assert_eq!(diags[0].attribute, Some(AttributePath::new("text")));
}

#[tokio::test]
async fn resource_validate_runs_after_schema_checks() {
    let server = ProviderServer::new(MemoProvider);

    let diags = server
        .validate_resource_config(Context::new(), "memo_note", note(Dynamic::Null, ""))
        .await;
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].summary, "Empty note");

    let diags = server
        .validate_resource_config(Context::new(), "memo_note", note(Dynamic::Null, "hi"))
        .await;
    assert!(diags.is_empty());
}

#[tokio::test]
async fn apply_before_configure_fails() {
    let server = ProviderServer::new(MemoProvider);
    let response = server
        .apply_resource_change(
            Context::new(),
            ApplyResourceChangeRequest {
                type_name: "memo_note".to_string(),
                prior_state: DynamicValue::null(),
                planned_state: note(Dynamic::Unknown, "hello"),
                config: note(Dynamic::Null, "hello"),
            },
        )
        .await;

    assert!(response.diagnostics.has_errors());
    assert_eq!(response.diagnostics[0].summary, "Provider not configured");
}

#[tokio::test]
async fn full_lifecycle() {
    let server = ProviderServer::new(MemoProvider);
    assert!(server
        .configure_provider(Context::new(), configure_request())
        .await
        .is_empty());

    let config = note(Dynamic::Null, "hello");
    let plan = server
        .plan_resource_change(
            Context::new(),
            PlanResourceChangeRequest {
                type_name: "memo_note".to_string(),
                prior_state: DynamicValue::null(),
                proposed_new_state: config.clone(),
                config: config.clone(),
            },
        )
        .await;
    assert!(plan.planned_state.is_unknown_at(&AttributePath::new("id")));

    let created = server
        .apply_resource_change(
            Context::new(),
            ApplyResourceChangeRequest {
                type_name: "memo_note".to_string(),
                prior_state: DynamicValue::null(),
                planned_state: plan.planned_state,
                config,
            },
        )
        .await;
    assert!(created.diagnostics.is_empty());
    let id = assert_ok!(created.new_state.get_string(&AttributePath::new("id")));

    let config = note(Dynamic::Null, "updated");
    let plan = server
        .plan_resource_change(
            Context::new(),
            PlanResourceChangeRequest {
                type_name: "memo_note".to_string(),
                prior_state: created.new_state.clone(),
                proposed_new_state: note(Dynamic::from(id.clone()), "updated"),
                config: config.clone(),
            },
        )
        .await;
    assert_eq!(
        plan.planned_state.get_string(&AttributePath::new("id")).unwrap(),
        id
    );

    let updated = server
        .apply_resource_change(
            Context::new(),
            ApplyResourceChangeRequest {
                type_name: "memo_note".to_string(),
                prior_state: created.new_state,
                planned_state: plan.planned_state,
                config,
            },
        )
        .await;
    assert!(updated.diagnostics.is_empty());

    let read = server
        .read_data_source(
            Context::new(),
            ReadDataSourceRequest {
                type_name: "memo_note".to_string(),
                config: DynamicValue::new(Dynamic::object([
                    ("id", Dynamic::from(id.clone())),
                    ("text", Dynamic::Null),
                ])),
            },
        )
        .await;
    assert_eq!(
        read.state.get_string(&AttributePath::new("text")).unwrap(),
        "updated"
    );

    let deleted = server
        .apply_resource_change(
            Context::new(),
            ApplyResourceChangeRequest {
                type_name: "memo_note".to_string(),
                prior_state: updated.new_state.clone(),
                planned_state: DynamicValue::null(),
                config: DynamicValue::null(),
            },
        )
        .await;
    assert!(deleted.diagnostics.is_empty());
    assert!(deleted.new_state.is_null());

    let gone = server
        .read_resource(
            Context::new(),
            ReadResourceRequest {
                type_name: "memo_note".to_string(),
                current_state: updated.new_state,
            },
        )
        .await;
    assert!(gone.new_state.is_none());
}

#[tokio::test]
async fn import_requires_support() {
    let server = ProviderServer::new(MemoProvider);
    server
        .configure_provider(Context::new(), configure_request())
        .await;

    let response = server
        .import_resource_state(
            Context::new(),
            ImportResourceStateRequest {
                type_name: "memo_note".to_string(),
                id: "note-0".to_string(),
            },
        )
        .await;

    assert!(response.imported_resources.is_empty());
    assert_eq!(response.diagnostics[0].summary, "Resource Import Not Implemented");
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_reads_share_provider_data() {
    let server = Arc::new(ProviderServer::new(MemoProvider));
    server
        .configure_provider(Context::new(), configure_request())
        .await;

    let config = note(Dynamic::Unknown, "shared");
    let created = server
        .apply_resource_change(
            Context::new(),
            ApplyResourceChangeRequest {
                type_name: "memo_note".to_string(),
                prior_state: DynamicValue::null(),
                planned_state: config.clone(),
                config,
            },
        )
        .await;

    let reads = (0..8).map(|_| {
        let server = server.clone();
        let state = created.new_state.clone();
        async move {
            server
                .read_resource(
                    Context::new(),
                    ReadResourceRequest {
                        type_name: "memo_note".to_string(),
                        current_state: state,
                    },
                )
                .await
        }
    });

    for response in futures::future::join_all(reads).await {
        assert!(response.diagnostics.is_empty());
        let state = response.new_state.unwrap();
        assert_eq!(state.get_string(&AttributePath::new("text")).unwrap(), "shared");
    }
}
