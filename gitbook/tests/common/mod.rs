//! Shared setup: a mock GitBook API and a provider configured against it

#![allow(dead_code)]

use gitbook::GitBookProvider;
use mockito::{Mock, ServerGuard};
use tfplug::context::Context;
use tfplug::provider::ConfigureProviderRequest;
use tfplug::server::ProviderServer;
use tfplug::types::{ClientCapabilities, Diagnostic, Dynamic, DynamicValue};

pub const INTEGRATION_TOKEN: &str = "integration-token";
pub const API_TOKEN: &str = "short-lived-token";

/// Provider block pointing both endpoints at the mock server
pub fn provider_config(server: &ServerGuard) -> DynamicValue {
    DynamicValue::new(Dynamic::object([
        ("base_url", Dynamic::from(server.url())),
        (
            "integration_url",
            Dynamic::from(format!("{}/integration", server.url())),
        ),
        ("access_token", Dynamic::from(INTEGRATION_TOKEN)),
    ]))
}

pub async fn mock_token_exchange(server: &mut ServerGuard) -> Mock {
    server
        .mock("GET", "/integration")
        .match_header("authorization", format!("Bearer {}", INTEGRATION_TOKEN).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(r#"{{"token":"{}"}}"#, API_TOKEN))
        .create_async()
        .await
}

pub async fn configure(
    provider: &ProviderServer<GitBookProvider>,
    config: DynamicValue,
) -> Vec<Diagnostic> {
    // Already installed after the first test in a binary
    let _ = tfplug::logging::init_logging();
    provider
        .configure_provider(
            Context::new(),
            ConfigureProviderRequest {
                terraform_version: "1.9.0".to_string(),
                config,
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await
}

/// A provider server that has completed the token exchange
pub async fn configured_provider(server: &mut ServerGuard) -> ProviderServer<GitBookProvider> {
    let _exchange = mock_token_exchange(server).await;
    let provider = ProviderServer::new(GitBookProvider::new("test"));
    let diagnostics = configure(&provider, provider_config(server)).await;
    assert!(diagnostics.is_empty(), "configure failed: {:?}", diagnostics);
    provider
}

pub fn object(fields: &[(&str, Dynamic)]) -> DynamicValue {
    DynamicValue::new(Dynamic::object(
        fields.iter().map(|(k, v)| (k.to_string(), v.clone())),
    ))
}

pub fn summaries(diagnostics: &[Diagnostic]) -> Vec<&str> {
    diagnostics.iter().map(|d| d.summary.as_str()).collect()
}
