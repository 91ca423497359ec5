//! gitbook_space lifecycle against a mock GitBook API

#![allow(clippy::disallowed_methods)] // Allow unwrap() in tests for clarity

mod common;

use common::*;
use gitbook::GitBookProvider;
use mockito::{Matcher, Server};
use serde_json::json;
use tfplug::context::Context;
use tfplug::resource::{ImportResourceStateRequest, ReadResourceRequest};
use tfplug::server::{ApplyResourceChangeRequest, ApplyResourceChangeResponse, ProviderServer};
use tfplug::types::{AttributePath, Dynamic, DynamicValue};

fn space_body(visibility: &str) -> String {
    json!({
        "id": "space-1",
        "type": "document",
        "title": "Handbook",
        "visibility": visibility,
        "createdAt": "2024-03-01T10:00:00Z",
        "updatedAt": "2024-03-02T11:30:00.250Z",
        "urls": {
            "location": "https://api.gitbook.com/v1/spaces/space-1",
            "app": "https://app.gitbook.com/s/space-1",
            "published": "https://docs.example.com"
        },
        "organization": "org-1"
    })
    .to_string()
}

/// Planned state for a new space: computed attributes unknown
fn planned(fields: &[(&str, Dynamic)]) -> DynamicValue {
    let mut planned = object(&[
        ("id", Dynamic::Unknown),
        ("type", Dynamic::Unknown),
        ("title", Dynamic::Unknown),
        ("visibility", Dynamic::Unknown),
        ("created_at", Dynamic::Unknown),
        ("updated_at", Dynamic::Unknown),
        ("urls", Dynamic::Unknown),
        ("organization", Dynamic::Unknown),
        ("parent", Dynamic::Unknown),
    ]);
    for (name, value) in fields {
        planned
            .set_value(&AttributePath::new(name), value.clone())
            .unwrap();
    }
    planned
}

async fn apply(
    provider: &ProviderServer<GitBookProvider>,
    prior_state: DynamicValue,
    planned_state: DynamicValue,
) -> ApplyResourceChangeResponse {
    provider
        .apply_resource_change(
            Context::new(),
            ApplyResourceChangeRequest {
                type_name: "gitbook_space".to_string(),
                prior_state,
                config: planned_state.clone(),
                planned_state,
            },
        )
        .await
}

#[tokio::test]
async fn create_posts_to_organization() {
    let mut server = Server::new_async().await;
    let provider = configured_provider(&mut server).await;

    let create = server
        .mock("POST", "/v1/orgs/org-1/spaces")
        .match_body(Matcher::Json(json!({"title": "Handbook", "type": "document"})))
        .with_status(201)
        .with_body(space_body("private"))
        .expect(1)
        .create_async()
        .await;
    let patch = server
        .mock("PATCH", "/v1/spaces/space-1")
        .expect(0)
        .create_async()
        .await;

    let response = apply(
        &provider,
        DynamicValue::null(),
        planned(&[
            ("title", Dynamic::from("Handbook")),
            ("type", Dynamic::from("document")),
            ("organization", Dynamic::from("org-1")),
        ]),
    )
    .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state = response.new_state;
    assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "space-1");
    assert_eq!(
        state.get_string(&AttributePath::new("visibility")).unwrap(),
        "private"
    );
    assert_eq!(
        state.get_string(&AttributePath::new("updated_at")).unwrap(),
        "2024-03-02T11:30:00.250Z"
    );
    assert_eq!(
        state
            .get_string(&AttributePath::new("urls").attribute("published"))
            .unwrap(),
        "https://docs.example.com"
    );
    create.assert_async().await;
    patch.assert_async().await;
}

#[tokio::test]
async fn create_applies_configured_visibility() {
    let mut server = Server::new_async().await;
    let provider = configured_provider(&mut server).await;

    let _create = server
        .mock("POST", "/v1/orgs/org-1/spaces")
        .with_status(201)
        .with_body(space_body("private"))
        .create_async()
        .await;
    let patch = server
        .mock("PATCH", "/v1/spaces/space-1")
        .match_body(Matcher::Json(json!({"visibility": "share-link"})))
        .with_status(200)
        .with_body(space_body("share-link"))
        .expect(1)
        .create_async()
        .await;

    let response = apply(
        &provider,
        DynamicValue::null(),
        planned(&[
            ("organization", Dynamic::from("org-1")),
            ("visibility", Dynamic::from("share-link")),
        ]),
    )
    .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(
        response
            .new_state
            .get_string(&AttributePath::new("visibility"))
            .unwrap(),
        "share-link"
    );
    patch.assert_async().await;
}

#[tokio::test]
async fn failed_visibility_update_keeps_created_space() {
    let mut server = Server::new_async().await;
    let provider = configured_provider(&mut server).await;

    let _create = server
        .mock("POST", "/v1/orgs/org-1/spaces")
        .with_status(201)
        .with_body(space_body("private"))
        .create_async()
        .await;
    let patch = server
        .mock("PATCH", "/v1/spaces/space-1")
        .with_status(400)
        .with_body(r#"{"error":{"code":400,"message":"Visibility not allowed"}}"#)
        .expect(1)
        .create_async()
        .await;

    let response = apply(
        &provider,
        DynamicValue::null(),
        planned(&[
            ("organization", Dynamic::from("org-1")),
            ("visibility", Dynamic::from("public")),
        ]),
    )
    .await;

    assert_eq!(summaries(&response.diagnostics), vec!["Error updating GitBook space"]);
    assert_eq!(
        response.diagnostics[0].detail,
        "Could not set visibility of GitBook space (id: \"space-1\"): Visibility not allowed"
    );
    let state = response.new_state;
    assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "space-1");
    assert_eq!(
        state.get_string(&AttributePath::new("visibility")).unwrap(),
        "private"
    );
    patch.assert_async().await;
}

#[tokio::test]
async fn create_requires_organization() {
    let mut server = Server::new_async().await;
    let provider = configured_provider(&mut server).await;

    let create = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let response = apply(
        &provider,
        DynamicValue::null(),
        planned(&[("title", Dynamic::from("Handbook"))]),
    )
    .await;

    assert_eq!(
        summaries(&response.diagnostics),
        vec!["The argument \"organization\" is required to create a space."]
    );
    create.assert_async().await;
}

#[tokio::test]
async fn invalid_visibility_lists_allowed_values() {
    let mut server = Server::new_async().await;
    let provider = configured_provider(&mut server).await;

    let diagnostics = provider
        .validate_resource_config(
            Context::new(),
            "gitbook_space",
            object(&[
                ("organization", Dynamic::from("org-1")),
                ("visibility", Dynamic::from("secret")),
            ]),
        )
        .await;

    assert_eq!(summaries(&diagnostics), vec!["Invalid space visibility"]);
    assert_eq!(
        diagnostics[0].detail,
        r#"Allowed values: "public", "unlisted", "share-link", "visitor-auth", "in-collection", "private""#
    );
}

#[tokio::test]
async fn update_patches_type_and_visibility_only() {
    let mut server = Server::new_async().await;
    let provider = configured_provider(&mut server).await;

    let _read = server
        .mock("GET", "/v1/spaces/space-1")
        .with_status(200)
        .with_body(space_body("private"))
        .create_async()
        .await;
    let prior = provider
        .read_resource(
            Context::new(),
            ReadResourceRequest {
                type_name: "gitbook_space".to_string(),
                current_state: object(&[("id", Dynamic::from("space-1"))]),
            },
        )
        .await
        .new_state
        .unwrap();

    let patch = server
        .mock("PATCH", "/v1/spaces/space-1")
        .match_body(Matcher::Json(json!({"type": "document", "visibility": "public"})))
        .with_status(200)
        .with_body(space_body("public"))
        .expect(1)
        .create_async()
        .await;

    let mut planned = prior.clone();
    planned
        .set_string(&AttributePath::new("visibility"), "public".to_string())
        .unwrap();
    planned.mark_unknown(&AttributePath::new("updated_at")).unwrap();

    let response = apply(&provider, prior, planned).await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(
        response
            .new_state
            .get_string(&AttributePath::new("visibility"))
            .unwrap(),
        "public"
    );
    patch.assert_async().await;
}

#[tokio::test]
async fn delete_is_rejected_and_state_kept() {
    let mut server = Server::new_async().await;
    let provider = configured_provider(&mut server).await;

    let remote_delete = server
        .mock("DELETE", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let prior = object(&[("id", Dynamic::from("space-1"))]);
    let response = apply(&provider, prior.clone(), DynamicValue::null()).await;

    assert_eq!(
        summaries(&response.diagnostics),
        vec!["Deleting a space is not supported in the GitBook API"]
    );
    assert_eq!(response.new_state, prior);
    remote_delete.assert_async().await;
}

#[tokio::test]
async fn read_failure_names_the_space() {
    let mut server = Server::new_async().await;
    let provider = configured_provider(&mut server).await;

    let _read = server
        .mock("GET", "/v1/spaces/missing")
        .with_status(404)
        .with_body(r#"{"error":{"code":404,"message":"Space not found"}}"#)
        .create_async()
        .await;

    let imported = provider
        .import_resource_state(
            Context::new(),
            ImportResourceStateRequest {
                type_name: "gitbook_space".to_string(),
                id: "missing".to_string(),
            },
        )
        .await;
    let response = provider
        .read_resource(
            Context::new(),
            ReadResourceRequest {
                type_name: "gitbook_space".to_string(),
                current_state: imported.imported_resources[0].state.clone(),
            },
        )
        .await;

    assert_eq!(summaries(&response.diagnostics), vec!["Error reading GitBook space"]);
    assert_eq!(
        response.diagnostics[0].detail,
        "Could not fetch GitBook space (id: \"missing\"): Space not found"
    );
}
