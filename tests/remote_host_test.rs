//! HTTP-level tests for the platform client and the package registry client

use nodescout::discovery::{
    N8nHost, NpmRegistry, PackageRegistry, ProbeOutcome, RegistryConfig, RemoteConfig, RemoteHost,
};
use nodescout::ScoutError;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn host_for(server: &MockServer) -> N8nHost {
    N8nHost::new(RemoteConfig {
        base_url: server.uri(),
        api_key: Some("test-key".to_string()),
        timeout: Duration::from_secs(2),
        ..RemoteConfig::default()
    })
    .unwrap()
}

fn node_types(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_validate_accepted_returns_artifact_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/workflows"))
        .and(header("X-N8N-API-KEY", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "wf-1", "name": "probe" })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = host_for(&server)
        .validate(&node_types(&["n8n-nodes-base.slack", "n8n-nodes-base.gmail"]))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ProbeOutcome::Accepted {
            artifact_id: Some("wf-1".to_string())
        }
    );
}

#[tokio::test]
async fn test_validate_numeric_artifact_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/workflows"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 42 })))
        .mount(&server)
        .await;

    let outcome = host_for(&server)
        .validate(&node_types(&["n8n-nodes-base.slack"]))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        ProbeOutcome::Accepted {
            artifact_id: Some("42".to_string())
        }
    );
}

#[tokio::test]
async fn test_validate_rejection_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/workflows"))
        .and(|req: &Request| String::from_utf8_lossy(&req.body).contains("bogusNode"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Unrecognized node type: bogusNode"))
        .mount(&server)
        .await;

    let outcome = host_for(&server)
        .validate(&node_types(&["n8n-nodes-base.bogusNode"]))
        .await
        .unwrap();

    match outcome {
        ProbeOutcome::Rejected { reason } => assert!(reason.starts_with("400")),
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_validate_server_error_carries_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/workflows"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = host_for(&server)
        .validate(&node_types(&["n8n-nodes-base.slack"]))
        .await
        .unwrap_err();

    assert!(matches!(err, ScoutError::Remote { status: Some(503), .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_delete_artifact_tolerates_missing_workflow() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/workflows/wf-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/workflows/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/workflows/locked"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let host = host_for(&server);
    assert!(host.delete_artifact("wf-1").await.is_ok());
    assert!(host.delete_artifact("gone").await.is_ok());
    assert!(host.delete_artifact("locked").await.is_err());
}

#[tokio::test]
async fn test_list_workflow_node_types_follows_cursor() {
    let server = MockServer::start().await;
    // Mounted first so it wins for the second request
    Mock::given(method("GET"))
        .and(path("/api/v1/workflows"))
        .and(query_param("cursor", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "id": "3", "nodes": [{ "type": "n8n-nodes-base.gmail" }, { "type": "n8n-nodes-weather.weather" }] }
            ],
            "nextCursor": null
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/workflows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "id": "1", "nodes": [{ "type": "n8n-nodes-base.slack" }, { "type": "n8n-nodes-base.gmail" }] },
                { "id": "2", "nodes": [{ "name": "untyped" }] }
            ],
            "nextCursor": "page-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let types = host_for(&server).list_workflow_node_types().await.unwrap();
    assert_eq!(
        types,
        vec![
            "n8n-nodes-base.gmail".to_string(),
            "n8n-nodes-base.slack".to_string(),
            "n8n-nodes-weather.weather".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_list_workflows_stops_at_page_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/workflows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "nodes": [{ "type": "n8n-nodes-base.slack" }] }],
            "nextCursor": "again"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let host = N8nHost::new(RemoteConfig {
        base_url: server.uri(),
        max_workflow_pages: 2,
        ..RemoteConfig::default()
    })
    .unwrap();

    let types = host.list_workflow_node_types().await.unwrap();
    assert_eq!(types, vec!["n8n-nodes-base.slack".to_string()]);
}

#[tokio::test]
async fn test_list_workflows_unauthorized_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/workflows"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let err = host_for(&server).list_workflow_node_types().await.unwrap_err();
    assert!(matches!(err, ScoutError::Remote { status: Some(401), .. }));
}

#[tokio::test]
async fn test_credential_schema_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/credentials/schema/slackApi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "object",
            "properties": { "accessToken": { "type": "string" } }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/credentials/schema/unknownApi"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let host = host_for(&server);
    let schema = host.credential_schema("slackApi").await.unwrap().unwrap();
    assert_eq!(schema["properties"]["accessToken"]["type"], "string");
    assert!(host.credential_schema("unknownApi").await.unwrap().is_none());
}

#[tokio::test]
async fn test_registry_search_maps_packages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/-/v1/search"))
        .and(query_param("text", "keywords:n8n-community-node-package"))
        .and(query_param("size", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [
                { "package": { "name": "n8n-nodes-weather", "version": "0.3.1", "keywords": ["n8n-community-node-package"] } },
                { "package": { "name": "@acme/n8n-nodes-crm", "version": "1.0.0", "description": "CRM nodes" } }
            ],
            "total": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let registry = NpmRegistry::new(&RegistryConfig {
        base_url: server.uri(),
        ..RegistryConfig::default()
    })
    .unwrap();

    let packages = registry.search("n8n-community-node-package", 5).await.unwrap();
    assert_eq!(packages.len(), 2);
    assert_eq!(packages[0].name, "n8n-nodes-weather");
    assert_eq!(packages[0].version, "0.3.1");
    assert_eq!(packages[1].description.as_deref(), Some("CRM nodes"));
}

#[tokio::test]
async fn test_registry_failure_is_registry_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/-/v1/search"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let registry = NpmRegistry::new(&RegistryConfig {
        base_url: server.uri(),
        ..RegistryConfig::default()
    })
    .unwrap();

    let err = registry.search("n8n-community-node-package", 10).await.unwrap_err();
    assert!(matches!(err, ScoutError::Registry { .. }));
}
