//! Specification chain against a mocked backend and a temporary spec directory.

use std::sync::Arc;

use gateway_discovery::config::{GatewayConfig, SpecConfig};
use gateway_discovery::discovery::SpecChain;
use gateway_discovery::domain::{Service, ServiceId, SpecType};
use gateway_discovery::gateway::{GatewayAdminClient, KongAdminClient};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn admin_client(server: &MockServer) -> Arc<dyn GatewayAdminClient> {
    let config = GatewayConfig { admin_url: server.uri(), ..Default::default() };
    Arc::new(KongAdminClient::new(&config).unwrap())
}

fn backend_service(server: &MockServer, tags: &[&str]) -> Service {
    let url = url::Url::parse(&server.uri()).unwrap();
    Service {
        id: ServiceId::from("svc-1"),
        name: "petstore".to_string(),
        host: url.host_str().map(str::to_string),
        protocol: Some("http".to_string()),
        port: url.port(),
        path: None,
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

fn missing_everywhere_config(root: &std::path::Path) -> SpecConfig {
    SpecConfig {
        local_path: Some(root.to_path_buf()),
        dev_portal_enabled: false,
        url_paths: vec!["/openapi.json".to_string()],
        ..Default::default()
    }
}

#[tokio::test]
async fn exhausted_chain_is_no_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/openapi.json"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let chain = SpecChain::from_config(&missing_everywhere_config(dir.path()), admin_client(&server));
    assert_eq!(chain.source_names(), vec!["local", "backend_probe"]);

    let service = backend_service(&server, &["spec_local_absent.yaml"]);
    assert!(chain.acquire(&service).await.is_none());
}

#[tokio::test]
async fn exhausted_chain_falls_back_to_placeholder_when_enabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/openapi.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config =
        SpecConfig { create_unstructured_api: true, ..missing_everywhere_config(dir.path()) };
    let chain = SpecChain::from_config(&config, admin_client(&server));

    let doc = chain.acquire(&backend_service(&server, &[])).await.unwrap();
    assert_eq!(doc.spec_type, SpecType::Unstructured);
    assert_eq!(doc.title, "petstore");
}

#[tokio::test]
async fn backend_probe_skips_unparseable_candidates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/docs"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>docs</html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/swagger.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"swagger": "2.0", "info": {"title": "Petstore", "version": "1.0"}, "paths": {}}"#,
        ))
        .mount(&server)
        .await;

    let config = SpecConfig {
        url_paths: vec!["/docs".to_string(), "/swagger.json".to_string()],
        ..Default::default()
    };
    let chain = SpecChain::from_config(&config, admin_client(&server));

    let doc = chain.acquire(&backend_service(&server, &[])).await.unwrap();
    assert_eq!(doc.spec_type, SpecType::OpenApiV2);
    assert_eq!(doc.title, "Petstore");
}

#[tokio::test]
async fn local_directory_wins_over_backend_probe() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("petstore.yaml"),
        "openapi: 3.0.0\ninfo:\n  title: Local Petstore\n  version: 1.0.0\npaths: {}\n",
    )
    .unwrap();

    let chain = SpecChain::from_config(&missing_everywhere_config(dir.path()), admin_client(&server));
    let doc = chain.acquire(&backend_service(&server, &["spec_local_petstore.yaml"])).await.unwrap();

    assert_eq!(doc.spec_type, SpecType::OpenApiV3);
    assert_eq!(doc.title, "Local Petstore");
}

#[tokio::test]
async fn dev_portal_document_is_fetched_by_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{"path": "specs/petstore.json"}],
            "offset": null
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/specs/petstore.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "path": "specs/petstore.json",
            "contents": r#"{"openapi": "3.0.1", "info": {"title": "Portal", "version": "2"}, "paths": {}}"#
        })))
        .mount(&server)
        .await;

    let config = SpecConfig { dev_portal_enabled: true, ..Default::default() };
    let chain = SpecChain::from_config(&config, admin_client(&server));

    let doc = chain.acquire(&backend_service(&server, &[])).await.unwrap();
    assert_eq!(doc.title, "Portal");
    assert_eq!(doc.version, "2");
}
