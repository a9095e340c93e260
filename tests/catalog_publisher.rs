//! HTTP catalog publisher against a mocked catalog endpoint.

use std::collections::BTreeMap;

use gateway_discovery::catalog::{CatalogPublisher, HttpCatalogPublisher};
use gateway_discovery::config::CatalogConfig;
use gateway_discovery::domain::{
    ApiDescriptor, EndpointDefinition, Protocol, RouteId, ServiceId, SpecType,
};
use gateway_discovery::errors::DiscoveryError;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn publisher(server: &MockServer, token: Option<&str>) -> HttpCatalogPublisher {
    let config = CatalogConfig {
        publish_url: format!("{}/apis", server.uri()),
        token: token.map(str::to_string),
        environment: "staging".to_string(),
        ..Default::default()
    };
    HttpCatalogPublisher::new(config).unwrap()
}

fn descriptor() -> ApiDescriptor {
    ApiDescriptor {
        external_id: "pets".to_string(),
        name: "petstore-pets".to_string(),
        title: "Petstore".to_string(),
        description: String::new(),
        version: "1.0.0".to_string(),
        service_id: ServiceId::from("petstore"),
        service_name: "petstore".to_string(),
        route_id: RouteId::from("pets"),
        route_name: "pets".to_string(),
        spec_type: SpecType::OpenApiV3,
        spec: "{}".to_string(),
        endpoints: vec![EndpointDefinition {
            host: "gw.example.com".to_string(),
            port: 8000,
            protocol: Protocol::Http,
            base_path: "/pets".to_string(),
        }],
        security: Vec::new(),
        credential_definitions: Vec::new(),
        access_definition: Some("kong-acl".to_string()),
        plugins: BTreeMap::new(),
        tags: vec!["petstore".to_string()],
        agent_details: BTreeMap::new(),
    }
}

#[tokio::test]
async fn accepted_descriptor_is_posted_with_environment_and_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/apis"))
        .and(header("authorization", "Bearer t0ken"))
        .and(body_partial_json(json!({
            "environment": "staging",
            "api": {"externalId": "pets", "title": "Petstore", "accessDefinition": "kong-acl"}
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    publisher(&server, Some("t0ken")).publish(&descriptor()).await.unwrap();
}

#[tokio::test]
async fn rejected_descriptor_is_not_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/apis"))
        .respond_with(ResponseTemplate::new(400).set_body_string("missing title"))
        .mount(&server)
        .await;

    let err = publisher(&server, None).publish(&descriptor()).await.unwrap_err();
    match &err {
        DiscoveryError::Publish { status, message } => {
            assert_eq!(*status, Some(400));
            assert!(message.contains("missing title"), "{}", message);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!err.is_retryable());
    assert!(!err.is_fatal());
}

#[tokio::test]
async fn unavailable_catalog_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/apis"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = publisher(&server, None).publish(&descriptor()).await.unwrap_err();
    assert!(matches!(err, DiscoveryError::Publish { status: Some(503), .. }), "{:?}", err);
    assert!(err.is_retryable());
}
