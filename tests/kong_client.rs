//! Kong Admin API client against a mocked admin endpoint.

use std::time::Duration;

use gateway_discovery::config::GatewayConfig;
use gateway_discovery::domain::{PluginKind, PluginScope, ServiceId};
use gateway_discovery::errors::DiscoveryError;
use gateway_discovery::gateway::{GatewayAdminClient, KongAdminClient, SpecLocator};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, page_size: u32) -> KongAdminClient {
    let config = GatewayConfig {
        admin_url: server.uri(),
        admin_token: Some("s3cret".to_string()),
        page_size,
        ..Default::default()
    };
    KongAdminClient::new(&config).unwrap()
}

#[tokio::test]
async fn services_listing_follows_offset_cursor() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/services"))
        .and(query_param("offset", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "s2", "name": "orders", "host": "orders.internal", "protocol": "http"}],
            "offset": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/services"))
        .and(query_param("size", "1"))
        .and(header("kong-admin-token", "s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "s1", "name": "petstore", "tags": ["public"]}],
            "next": "/services?offset=page-2",
            "offset": "page-2"
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let services = client(&server, 1).list_services().await.unwrap();
    let names: Vec<_> = services.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["petstore", "orders"]);
    assert_eq!(services[0].tags, vec!["public"]);
    assert_eq!(services[1].backend_url().as_deref(), Some("http://orders.internal"));
}

#[tokio::test]
async fn routes_with_null_lists_are_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services/s1/routes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": "r1",
                "name": "pets",
                "service": {"id": "s1"},
                "hosts": null,
                "paths": ["/pets"],
                "protocols": ["http", "https"],
                "tags": null
            }],
            "offset": null
        })))
        .mount(&server)
        .await;

    let routes = client(&server, 100).list_routes_for_service(&ServiceId::from("s1")).await.unwrap();
    assert_eq!(routes.len(), 1);
    assert!(routes[0].hosts.is_empty());
    assert_eq!(routes[0].service, Some(ServiceId::from("s1")));
}

#[tokio::test]
async fn plugins_carry_kind_and_scope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/plugins"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "p1", "name": "acl", "enabled": true, "route": null, "service": null,
                 "config": {"allow": ["admins"]}},
                {"id": "p2", "name": "oauth2", "enabled": false, "route": {"id": "r1"},
                 "service": {"id": "s1"}, "config": {"scopes": ["read"]}}
            ]
        })))
        .mount(&server)
        .await;

    let plugins = client(&server, 100).list_plugins().await.unwrap();
    assert_eq!(plugins[0].kind, PluginKind::Acl);
    assert_eq!(plugins[0].scope(), PluginScope::Global);
    assert_eq!(plugins[1].kind, PluginKind::OAuth2);
    assert_eq!(plugins[1].scope(), PluginScope::RouteAndService);
    assert!(!plugins[1].enabled);
}

#[tokio::test]
async fn admin_errors_carry_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let err = client(&server, 100).list_services().await.unwrap_err();
    match &err {
        DiscoveryError::Gateway { status, message } => {
            assert_eq!(*status, 503);
            assert!(message.starts_with("listing services: "), "{}", message);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.is_retryable());
    assert!(!err.is_fatal());
}

#[tokio::test]
async fn url_fetch_returns_none_for_non_200() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/openapi.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/swagger.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;

    let client = client(&server, 100);
    let timeout = Duration::from_secs(10);

    let missing = SpecLocator::Url(format!("{}/openapi.json", server.uri()));
    assert!(client.fetch_spec(&missing, timeout).await.unwrap().is_none());

    let found = SpecLocator::Url(format!("{}/swagger.json", server.uri()));
    assert_eq!(client.fetch_spec(&found, timeout).await.unwrap(), Some(b"{}".to_vec()));
}

#[tokio::test]
async fn slow_spec_fetch_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/openapi.json"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let locator = SpecLocator::Url(format!("{}/openapi.json", server.uri()));
    let err = client(&server, 100)
        .fetch_spec(&locator, Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(matches!(err, DiscoveryError::Timeout { .. }), "{:?}", err);
}

#[tokio::test]
async fn missing_portal_file_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/specs/missing.json"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not found"})))
        .mount(&server)
        .await;

    let locator = SpecLocator::PortalFile("specs/missing.json".to_string());
    let result =
        client(&server, 100).fetch_spec(&locator, Duration::from_secs(1)).await.unwrap();
    assert!(result.is_none());
}
