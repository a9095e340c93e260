//! Common test utilities for integration tests.
//!
//! In-memory gateway and catalog fakes plus fixture builders.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gateway_discovery::catalog::CatalogPublisher;
use gateway_discovery::config::AgentConfig;
use gateway_discovery::domain::{ApiDescriptor, Plugin, Route, RouteId, Service, ServiceId};
use gateway_discovery::errors::{DiscoveryError, Result};
use gateway_discovery::gateway::{GatewayAdminClient, PortalFile, SpecLocator};

pub const SPEC_PATH: &str = "/openapi.json";

/// Gateway contents served by [`FakeGateway`]
#[derive(Debug, Clone, Default)]
pub struct GatewayState {
    pub services: Vec<Service>,
    pub routes: HashMap<ServiceId, Vec<Route>>,
    pub plugins: Vec<Plugin>,
    /// Spec bytes keyed by the locator's display form
    pub specs: HashMap<String, Vec<u8>>,
    /// Services whose route listing fails
    pub failing_routes: HashSet<ServiceId>,
    pub fail_list_services: bool,
    /// Artificial latency on route listing
    pub route_delay: Option<Duration>,
}

/// In-memory gateway admin client
#[derive(Debug, Default)]
pub struct FakeGateway {
    state: Mutex<GatewayState>,
    pub list_services_calls: AtomicUsize,
    pub list_routes_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeGateway {
    pub fn new(state: GatewayState) -> Arc<Self> {
        Arc::new(Self { state: Mutex::new(state), ..Default::default() })
    }

    pub fn update(&self, f: impl FnOnce(&mut GatewayState)) {
        let mut state = self.state.lock().unwrap();
        f(&mut state);
    }

    fn snapshot(&self) -> GatewayState {
        self.state.lock().unwrap().clone()
    }
}

#[async_trait]
impl GatewayAdminClient for FakeGateway {
    async fn list_services(&self) -> Result<Vec<Service>> {
        self.list_services_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.snapshot();
        if state.fail_list_services {
            return Err(DiscoveryError::gateway("services unavailable", 503));
        }
        Ok(state.services)
    }

    async fn list_routes_for_service(&self, service_id: &ServiceId) -> Result<Vec<Route>> {
        self.list_routes_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.snapshot();

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = state.route_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if state.failing_routes.contains(service_id) {
            return Err(DiscoveryError::gateway("routes unavailable", 500));
        }
        Ok(state.routes.get(service_id).cloned().unwrap_or_default())
    }

    async fn list_plugins(&self) -> Result<Vec<Plugin>> {
        Ok(self.snapshot().plugins)
    }

    async fn list_portal_files(&self, _service_id: &ServiceId) -> Result<Vec<PortalFile>> {
        Ok(Vec::new())
    }

    async fn fetch_spec(&self, locator: &SpecLocator, _timeout: Duration) -> Result<Option<Vec<u8>>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshot().specs.get(&locator.to_string()).cloned())
    }
}

/// Catalog publisher that records what it is given
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<ApiDescriptor>>,
    failing: Mutex<HashSet<String>>,
    /// Artificial latency on every publish
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl RecordingPublisher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self { delay: Some(delay), ..Default::default() })
    }

    /// Reject descriptors with this external id until cleared
    pub fn fail_for(&self, external_id: &str) {
        self.failing.lock().unwrap().insert(external_id.to_string());
    }

    pub fn clear_failures(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub fn published(&self) -> Vec<ApiDescriptor> {
        self.published.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.published.lock().unwrap().len()
    }
}

#[async_trait]
impl CatalogPublisher for RecordingPublisher {
    async fn publish(&self, descriptor: &ApiDescriptor) -> Result<()> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.lock().unwrap().contains(&descriptor.external_id) {
            return Err(DiscoveryError::publish("catalog unavailable", Some(503)));
        }
        self.published.lock().unwrap().push(descriptor.clone());
        Ok(())
    }
}

pub fn service(id: &str, tags: &[&str]) -> Service {
    Service {
        id: ServiceId::from(id),
        name: format!("{}-svc", id),
        host: Some(format!("{}.internal", id)),
        protocol: Some("http".to_string()),
        port: None,
        path: None,
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

pub fn route(id: &str, service_id: &str, paths: &[&str], protocols: &[&str]) -> Route {
    Route {
        id: RouteId::from(id),
        name: id.to_string(),
        service: Some(ServiceId::from(service_id)),
        hosts: Vec::new(),
        paths: paths.iter().map(|p| p.to_string()).collect(),
        protocols: protocols.iter().map(|p| p.to_string()).collect(),
        tags: Vec::new(),
    }
}

pub fn openapi(title: &str) -> Vec<u8> {
    format!(
        r#"{{"openapi": "3.0.3", "info": {{"title": "{}", "version": "1.0.0"}}, "paths": {{}}}}"#,
        title
    )
    .into_bytes()
}

/// Locator key the backend probe uses for a fixture service
pub fn spec_key(service_id: &str) -> String {
    format!("http://{}.internal{}", service_id, SPEC_PATH)
}

pub fn global_acl() -> Plugin {
    Plugin::new("acl-global", "acl", true)
}

/// One service with one route, a spec and a global ACL
pub fn single_route_gateway() -> GatewayState {
    let mut state = GatewayState {
        services: vec![service("petstore", &["public"])],
        plugins: vec![global_acl()],
        ..Default::default()
    };
    state.routes.insert(
        ServiceId::from("petstore"),
        vec![route("pets", "petstore", &["/pets"], &["http", "https"])],
    );
    state.specs.insert(spec_key("petstore"), openapi("Petstore"));
    state
}

/// Configuration probing `SPEC_PATH` on every backend
pub fn agent_config() -> AgentConfig {
    let mut config = AgentConfig::default();
    config.spec.url_paths = vec![SPEC_PATH.to_string()];
    config
}
