//! # Specification Acquisition
//!
//! An explicit, ordered list of [`SpecSource`]s built from configuration and
//! owned by the agent. Sources are tried in order once per service; the first
//! one to produce a parseable document wins.
//!
//! Default order:
//!
//! 1. [`LocalDirectorySource`] when `spec.local_path` is set
//! 2. [`DevPortalSource`] when `spec.dev_portal_enabled`
//! 3. [`BackendProbeSource`] (inert when `spec.url_paths` is empty)
//! 4. [`UnstructuredSource`] when `spec.create_unstructured_api`

pub mod parser;
pub mod sources;

pub use parser::parse_spec;
pub use sources::{
    BackendProbeSource, DevPortalSource, LocalDirectorySource, SpecSource, UnstructuredSource,
    LOCAL_SPEC_TAG_PREFIX,
};

use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::SpecConfig;
use crate::domain::{Service, SpecDocument};
use crate::gateway::GatewayAdminClient;

/// Ordered, short-circuiting list of specification sources
pub struct SpecChain {
    sources: Vec<Box<dyn SpecSource>>,
}

impl SpecChain {
    pub fn new(sources: Vec<Box<dyn SpecSource>>) -> Self {
        Self { sources }
    }

    /// Build the default chain from configuration
    pub fn from_config(config: &SpecConfig, client: Arc<dyn GatewayAdminClient>) -> Self {
        let timeout = config.fetch_timeout();
        let mut sources: Vec<Box<dyn SpecSource>> = Vec::new();

        if let Some(root) = &config.local_path {
            sources.push(Box::new(LocalDirectorySource::new(root.clone())));
        }
        if config.dev_portal_enabled {
            sources.push(Box::new(DevPortalSource::new(client.clone(), timeout)));
        }
        sources.push(Box::new(BackendProbeSource::new(client, config.url_paths.clone(), timeout)));
        if config.create_unstructured_api {
            sources.push(Box::new(UnstructuredSource));
        }

        Self::new(sources)
    }

    /// Names of the configured sources, in evaluation order
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Walk the chain for one service.
    ///
    /// A source that fails is logged and skipped; `None` means every source
    /// came up empty.
    pub async fn acquire(&self, service: &Service) -> Option<SpecDocument> {
        for source in &self.sources {
            match source.acquire(service).await {
                Ok(Some(doc)) => {
                    debug!(service_id = %service.id, source = source.name(), "Specification found");
                    return Some(doc);
                }
                Ok(None) => {
                    debug!(service_id = %service.id, source = source.name(), "No specification");
                }
                Err(e) => {
                    warn!(
                        service_id = %service.id,
                        source = source.name(),
                        error = %e,
                        "Specification source failed"
                    );
                }
            }
        }
        None
    }
}

impl std::fmt::Debug for SpecChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpecChain").field("sources", &self.source_names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Plugin, Route, ServiceId, SpecType};
    use crate::errors::{DiscoveryError, Result};
    use crate::gateway::{PortalFile, SpecLocator};
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingClient {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl GatewayAdminClient for CountingClient {
        async fn list_services(&self) -> Result<Vec<Service>> {
            Ok(Vec::new())
        }
        async fn list_routes_for_service(&self, _: &ServiceId) -> Result<Vec<Route>> {
            Ok(Vec::new())
        }
        async fn list_plugins(&self) -> Result<Vec<Plugin>> {
            Ok(Vec::new())
        }
        async fn list_portal_files(&self, _: &ServiceId) -> Result<Vec<PortalFile>> {
            Ok(Vec::new())
        }
        async fn fetch_spec(&self, _: &SpecLocator, _: Duration) -> Result<Option<Vec<u8>>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }
    }

    struct FailingSource;

    #[async_trait]
    impl SpecSource for FailingSource {
        fn name(&self) -> &'static str {
            "failing"
        }
        async fn acquire(&self, _: &Service) -> Result<Option<SpecDocument>> {
            Err(DiscoveryError::internal("boom"))
        }
    }

    fn service() -> Service {
        Service {
            id: ServiceId::from("svc-1"),
            name: "petstore".to_string(),
            host: Some("petstore.internal".to_string()),
            protocol: Some("http".to_string()),
            port: None,
            path: None,
            tags: Vec::new(),
        }
    }

    #[test]
    fn chain_order_follows_configuration() {
        let client: Arc<dyn GatewayAdminClient> = Arc::new(CountingClient::default());

        let config = SpecConfig {
            local_path: Some(PathBuf::from("/specs")),
            dev_portal_enabled: true,
            create_unstructured_api: true,
            ..Default::default()
        };
        assert_eq!(
            SpecChain::from_config(&config, client.clone()).source_names(),
            vec!["local", "dev_portal", "backend_probe", "unstructured"]
        );

        assert_eq!(
            SpecChain::from_config(&SpecConfig::default(), client).source_names(),
            vec!["backend_probe"]
        );
    }

    #[tokio::test]
    async fn empty_probe_list_makes_no_calls() {
        let client = Arc::new(CountingClient::default());
        let chain = SpecChain::from_config(&SpecConfig::default(), client.clone());

        assert!(chain.acquire(&service()).await.is_none());
        assert_eq!(client.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failing_source_does_not_stop_the_chain() {
        let chain = SpecChain::new(vec![Box::new(FailingSource), Box::new(UnstructuredSource)]);
        let doc = chain.acquire(&service()).await.unwrap();
        assert_eq!(doc.spec_type, SpecType::Unstructured);
    }
}
