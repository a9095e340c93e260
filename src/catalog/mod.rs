//! # Catalog Publisher
//!
//! Finished descriptors leave the agent through [`CatalogPublisher`].
//! [`HttpCatalogPublisher`] POSTs them as JSON to the configured catalog
//! endpoint; the catalog's own resource model is its concern, not ours.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument, trace};

use crate::config::CatalogConfig;
use crate::domain::ApiDescriptor;
use crate::errors::{DiscoveryError, Result};

/// Accepts finished API descriptors for publication
#[async_trait]
pub trait CatalogPublisher: Send + Sync {
    /// Publish one descriptor. Synchronous from the caller's point of view:
    /// returning `Ok` means the catalog accepted it.
    async fn publish(&self, descriptor: &ApiDescriptor) -> Result<()>;
}

/// Request body sent to the catalog
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PublishRequest<'a> {
    environment: &'a str,
    api: &'a ApiDescriptor,
}

/// Publishes descriptors over HTTP
#[derive(Debug, Clone)]
pub struct HttpCatalogPublisher {
    client: Client,
    config: CatalogConfig,
}

impl HttpCatalogPublisher {
    /// Create a new publisher with the given configuration
    pub fn new(config: CatalogConfig) -> Result<Self> {
        url::Url::parse(&config.publish_url).map_err(|e| {
            DiscoveryError::config(format!(
                "Invalid catalog publish URL '{}': {}",
                config.publish_url, e
            ))
        })?;

        let client = Client::builder().timeout(config.request_timeout()).build().map_err(|e| {
            DiscoveryError::config_with_source("Failed to build catalog HTTP client", Box::new(e))
        })?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl CatalogPublisher for HttpCatalogPublisher {
    #[instrument(
        skip(self, descriptor),
        fields(external_id = %descriptor.external_id, checksum = ?descriptor.checksum()),
        name = "catalog_publish"
    )]
    async fn publish(&self, descriptor: &ApiDescriptor) -> Result<()> {
        let body = PublishRequest { environment: &self.config.environment, api: descriptor };

        let mut request = self.client.post(&self.config.publish_url).json(&body);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DiscoveryError::http(e, format!("publishing {}", descriptor.external_id)))?;

        let status = response.status();
        debug!(status = %status, "Catalog responded");

        if !status.is_success() {
            let error_text =
                response.text().await.unwrap_or_else(|_| "<unable to read error>".to_string());
            trace!("Error response:\n{}", error_text);
            return Err(DiscoveryError::publish(
                format!("catalog rejected {}: {}", descriptor.external_id, error_text),
                Some(status.as_u16()),
            ));
        }

        Ok(())
    }
}
