//! HTTP client for the Kong Admin API

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument, trace};
use url::Url;

use super::wire::{FileRecord, Page, PluginRecord, RouteRecord, ServiceRecord};
use super::{GatewayAdminClient, PortalFile, SpecLocator};
use crate::config::GatewayConfig;
use crate::domain::{Plugin, Route, Service, ServiceId};
use crate::errors::{DiscoveryError, ErrorContext, Result};

/// Header carrying the admin API token
const ADMIN_TOKEN_HEADER: &str = "kong-admin-token";

/// Client for the Kong Admin API
#[derive(Debug, Clone)]
pub struct KongAdminClient {
    client: Client,
    base_url: Url,
    page_size: u32,
}

impl KongAdminClient {
    /// Create a new admin client.
    ///
    /// Fails when the admin URL does not parse or the HTTP client cannot be
    /// built; both are fatal for the agent.
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let base_url = Url::parse(&config.admin_url).map_err(|e| {
            DiscoveryError::config(format!("Invalid admin URL '{}': {}", config.admin_url, e))
        })?;

        let mut headers = HeaderMap::new();
        if let Some(token) = &config.admin_token {
            let value = HeaderValue::from_str(token)
                .map_err(|e| DiscoveryError::config(format!("Invalid admin token: {}", e)))?;
            headers.insert(HeaderName::from_static(ADMIN_TOKEN_HEADER), value);
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| {
                DiscoveryError::config_with_source("Failed to build admin HTTP client", Box::new(e))
            })?;

        Ok(Self { client, base_url, page_size: config.page_size })
    }

    fn url(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{}{}", base, path))
            .map_err(|e| DiscoveryError::internal(format!("Invalid admin path '{}': {}", path, e)))
    }

    /// Send a GET request and deserialize the JSON response
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| DiscoveryError::http(e, format!("GET {}", url.path())))?;

        Self::handle_response(response).await
    }

    /// Check the status and deserialize the JSON body
    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        let path = response.url().path().to_string();

        if !status.is_success() {
            let error_text =
                response.text().await.unwrap_or_else(|_| "<unable to read error>".to_string());
            trace!(path = %path, "Error response:\n{}", error_text);
            return Err(DiscoveryError::gateway(
                format!("GET {} failed: {}", path, error_text),
                status.as_u16(),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| DiscoveryError::http(e, format!("reading body of {}", path)))?;

        serde_json::from_slice(&body).map_err(|source| DiscoveryError::Serialization {
            source,
            context: format!("decoding response of {}", path),
        })
    }

    /// Follow the `offset` cursor until every page of a listing is read
    async fn list_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut url = self.url(path)?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("size", &self.page_size.to_string());
                if let Some(offset) = &offset {
                    query.append_pair("offset", offset);
                }
            }

            let page: Page<T> = self.get_json(url).await?;
            items.extend(page.data);

            match page.offset {
                Some(next) if !next.is_empty() => offset = Some(next),
                _ => break,
            }
        }

        Ok(items)
    }

    async fn fetch_bytes(&self, url: Url, timeout: Duration) -> Result<Option<Vec<u8>>> {
        debug!(url = %url, timeout_ms = timeout.as_millis() as u64, "Fetching specification");
        let response = self.client.get(url.clone()).timeout(timeout).send().await.map_err(|e| {
            if e.is_timeout() {
                DiscoveryError::timeout(format!("GET {}", url), timeout.as_millis() as u64)
            } else {
                DiscoveryError::http(e, format!("GET {}", url))
            }
        })?;

        if response.status() != StatusCode::OK {
            debug!(url = %url, status = %response.status(), "Specification not available");
            return Ok(None);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| DiscoveryError::http(e, format!("reading body of {}", url)))?;
        Ok(Some(body.to_vec()))
    }
}

#[async_trait]
impl GatewayAdminClient for KongAdminClient {
    #[instrument(skip(self), name = "kong_list_services")]
    async fn list_services(&self) -> Result<Vec<Service>> {
        let records: Vec<ServiceRecord> =
            self.list_all("/services").await.context("listing services")?;
        Ok(records.into_iter().map(Service::from).collect())
    }

    #[instrument(skip(self), fields(service_id = %service_id), name = "kong_list_routes")]
    async fn list_routes_for_service(&self, service_id: &ServiceId) -> Result<Vec<Route>> {
        let path = format!("/services/{}/routes", service_id);
        let records: Vec<RouteRecord> = self
            .list_all(&path)
            .await
            .with_context(|| format!("listing routes of service {}", service_id))?;
        Ok(records.into_iter().map(Route::from).collect())
    }

    #[instrument(skip(self), name = "kong_list_plugins")]
    async fn list_plugins(&self) -> Result<Vec<Plugin>> {
        let records: Vec<PluginRecord> =
            self.list_all("/plugins").await.context("listing plugins")?;
        Ok(records.into_iter().map(Plugin::from).collect())
    }

    #[instrument(skip(self), fields(service_id = %service_id), name = "kong_list_portal_files")]
    async fn list_portal_files(&self, service_id: &ServiceId) -> Result<Vec<PortalFile>> {
        let mut url = self.url("/files")?;
        url.query_pairs_mut().append_pair("tags", service_id.as_str());

        let page: Page<FileRecord> = self.get_json(url).await?;
        Ok(page.data.into_iter().map(|file| PortalFile { path: file.path }).collect())
    }

    async fn fetch_spec(
        &self,
        locator: &SpecLocator,
        timeout: Duration,
    ) -> Result<Option<Vec<u8>>> {
        match locator {
            SpecLocator::Url(raw) => {
                let url = Url::parse(raw).map_err(|e| {
                    DiscoveryError::validation(format!("Invalid specification URL '{}': {}", raw, e))
                })?;
                self.fetch_bytes(url, timeout).await
            }
            SpecLocator::PortalFile(path) => {
                let url = self.url(&format!("/files/{}", path.trim_start_matches('/')))?;
                let file: FileRecord = match tokio::time::timeout(timeout, self.get_json(url)).await
                {
                    Ok(Ok(file)) => file,
                    Ok(Err(DiscoveryError::Gateway { status: 404, .. })) => return Ok(None),
                    Ok(Err(e)) => return Err(e),
                    Err(_) => {
                        return Err(DiscoveryError::timeout(
                            format!("portal file {}", path),
                            timeout.as_millis() as u64,
                        ))
                    }
                };
                Ok(file.contents.map(String::into_bytes))
            }
        }
    }
}
