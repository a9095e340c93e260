//! Specification sources
//!
//! Each source answers "do you have a document for this service?". Content
//! that fails to parse counts as no document, so the chain moves on.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::parser::parse_spec;
use crate::domain::{Service, SpecDocument};
use crate::errors::{DiscoveryError, Result};
use crate::gateway::{GatewayAdminClient, SpecLocator};

/// Tag prefix naming a specification file under the local root
pub const LOCAL_SPEC_TAG_PREFIX: &str = "spec_local_";

/// A place a service's specification may be found
#[async_trait]
pub trait SpecSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Look for a document. `Ok(None)` means this source has nothing.
    async fn acquire(&self, service: &Service) -> Result<Option<SpecDocument>>;
}

fn accept(source: &str, locator: &str, raw: Vec<u8>) -> Option<SpecDocument> {
    match parse_spec(&raw) {
        Ok(doc) => {
            debug!(source, locator, spec_type = %doc.spec_type, "Accepted specification");
            Some(doc)
        }
        Err(e) => {
            debug!(source, locator, error = %e, "Content is not a supported specification");
            None
        }
    }
}

/// Files under a local directory, named by a `spec_local_<file>` service tag
#[derive(Debug, Clone)]
pub struct LocalDirectorySource {
    root: PathBuf,
}

impl LocalDirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a tag suffix to a path under the root, refusing escapes
    fn resolve(&self, file: &str) -> Option<PathBuf> {
        let relative = Path::new(file);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return None;
        }
        Some(self.root.join(relative))
    }
}

#[async_trait]
impl SpecSource for LocalDirectorySource {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn acquire(&self, service: &Service) -> Result<Option<SpecDocument>> {
        let Some(file) = service.tag_suffix(LOCAL_SPEC_TAG_PREFIX) else {
            return Ok(None);
        };

        let Some(path) = self.resolve(file) else {
            warn!(service_id = %service.id, file, "Ignoring local specification outside the spec root");
            return Ok(None);
        };

        match tokio::fs::read(&path).await {
            Ok(raw) => Ok(accept(self.name(), &path.display().to_string(), raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(service_id = %service.id, path = %path.display(), "Local specification not found");
                Ok(None)
            }
            Err(source) => Err(DiscoveryError::Io {
                source,
                context: format!("reading {}", path.display()),
            }),
        }
    }
}

/// Documents stored in the gateway's developer portal
pub struct DevPortalSource {
    client: Arc<dyn GatewayAdminClient>,
    timeout: Duration,
}

impl DevPortalSource {
    pub fn new(client: Arc<dyn GatewayAdminClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl SpecSource for DevPortalSource {
    fn name(&self) -> &'static str {
        "dev_portal"
    }

    async fn acquire(&self, service: &Service) -> Result<Option<SpecDocument>> {
        let files = self.client.list_portal_files(&service.id).await?;
        let Some(file) = files.into_iter().next() else {
            return Ok(None);
        };

        let locator = SpecLocator::PortalFile(file.path);
        let raw = self.client.fetch_spec(&locator, self.timeout).await?;
        Ok(raw.and_then(|raw| accept(self.name(), &locator.to_string(), raw)))
    }
}

/// Well-known specification paths probed on the service's backend
pub struct BackendProbeSource {
    client: Arc<dyn GatewayAdminClient>,
    url_paths: Vec<String>,
    timeout: Duration,
}

impl BackendProbeSource {
    pub fn new(client: Arc<dyn GatewayAdminClient>, url_paths: Vec<String>, timeout: Duration) -> Self {
        Self { client, url_paths, timeout }
    }
}

#[async_trait]
impl SpecSource for BackendProbeSource {
    fn name(&self) -> &'static str {
        "backend_probe"
    }

    async fn acquire(&self, service: &Service) -> Result<Option<SpecDocument>> {
        if self.url_paths.is_empty() {
            return Ok(None);
        }
        let Some(backend) = service.backend_url() else {
            return Ok(None);
        };

        for suffix in &self.url_paths {
            let locator = SpecLocator::Url(format!("{}{}", backend, suffix));
            match self.client.fetch_spec(&locator, self.timeout).await {
                Ok(Some(raw)) => {
                    if let Some(doc) = accept(self.name(), &locator.to_string(), raw) {
                        return Ok(Some(doc));
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    debug!(service_id = %service.id, locator = %locator, error = %e, "Probe failed");
                }
            }
        }

        Ok(None)
    }
}

/// Placeholder document for services without a structured specification
#[derive(Debug, Clone, Default)]
pub struct UnstructuredSource;

#[async_trait]
impl SpecSource for UnstructuredSource {
    fn name(&self) -> &'static str {
        "unstructured"
    }

    async fn acquire(&self, service: &Service) -> Result<Option<SpecDocument>> {
        Ok(Some(SpecDocument::unstructured(
            service.name.clone(),
            format!("Unstructured API for gateway service {}", service.name),
        )))
    }
}
