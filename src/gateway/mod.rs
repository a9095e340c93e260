//! # Gateway Admin Client
//!
//! The discovery agent reads everything it knows about the gateway through
//! [`GatewayAdminClient`]. [`KongAdminClient`] implements it against the Kong
//! Admin API; tests substitute in-memory implementations.

pub mod kong;
pub mod wire;

pub use kong::KongAdminClient;

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::{Plugin, Route, Service, ServiceId};
use crate::errors::Result;

/// A document object stored in the developer portal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalFile {
    pub path: String,
}

/// Where a specification fetch should go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecLocator {
    /// A developer-portal document, by path
    PortalFile(String),
    /// An absolute URL, typically on a service backend
    Url(String),
}

impl std::fmt::Display for SpecLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpecLocator::PortalFile(path) => write!(f, "portal:{}", path),
            SpecLocator::Url(url) => write!(f, "{}", url),
        }
    }
}

/// Read access to the gateway's configuration
///
/// Implementations must be Send + Sync; one instance is shared by every
/// concurrent unit of a discovery pass.
#[async_trait]
pub trait GatewayAdminClient: Send + Sync {
    /// List every service registered with the gateway
    async fn list_services(&self) -> Result<Vec<Service>>;

    /// List the routes attached to one service
    async fn list_routes_for_service(&self, service_id: &ServiceId) -> Result<Vec<Route>>;

    /// List every plugin on the gateway, regardless of scope
    async fn list_plugins(&self) -> Result<Vec<Plugin>>;

    /// List developer-portal documents associated with a service
    async fn list_portal_files(&self, service_id: &ServiceId) -> Result<Vec<PortalFile>>;

    /// Fetch raw specification bytes.
    ///
    /// Returns `Ok(None)` when the locator answers with anything but a
    /// successful response, and an error only for transport failures.
    async fn fetch_spec(&self, locator: &SpecLocator, timeout: Duration)
        -> Result<Option<Vec<u8>>>;
}
