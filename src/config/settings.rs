//! # Configuration Settings
//!
//! Defines the configuration structure for the discovery agent.

use crate::errors::{DiscoveryError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

/// Main agent configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct AgentConfig {
    /// Gateway admin API configuration
    #[validate(nested)]
    pub gateway: GatewayConfig,

    /// Externally visible proxy configuration used to derive endpoints
    #[validate(nested)]
    pub proxy: ProxyConfig,

    /// Specification acquisition configuration
    #[validate(nested)]
    pub spec: SpecConfig,

    /// Discovery loop configuration
    #[validate(nested)]
    pub discovery: DiscoveryConfig,

    /// Catalog publishing configuration
    #[validate(nested)]
    pub catalog: CatalogConfig,

    /// Observability configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl AgentConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(DiscoveryError::from)?;

        self.validate_custom()?;

        Ok(())
    }

    /// Cross-field rules the validator derive cannot express
    fn validate_custom(&self) -> Result<()> {
        if !self.proxy.http.enabled && !self.proxy.https.enabled {
            return Err(DiscoveryError::validation(
                "At least one of the HTTP and HTTPS proxy ports must be enabled",
            ));
        }

        for (field, port) in [("proxy.http", &self.proxy.http), ("proxy.https", &self.proxy.https)]
        {
            if port.enabled && port.port == 0 {
                return Err(DiscoveryError::validation_field(
                    "Enabled proxy port cannot be 0",
                    field,
                ));
            }
        }

        if !self.proxy.base_path.is_empty() && !self.proxy.base_path.starts_with('/') {
            return Err(DiscoveryError::validation_field(
                "Base path must be empty or start with '/'",
                "proxy.base_path",
            ));
        }

        if self.spec.url_paths.iter().any(|p| !p.starts_with('/')) {
            return Err(DiscoveryError::validation_field(
                "Specification URL paths must start with '/'",
                "spec.url_paths",
            ));
        }

        Ok(())
    }
}

/// Gateway admin API configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL of the admin API
    #[validate(length(min = 1, message = "Admin URL cannot be empty"))]
    pub admin_url: String,

    /// Optional token sent as `Kong-Admin-Token`
    pub admin_token: Option<String>,

    /// Request timeout in seconds
    #[validate(range(
        min = 1,
        max = 300,
        message = "Timeout must be between 1 and 300 seconds"
    ))]
    pub request_timeout_secs: u64,

    /// Page size for paginated listings
    #[validate(range(min = 1, max = 1000, message = "Page size must be between 1 and 1000"))]
    pub page_size: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            admin_url: "http://localhost:8001".to_string(),
            admin_token: None,
            request_timeout_secs: 30,
            page_size: 100,
        }
    }
}

impl GatewayConfig {
    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// A proxy listener port that may be switched off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConfig {
    pub port: u16,
    pub enabled: bool,
}

impl PortConfig {
    /// An enabled port
    pub fn enabled(port: u16) -> Self {
        Self { port, enabled: true }
    }

    /// A disabled port
    pub fn disabled() -> Self {
        Self { port: 0, enabled: false }
    }

    /// The port number when enabled
    pub fn active(&self) -> Option<u16> {
        self.enabled.then_some(self.port)
    }
}

/// Proxy configuration used to derive externally reachable endpoints
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ProxyConfig {
    /// Host used for routes that declare no hostnames
    #[validate(length(min = 1, message = "Proxy host cannot be empty"))]
    pub host: String,

    /// Base path prepended to route paths on the default host
    pub base_path: String,

    pub http: PortConfig,

    pub https: PortConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            base_path: String::new(),
            http: PortConfig::enabled(8000),
            https: PortConfig::enabled(8443),
        }
    }
}

/// Specification acquisition configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SpecConfig {
    /// Root directory of the local specification source
    pub local_path: Option<PathBuf>,

    /// Look specifications up in the developer portal
    pub dev_portal_enabled: bool,

    /// Candidate URL suffixes probed on service backends
    pub url_paths: Vec<String>,

    /// Publish routes of services without a structured specification
    pub create_unstructured_api: bool,

    /// Per-attempt timeout for specification fetches
    #[validate(range(
        min = 1,
        max = 120,
        message = "Fetch timeout must be between 1 and 120 seconds"
    ))]
    pub fetch_timeout_secs: u64,
}

impl Default for SpecConfig {
    fn default() -> Self {
        Self {
            local_path: None,
            dev_portal_enabled: false,
            url_paths: Vec::new(),
            create_unstructured_api: false,
            fetch_timeout_secs: 10,
        }
    }
}

impl SpecConfig {
    /// Get fetch timeout as Duration
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Discovery loop configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Tag filter expression evaluated against each service (empty = all)
    pub filter: String,

    /// Require an enabled global ACL plugin before discovery starts
    pub acl_required: bool,

    /// Interval between discovery passes in seconds
    #[validate(range(
        min = 1,
        max = 86400,
        message = "Poll interval must be between 1 second and 24 hours"
    ))]
    pub poll_interval_secs: u64,

    /// Services processed concurrently within a pass
    #[validate(range(min = 1, max = 256, message = "Service concurrency must be between 1 and 256"))]
    pub service_concurrency: usize,

    /// Routes processed concurrently within a service
    #[validate(range(min = 1, max = 256, message = "Route concurrency must be between 1 and 256"))]
    pub route_concurrency: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            filter: String::new(),
            acl_required: true,
            poll_interval_secs: 30,
            service_concurrency: 8,
            route_concurrency: 8,
        }
    }
}

impl DiscoveryConfig {
    /// Get poll interval as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Catalog publishing configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CatalogConfig {
    /// Endpoint descriptors are POSTed to
    #[validate(length(min = 1, message = "Catalog publish URL cannot be empty"))]
    pub publish_url: String,

    /// Optional bearer token
    pub token: Option<String>,

    /// Catalog environment the APIs are published into
    #[validate(length(min = 1, message = "Catalog environment cannot be empty"))]
    pub environment: String,

    /// Request timeout in seconds
    #[validate(range(
        min = 1,
        max = 300,
        message = "Timeout must be between 1 and 300 seconds"
    ))]
    pub request_timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            publish_url: "http://localhost:8080/apis".to_string(),
            token: None,
            environment: "default".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl CatalogConfig {
    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Observability configuration for logging and metrics
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,

    /// Enable metrics collection
    pub enable_metrics: bool,

    /// Metrics server port (0 = disabled)
    pub metrics_port: u16,

    /// Service name attached to metrics
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logging: false,
            enable_metrics: false,
            metrics_port: 9464,
            service_name: "gateway-discovery".to_string(),
        }
    }
}

impl ObservabilityConfig {
    /// Get metrics bind address (None if disabled)
    pub fn metrics_bind_address(&self) -> Option<String> {
        if self.metrics_port == 0 {
            None
        } else {
            Some(format!("0.0.0.0:{}", self.metrics_port))
        }
    }
}
