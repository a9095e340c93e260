//! # Structured Logging
//!
//! Subscriber setup and span macros for the discovery agent. Every pass gets
//! a `discovery_pass` span; services and routes processed inside it get
//! `discovery_unit` spans so log lines carry the ids they refer to.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;
use crate::errors::{DiscoveryError, Result};

/// Create a tracing span for one discovery pass
#[macro_export]
macro_rules! discovery_span {
    ($pass_id:expr) => {
        tracing::info_span!(
            "discovery_pass",
            pass_id = %$pass_id,
            services = tracing::field::Empty
        )
    };
    ($pass_id:expr, $($field:tt)*) => {
        tracing::info_span!(
            "discovery_pass",
            pass_id = %$pass_id,
            services = tracing::field::Empty,
            $($field)*
        )
    };
}

/// Create a tracing span for a unit of work (a service or a route) inside a pass
#[macro_export]
macro_rules! unit_span {
    ($kind:expr, $id:expr) => {
        tracing::debug_span!(
            "discovery_unit",
            kind = %$kind,
            id = %$id
        )
    };
    ($kind:expr, $id:expr, $($field:tt)*) => {
        tracing::debug_span!(
            "discovery_unit",
            kind = %$kind,
            id = %$id,
            $($field)*
        )
    };
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Fails if a global
/// subscriber is already installed.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| DiscoveryError::config(format!("Invalid log level '{}': {}", config.log_level, e)))?;

    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json_logging {
        registry.with(fmt::layer().json().with_current_span(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    result.map_err(|e| DiscoveryError::internal(format!("Failed to install subscriber: {}", e)))
}

/// Log configuration at startup
pub fn log_config_info(config: &crate::config::AgentConfig) {
    tracing::info!(
        admin_url = %config.gateway.admin_url,
        proxy_host = %config.proxy.host,
        http_port = ?config.proxy.http.active(),
        https_port = ?config.proxy.https.active(),
        local_spec_path = ?config.spec.local_path,
        dev_portal_enabled = config.spec.dev_portal_enabled,
        spec_url_paths = ?config.spec.url_paths,
        create_unstructured_api = config.spec.create_unstructured_api,
        acl_required = config.discovery.acl_required,
        poll_interval_secs = config.discovery.poll_interval_secs,
        filter = %config.discovery.filter,
        "Discovery agent configuration"
    );
}
