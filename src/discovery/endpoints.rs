//! Endpoint derivation
//!
//! Expands a route's host/path/protocol lists into the endpoints a consumer
//! can actually call, gated by which proxy ports are enabled.

use crate::config::ProxyConfig;
use crate::domain::{EndpointDefinition, Protocol, Route};

/// Proxy settings the deriver needs, resolved once from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSettings {
    pub default_host: String,
    pub base_path: String,
    /// `None` when HTTP is disabled
    pub http_port: Option<u16>,
    /// `None` when HTTPS is disabled
    pub https_port: Option<u16>,
}

impl EndpointSettings {
    fn port_for(&self, protocol: Protocol) -> Option<u16> {
        match protocol {
            Protocol::Http => self.http_port,
            Protocol::Https => self.https_port,
        }
    }
}

impl From<&ProxyConfig> for EndpointSettings {
    fn from(config: &ProxyConfig) -> Self {
        Self {
            default_host: config.host.clone(),
            base_path: config.base_path.trim_end_matches('/').to_string(),
            http_port: config.http.active(),
            https_port: config.https.active(),
        }
    }
}

/// Derive the reachable endpoints of a route.
///
/// Explicit route hosts are used as-is; the configured base path is only
/// prepended when falling back to the default host. Protocols the route
/// declares but configuration disables, and protocols other than http/https,
/// produce nothing. The result is sorted and free of duplicates.
pub fn derive_endpoints(route: &Route, settings: &EndpointSettings) -> Vec<EndpointDefinition> {
    let protocols: Vec<(Protocol, u16)> = route
        .protocols
        .iter()
        .filter_map(|p| p.parse::<Protocol>().ok())
        .filter_map(|p| settings.port_for(p).map(|port| (p, port)))
        .collect();

    if protocols.is_empty() {
        return Vec::new();
    }

    let empty_path = [String::new()];
    let paths: &[String] = if route.paths.is_empty() { &empty_path } else { &route.paths };

    let hosts: Vec<(&str, &str)> = if route.hosts.is_empty() {
        vec![(settings.default_host.as_str(), settings.base_path.as_str())]
    } else {
        route.hosts.iter().map(|host| (host.as_str(), "")).collect()
    };

    let mut endpoints = Vec::with_capacity(hosts.len() * paths.len() * protocols.len());
    for (host, prefix) in hosts {
        for path in paths {
            let base_path = format!("{}{}", prefix, path);
            for (protocol, port) in &protocols {
                endpoints.push(EndpointDefinition {
                    host: host.to_string(),
                    port: *port,
                    protocol: *protocol,
                    base_path: base_path.clone(),
                });
            }
        }
    }

    endpoints.sort();
    endpoints.dedup();
    endpoints
}

/// Whether any endpoint is reachable over HTTPS
pub fn has_https(endpoints: &[EndpointDefinition]) -> bool {
    endpoints.iter().any(|e| e.protocol == Protocol::Https)
}
