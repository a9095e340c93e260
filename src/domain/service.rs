//! Service and Route Domain Types
//!
//! Read-only snapshots of the gateway's upstream services and the routes that
//! expose them. Both are fetched fresh on every discovery pass.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::id::{RouteId, ServiceId};

/// An upstream backend registered with the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    /// Upstream host
    pub host: Option<String>,
    /// Upstream protocol (`http`, `https`, `grpc`, ...)
    pub protocol: Option<String>,
    pub port: Option<u16>,
    /// Upstream path prefix
    pub path: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Service {
    /// URL of the upstream backend, when protocol and host are both known
    pub fn backend_url(&self) -> Option<String> {
        let protocol = self.protocol.as_deref().filter(|p| !p.is_empty())?;
        let host = self.host.as_deref().filter(|h| !h.is_empty())?;

        let mut url = format!("{}://{}", protocol, host);
        if let Some(port) = self.port {
            url.push_str(&format!(":{}", port));
        }
        if let Some(path) = self.path.as_deref() {
            url.push_str(path.trim_end_matches('/'));
        }
        Some(url)
    }

    /// Tags as a key/value map for filter evaluation.
    ///
    /// `key:value` tags split on the first colon; bare tags map to themselves.
    pub fn tag_map(&self) -> BTreeMap<String, String> {
        self.tags
            .iter()
            .map(|tag| match tag.split_once(':') {
                Some((key, value)) => (key.to_string(), value.to_string()),
                None => (tag.clone(), tag.clone()),
            })
            .collect()
    }

    /// Suffix of the first tag starting with `prefix`
    pub fn tag_suffix(&self, prefix: &str) -> Option<&str> {
        self.tags.iter().find_map(|tag| tag.strip_prefix(prefix).filter(|s| !s.is_empty()))
    }
}

/// A rule mapping inbound host/path/protocol traffic to a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    pub name: String,
    pub service: Option<ServiceId>,
    /// Empty means "use the configured default host"
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(default)]
    pub paths: Vec<String>,
    /// Declared transport protocols, as the gateway reports them
    #[serde(default)]
    pub protocols: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Route {
    /// Display name, falling back to the id for unnamed routes
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.id.as_str()
        } else {
            &self.name
        }
    }
}
