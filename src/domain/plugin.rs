//! Plugin Domain Types
//!
//! A plugin is a gateway-level policy attachment scoped globally, to a
//! service, to a route, or to both. The plugin name decides its kind; the kind
//! is resolved once when the plugin is loaded so downstream code matches on
//! [`PluginKind`] instead of comparing names.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::id::{PluginId, RouteId, ServiceId};

/// Plugin kinds the discovery agent gives meaning to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginKind {
    /// Consumer-group access control (`acl`)
    Acl,
    /// API key authentication (`key-auth`)
    KeyAuth,
    /// HTTP basic authentication (`basic-auth`)
    BasicAuth,
    /// OAuth 2.0 provider (`oauth2`)
    OAuth2,
    /// Any other plugin; carried for change detection only
    Other(String),
}

impl PluginKind {
    /// Resolve the kind from the gateway's plugin name
    pub fn from_name(name: &str) -> Self {
        match name {
            "acl" => Self::Acl,
            "key-auth" => Self::KeyAuth,
            "basic-auth" => Self::BasicAuth,
            "oauth2" => Self::OAuth2,
            other => Self::Other(other.to_string()),
        }
    }

    /// Gateway plugin name for this kind
    pub fn as_str(&self) -> &str {
        match self {
            Self::Acl => "acl",
            Self::KeyAuth => "key-auth",
            Self::BasicAuth => "basic-auth",
            Self::OAuth2 => "oauth2",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Attachment scope of a plugin, ordered from least to most specific
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginScope {
    /// Attached to neither a route nor a service
    Global,
    Service,
    Route,
    RouteAndService,
}

/// A plugin instance as configured on the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plugin {
    pub id: PluginId,
    pub name: String,
    pub kind: PluginKind,
    pub enabled: bool,
    pub route: Option<RouteId>,
    pub service: Option<ServiceId>,
    /// Type-specific configuration payload
    #[serde(default)]
    pub config: Value,
}

impl Plugin {
    /// Create a plugin, resolving its kind from the name
    pub fn new(id: impl Into<PluginId>, name: impl Into<String>, enabled: bool) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            kind: PluginKind::from_name(&name),
            name,
            enabled,
            route: None,
            service: None,
            config: Value::Object(Default::default()),
        }
    }

    /// Attach the plugin to a route
    pub fn on_route(mut self, route: impl Into<RouteId>) -> Self {
        self.route = Some(route.into());
        self
    }

    /// Attach the plugin to a service
    pub fn on_service(mut self, service: impl Into<ServiceId>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Replace the configuration payload
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    pub fn scope(&self) -> PluginScope {
        match (&self.route, &self.service) {
            (Some(_), Some(_)) => PluginScope::RouteAndService,
            (Some(_), None) => PluginScope::Route,
            (None, Some(_)) => PluginScope::Service,
            (None, None) => PluginScope::Global,
        }
    }

    pub fn is_global(&self) -> bool {
        self.scope() == PluginScope::Global
    }

    /// String list from the configuration payload, empty when absent
    pub fn config_strings(&self, key: &str) -> Vec<String> {
        self.config
            .get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default()
    }

    /// Boolean flag from the configuration payload
    pub fn config_flag(&self, key: &str) -> bool {
        self.config.get(key).and_then(Value::as_bool).unwrap_or(false)
    }
}
