//! API Descriptor Types
//!
//! The descriptor is the unit of publication and the input to change
//! detection: everything observable about a discovered API lives here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::endpoint::EndpointDefinition;
use super::id::{PluginId, RouteId, ServiceId};
use super::plugin::{Plugin, PluginScope};
use super::spec::SpecType;

/// Agent detail key holding the gateway service id
pub const DETAIL_SERVICE_ID: &str = "serviceId";
/// Agent detail key holding the gateway route id
pub const DETAIL_ROUTE_ID: &str = "routeId";
/// Agent detail key holding the descriptor checksum
pub const DETAIL_CHECKSUM: &str = "checksum";

/// Where an API key is expected on the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    Header,
    Query,
}

/// OAuth 2.0 flow metadata synthesized from an oauth2 plugin
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlows {
    pub authorization_url: String,
    pub token_url: String,
    pub scopes: BTreeMap<String, String>,
    pub authorization_code: bool,
    pub client_credentials: bool,
    pub implicit: bool,
    pub password: bool,
}

/// Authentication scheme advertised for a route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SecurityScheme {
    ApiKey { name: String, location: ApiKeyLocation },
    Basic,
    OAuth2 { flows: OAuthFlows },
}

impl SecurityScheme {
    /// Key the scheme is registered under in a specification document
    pub fn scheme_name(&self) -> &'static str {
        match self {
            SecurityScheme::ApiKey { .. } => "apiKey",
            SecurityScheme::Basic => "basicAuth",
            SecurityScheme::OAuth2 { .. } => "oauth2",
        }
    }
}

/// The state of an effective plugin that change detection cares about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginSnapshot {
    pub id: PluginId,
    pub enabled: bool,
    pub scope: PluginScope,
    pub config: serde_json::Value,
}

impl From<&Plugin> for PluginSnapshot {
    fn from(plugin: &Plugin) -> Self {
        Self {
            id: plugin.id.clone(),
            enabled: plugin.enabled,
            scope: plugin.scope(),
            config: plugin.config.clone(),
        }
    }
}

/// The complete, checksum-able representation of one discovered API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDescriptor {
    /// Stable external id of the API in the catalog
    pub external_id: String,
    pub name: String,
    pub title: String,
    pub description: String,
    pub version: String,
    pub service_id: ServiceId,
    pub service_name: String,
    pub route_id: RouteId,
    pub route_name: String,
    pub spec_type: SpecType,
    /// Specification content with the route's security schemes injected
    pub spec: String,
    pub endpoints: Vec<EndpointDefinition>,
    pub security: Vec<SecurityScheme>,
    pub credential_definitions: Vec<String>,
    pub access_definition: Option<String>,
    /// Effective plugins keyed by plugin name
    pub plugins: BTreeMap<String, PluginSnapshot>,
    pub tags: Vec<String>,
    pub agent_details: BTreeMap<String, String>,
}

impl ApiDescriptor {
    /// Checksum recorded in the agent details, if already computed
    pub fn checksum(&self) -> Option<&str> {
        self.agent_details.get(DETAIL_CHECKSUM).map(String::as_str)
    }
}
