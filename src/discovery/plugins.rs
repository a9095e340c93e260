//! Plugin resolution
//!
//! The plugin inventory is fetched once per pass and shared read-only by every
//! route worker. For a route/service pair the resolver keeps the plugins that
//! apply to it and picks one per plugin name by attachment specificity:
//! route+service > route > service > global. Equal specificity resolves to
//! the plugin seen last in inventory order.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::domain::{
    ApiKeyLocation, EndpointDefinition, OAuthFlows, Plugin, PluginKind, Protocol, RouteId,
    SecurityScheme, ServiceId,
};
use crate::errors::{DiscoveryError, Result};

/// Credential definition name for API key access
pub const CREDENTIAL_API_KEY: &str = "api-key";
/// Credential definition name for OAuth client secrets
pub const CREDENTIAL_OAUTH: &str = "oauth-secret";
/// Credential definition name for HTTP basic access
pub const CREDENTIAL_BASIC: &str = "http-basic";
/// Access definition name used when an ACL plugin governs the route
pub const ACCESS_ACL: &str = "kong-acl";

const DEFAULT_API_KEY_NAME: &str = "apikey";
const OAUTH_AUTHORIZE_PATH: &str = "/oauth2/authorize";
const OAUTH_TOKEN_PATH: &str = "/oauth2/token";

/// Effective plugins keyed by plugin name
pub type EffectivePlugins = BTreeMap<String, Plugin>;

/// Resolves effective plugins against one pass's plugin inventory
#[derive(Debug, Clone, Default)]
pub struct PluginResolver {
    inventory: Vec<Plugin>,
}

impl PluginResolver {
    pub fn new(inventory: Vec<Plugin>) -> Self {
        Self { inventory }
    }

    pub fn inventory(&self) -> &[Plugin] {
        &self.inventory
    }

    /// The single effective plugin per name for a route/service pair
    pub fn effective(&self, route_id: &RouteId, service_id: &ServiceId) -> EffectivePlugins {
        let mut effective = EffectivePlugins::new();

        let applicable = self.inventory.iter().filter(|plugin| {
            plugin.route.as_ref().map_or(true, |r| r == route_id)
                && plugin.service.as_ref().map_or(true, |s| s == service_id)
        });

        for plugin in applicable {
            match effective.get(&plugin.name) {
                Some(current) if current.scope() > plugin.scope() => {}
                _ => {
                    effective.insert(plugin.name.clone(), plugin.clone());
                }
            }
        }

        debug!(
            route_id = %route_id,
            service_id = %service_id,
            plugins = ?effective.keys().collect::<Vec<_>>(),
            "Resolved effective plugins"
        );

        effective
    }
}

/// Check that an enabled, globally scoped ACL plugin exists.
///
/// Skipped entirely when `acl_required` is false.
pub fn require_global_acl(inventory: &[Plugin], acl_required: bool) -> Result<()> {
    if !acl_required {
        return Ok(());
    }

    let found = inventory
        .iter()
        .any(|plugin| plugin.kind == PluginKind::Acl && plugin.enabled && plugin.is_global());

    if found {
        Ok(())
    } else {
        Err(DiscoveryError::precondition(
            "No enabled global acl plugin found on the gateway; \
             configure one or set discovery.acl_required=false",
        ))
    }
}

/// Security annotations derived from a route's effective plugins
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteSecurity {
    pub schemes: Vec<SecurityScheme>,
    pub credential_definitions: Vec<String>,
    pub access_definition: Option<String>,
}

impl RouteSecurity {
    /// Map effective plugins to security schemes and credential names.
    ///
    /// Disabled plugins contribute nothing. OAuth flows are only synthesized
    /// when the route has an HTTPS endpoint.
    pub fn from_plugins(plugins: &EffectivePlugins, endpoints: &[EndpointDefinition]) -> Self {
        let mut security = Self::default();

        for plugin in plugins.values().filter(|p| p.enabled) {
            match &plugin.kind {
                PluginKind::Acl => {
                    security.access_definition = Some(ACCESS_ACL.to_string());
                }
                PluginKind::KeyAuth => {
                    security.schemes.push(api_key_scheme(plugin));
                    security.credential_definitions.push(CREDENTIAL_API_KEY.to_string());
                }
                PluginKind::BasicAuth => {
                    security.schemes.push(SecurityScheme::Basic);
                    security.credential_definitions.push(CREDENTIAL_BASIC.to_string());
                }
                PluginKind::OAuth2 => {
                    match oauth_flows(plugin, endpoints) {
                        Some(flows) => security.schemes.push(SecurityScheme::OAuth2 { flows }),
                        None => debug!(
                            plugin_id = %plugin.id,
                            "No HTTPS endpoint for route; omitting OAuth metadata"
                        ),
                    }
                    security.credential_definitions.push(CREDENTIAL_OAUTH.to_string());
                }
                PluginKind::Other(_) => {}
            }
        }

        security
    }
}

fn api_key_scheme(plugin: &Plugin) -> SecurityScheme {
    let name = plugin
        .config_strings("key_names")
        .into_iter()
        .next()
        .unwrap_or_else(|| DEFAULT_API_KEY_NAME.to_string());

    let in_header = plugin.config.get("key_in_header").and_then(Value::as_bool).unwrap_or(true);
    let location = if !in_header && plugin.config_flag("key_in_query") {
        ApiKeyLocation::Query
    } else {
        ApiKeyLocation::Header
    };

    SecurityScheme::ApiKey { name, location }
}

fn oauth_flows(plugin: &Plugin, endpoints: &[EndpointDefinition]) -> Option<OAuthFlows> {
    let https = endpoints.iter().find(|e| e.protocol == Protocol::Https)?;
    let base = https.url();

    Some(OAuthFlows {
        authorization_url: format!("{}{}", base, OAUTH_AUTHORIZE_PATH),
        token_url: format!("{}{}", base, OAUTH_TOKEN_PATH),
        scopes: plugin.config_strings("scopes").into_iter().map(|s| (s, String::new())).collect(),
        authorization_code: plugin.config_flag("enable_authorization_code"),
        client_credentials: plugin.config_flag("enable_client_credentials"),
        implicit: plugin.config_flag("enable_implicit_grant"),
        password: plugin.config_flag("enable_password_grant"),
    })
}
