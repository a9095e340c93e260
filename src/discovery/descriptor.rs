//! Descriptor assembly
//!
//! Combines a service/route pair, its acquired specification, derived
//! endpoints and effective plugins into the publishable [`ApiDescriptor`].
//! Security schemes implied by the plugins are written into the document
//! itself: `components.securitySchemes` for OpenAPI 3, `securityDefinitions`
//! for Swagger 2.

use serde_json::{json, Map, Value};

use super::cache::checksum;
use super::plugins::{EffectivePlugins, RouteSecurity};
use crate::domain::{
    ApiDescriptor, ApiKeyLocation, EndpointDefinition, OAuthFlows, PluginSnapshot, Route,
    SecurityScheme, Service, SpecDocument, SpecType, DETAIL_CHECKSUM, DETAIL_ROUTE_ID,
    DETAIL_SERVICE_ID,
};
use crate::errors::Result;

const DEFAULT_VERSION: &str = "1.0.0";

/// Everything known about one route after resolution
#[derive(Debug)]
pub struct DescriptorParts<'a> {
    pub service: &'a Service,
    pub route: &'a Route,
    pub spec: &'a SpecDocument,
    pub endpoints: Vec<EndpointDefinition>,
    pub plugins: &'a EffectivePlugins,
    pub security: RouteSecurity,
}

/// Assemble a descriptor and stamp its checksum into the agent details
pub fn build_descriptor(parts: DescriptorParts<'_>) -> Result<ApiDescriptor> {
    let DescriptorParts { service, route, spec, mut endpoints, plugins, security } = parts;

    endpoints.sort();

    let spec_content = match &spec.document {
        Some(document) => {
            let mut document = document.clone();
            inject_security(&mut document, spec.spec_type, &security.schemes);
            serde_json::to_string(&document)?
        }
        None => String::new(),
    };

    let title = if spec.title.is_empty() { service.name.clone() } else { spec.title.clone() };
    let version =
        if spec.version.is_empty() { DEFAULT_VERSION.to_string() } else { spec.version.clone() };

    let mut tags: Vec<String> = service.tags.iter().chain(route.tags.iter()).cloned().collect();
    tags.sort();
    tags.dedup();

    let mut descriptor = ApiDescriptor {
        external_id: route.id.to_string(),
        name: format!("{}-{}", service.name, route.display_name()),
        title,
        description: spec.description.clone(),
        version,
        service_id: service.id.clone(),
        service_name: service.name.clone(),
        route_id: route.id.clone(),
        route_name: route.display_name().to_string(),
        spec_type: spec.spec_type,
        spec: spec_content,
        endpoints,
        security: security.schemes,
        credential_definitions: security.credential_definitions,
        access_definition: security.access_definition,
        plugins: plugins.iter().map(|(name, p)| (name.clone(), PluginSnapshot::from(p))).collect(),
        tags,
        agent_details: [
            (DETAIL_SERVICE_ID.to_string(), service.id.to_string()),
            (DETAIL_ROUTE_ID.to_string(), route.id.to_string()),
        ]
        .into_iter()
        .collect(),
    };

    let sum = checksum(&descriptor)?;
    descriptor.agent_details.insert(DETAIL_CHECKSUM.to_string(), sum);
    Ok(descriptor)
}

/// Write security schemes into a parsed document, keeping unrelated entries
fn inject_security(document: &mut Value, spec_type: SpecType, schemes: &[SecurityScheme]) {
    if schemes.is_empty() {
        return;
    }

    let Some(root) = document.as_object_mut() else {
        return;
    };

    let target = match spec_type {
        SpecType::OpenApiV3 => {
            object_entry(root, "components").and_then(|c| object_entry(c, "securitySchemes"))
        }
        SpecType::OpenApiV2 => object_entry(root, "securityDefinitions"),
        SpecType::Unstructured => None,
    };
    let Some(target) = target else {
        return;
    };

    for scheme in schemes {
        let definition = match spec_type {
            SpecType::OpenApiV3 => oas3_scheme(scheme),
            _ => oas2_scheme(scheme),
        };
        target.insert(scheme.scheme_name().to_string(), definition);
    }
}

/// Object under `key`, replacing any non-object value found there
fn object_entry<'a>(
    map: &'a mut Map<String, Value>,
    key: &str,
) -> Option<&'a mut Map<String, Value>> {
    let entry = map.entry(key.to_string()).or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    entry.as_object_mut()
}

fn location(location: ApiKeyLocation) -> &'static str {
    match location {
        ApiKeyLocation::Header => "header",
        ApiKeyLocation::Query => "query",
    }
}

fn oas3_scheme(scheme: &SecurityScheme) -> Value {
    match scheme {
        SecurityScheme::ApiKey { name, location: loc } => {
            json!({"type": "apiKey", "name": name, "in": location(*loc)})
        }
        SecurityScheme::Basic => json!({"type": "http", "scheme": "basic"}),
        SecurityScheme::OAuth2 { flows } => {
            let mut out = Map::new();
            if flows.authorization_code {
                out.insert(
                    "authorizationCode".to_string(),
                    json!({
                        "authorizationUrl": flows.authorization_url,
                        "tokenUrl": flows.token_url,
                        "scopes": flows.scopes,
                    }),
                );
            }
            if flows.client_credentials {
                out.insert(
                    "clientCredentials".to_string(),
                    json!({"tokenUrl": flows.token_url, "scopes": flows.scopes}),
                );
            }
            if flows.implicit {
                out.insert(
                    "implicit".to_string(),
                    json!({"authorizationUrl": flows.authorization_url, "scopes": flows.scopes}),
                );
            }
            if flows.password {
                out.insert(
                    "password".to_string(),
                    json!({"tokenUrl": flows.token_url, "scopes": flows.scopes}),
                );
            }
            json!({"type": "oauth2", "flows": out})
        }
    }
}

/// Swagger 2 allows one flow per definition; the first enabled flow wins
/// in the order accessCode, application, implicit, password.
fn oas2_scheme(scheme: &SecurityScheme) -> Value {
    match scheme {
        SecurityScheme::ApiKey { name, location: loc } => {
            json!({"type": "apiKey", "name": name, "in": location(*loc)})
        }
        SecurityScheme::Basic => json!({"type": "basic"}),
        SecurityScheme::OAuth2 { flows } => oas2_oauth(flows),
    }
}

fn oas2_oauth(flows: &OAuthFlows) -> Value {
    let scopes = &flows.scopes;
    if flows.authorization_code {
        json!({
            "type": "oauth2",
            "flow": "accessCode",
            "authorizationUrl": flows.authorization_url,
            "tokenUrl": flows.token_url,
            "scopes": scopes,
        })
    } else if flows.client_credentials {
        json!({"type": "oauth2", "flow": "application", "tokenUrl": flows.token_url, "scopes": scopes})
    } else if flows.implicit {
        json!({
            "type": "oauth2",
            "flow": "implicit",
            "authorizationUrl": flows.authorization_url,
            "scopes": scopes,
        })
    } else {
        json!({"type": "oauth2", "flow": "password", "tokenUrl": flows.token_url, "scopes": scopes})
    }
}
