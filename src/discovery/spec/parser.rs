//! Specification parsing
//!
//! Candidate content is accepted only if it parses as JSON or YAML and looks
//! like Swagger 2.0 or OpenAPI 3.x. OpenAPI 3 documents are additionally
//! checked against the `openapiv3` model.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::{SpecDocument, SpecType};
use crate::errors::{DiscoveryError, Result};

/// Top-level fields used to classify a document and describe it
#[derive(Debug, Default, Deserialize)]
struct Header {
    openapi: Option<String>,
    swagger: Option<String>,
    #[serde(default)]
    info: Option<InfoHeader>,
}

#[derive(Debug, Default, Deserialize)]
struct InfoHeader {
    title: Option<String>,
    description: Option<String>,
    version: Option<String>,
}

impl Header {
    /// JSON has no plain scalars, so numeric fields are rendered as text
    fn from_json(document: &Value) -> Self {
        let text = |value: Option<&Value>| value.and_then(scalar_text);
        let info = document.get("info");
        Self {
            openapi: text(document.get("openapi")),
            swagger: text(document.get("swagger")),
            info: info.filter(|i| i.is_object()).map(|i| InfoHeader {
                title: text(i.get("title")),
                description: text(i.get("description")),
                version: text(i.get("version")),
            }),
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

/// Parse raw bytes into a specification document
pub fn parse_spec(raw: &[u8]) -> Result<SpecDocument> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| DiscoveryError::spec_parse(format!("Specification is not UTF-8: {}", e)))?;
    let format = if text.trim_start().starts_with('{') { Format::Json } else { Format::Yaml };

    let mut document = decode(text, format)?;

    // YAML plain scalars such as `version: 1.0` keep their source text when
    // read into string fields, but not when decoded into a JSON value
    let header = match format {
        Format::Json => Header::from_json(&document),
        Format::Yaml => serde_yaml::from_str::<Header>(text)
            .map_err(|e| DiscoveryError::spec_parse(format!("Invalid document header: {}", e)))?,
    };

    let spec_type = detect_type(&header, &document)?;
    if spec_type == SpecType::OpenApiV3 {
        let checked = match format {
            Format::Json => {
                serde_json::from_str::<openapiv3::OpenAPI>(text).map_err(|e| e.to_string())
            }
            Format::Yaml => {
                serde_yaml::from_str::<openapiv3::OpenAPI>(text).map_err(|e| e.to_string())
            }
        };
        checked.map_err(|e| {
            DiscoveryError::spec_parse(format!("Invalid OpenAPI 3 document: {}", e))
        })?;
    }

    normalize(&mut document, &header);

    let info = header.info.unwrap_or_default();
    Ok(SpecDocument {
        raw: raw.to_vec(),
        spec_type,
        title: info.title.unwrap_or_default(),
        description: info.description.unwrap_or_default(),
        version: info.version.unwrap_or_default(),
        document: Some(document),
    })
}

fn decode(text: &str, format: Format) -> Result<Value> {
    let value = match format {
        Format::Json => serde_json::from_str::<Value>(text)
            .map_err(|e| DiscoveryError::spec_parse(format!("Invalid JSON: {}", e)))?,
        Format::Yaml => serde_yaml::from_str::<Value>(text)
            .map_err(|e| DiscoveryError::spec_parse(format!("Invalid YAML: {}", e)))?,
    };

    if !value.is_object() {
        return Err(DiscoveryError::spec_parse("Specification is not an object"));
    }
    Ok(value)
}

/// Write the textual header fields back so the published document carries
/// `"1.0"` rather than the number `1.0`
fn normalize(document: &mut Value, header: &Header) {
    let Some(root) = document.as_object_mut() else {
        return;
    };
    for (key, value) in [("openapi", &header.openapi), ("swagger", &header.swagger)] {
        if let Some(text) = value {
            root.insert(key.to_string(), Value::String(text.clone()));
        }
    }

    let (Some(info), Some(Value::Object(target))) = (&header.info, root.get_mut("info")) else {
        return;
    };
    for (key, value) in
        [("title", &info.title), ("description", &info.description), ("version", &info.version)]
    {
        if let Some(text) = value {
            target.insert(key.to_string(), Value::String(text.clone()));
        }
    }
}

fn detect_type(header: &Header, document: &Value) -> Result<SpecType> {
    if let Some(version) = header.openapi.as_deref() {
        if version.starts_with("3.") {
            return Ok(SpecType::OpenApiV3);
        }
        return Err(DiscoveryError::spec_parse(format!("Unsupported OpenAPI version {}", version)));
    }

    if header.swagger.as_deref() == Some("2.0") {
        if document.get("paths").map_or(false, Value::is_object) {
            return Ok(SpecType::OpenApiV2);
        }
        return Err(DiscoveryError::spec_parse("Swagger 2.0 document without paths"));
    }

    Err(DiscoveryError::spec_parse("Not a Swagger or OpenAPI document"))
}
