//! Specification Document Types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource type of an acquired specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecType {
    /// Swagger / OpenAPI 2.0
    OpenApiV2,
    /// OpenAPI 3.x
    OpenApiV3,
    /// Placeholder for services without a machine-readable document
    Unstructured,
}

impl SpecType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecType::OpenApiV2 => "oas2",
            SpecType::OpenApiV3 => "oas3",
            SpecType::Unstructured => "unstructured",
        }
    }
}

impl fmt::Display for SpecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An acquired specification: raw content plus what the parser learned about it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecDocument {
    #[serde(skip)]
    pub raw: Vec<u8>,
    pub spec_type: SpecType,
    /// Parsed document as JSON, `None` for unstructured placeholders
    pub document: Option<serde_json::Value>,
    pub title: String,
    pub description: String,
    pub version: String,
}

impl SpecDocument {
    /// Placeholder document for services without a structured specification
    pub fn unstructured(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            raw: Vec::new(),
            spec_type: SpecType::Unstructured,
            document: None,
            title: title.into(),
            description: description.into(),
            version: "1.0.0".to_string(),
        }
    }
}
