//! Endpoint Domain Types
//!
//! Externally reachable endpoints of a discovered API.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Transport protocol an endpoint is reachable over
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            other => Err(format!("Unsupported endpoint protocol: {}", other)),
        }
    }
}

/// A resolved (host, port, protocol, base path) tuple for a route
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDefinition {
    pub host: String,
    pub port: u16,
    pub protocol: Protocol,
    pub base_path: String,
}

impl EndpointDefinition {
    /// Full URL of the endpoint
    pub fn url(&self) -> String {
        format!("{}://{}:{}{}", self.protocol, self.host, self.port, self.base_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_parsing_is_case_insensitive() {
        assert_eq!("HTTPS".parse::<Protocol>(), Ok(Protocol::Https));
        assert_eq!("http".parse::<Protocol>(), Ok(Protocol::Http));
        assert!("grpc".parse::<Protocol>().is_err());
    }

    #[test]
    fn endpoint_url() {
        let endpoint = EndpointDefinition {
            host: "api.example.com".to_string(),
            port: 8443,
            protocol: Protocol::Https,
            base_path: "/pets".to_string(),
        };
        assert_eq!(endpoint.url(), "https://api.example.com:8443/pets");
    }
}
