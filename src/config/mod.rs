//! # Configuration Management
//!
//! Layered configuration for the discovery agent: built-in defaults, then an
//! optional YAML/TOML/JSON file, then `DISCOVERY__SECTION__KEY` environment
//! variables. The merged result is validated before it is handed out.

pub mod settings;

pub use settings::{
    AgentConfig, CatalogConfig, DiscoveryConfig, GatewayConfig, ObservabilityConfig, PortConfig,
    ProxyConfig, SpecConfig,
};

use std::path::Path;

use crate::errors::Result;

/// Prefix of environment variables overriding configuration values
pub const ENV_PREFIX: &str = "DISCOVERY";

impl AgentConfig {
    /// Load configuration from an optional file plus the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: Self = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("spec.url_paths")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;

        tracing::debug!(path = ?path, "Loaded agent configuration");

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }
}
