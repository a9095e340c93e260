//! # Gateway Discovery
//!
//! Discovers the APIs a Kong gateway exposes and publishes them to a remote
//! catalog, republishing only when something observable about an API changes.
//!
//! ## Architecture
//!
//! ```text
//! Gateway Admin API → Discovery Agent → Catalog
//!                          ↓
//!     Tag Filter · Spec Chain · Plugin Resolver · Endpoint Deriver
//!                          ↓
//!                 Change-Detection Cache
//! ```
//!
//! ## Core Components
//!
//! - **Gateway client** ([`gateway`]): services, routes, plugins and raw
//!   specification bytes from the Kong Admin API
//! - **Discovery** ([`discovery`]): the per-pass orchestrator and the pure
//!   pieces it combines into [`domain::ApiDescriptor`]s
//! - **Catalog** ([`catalog`]): publication of finished descriptors
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gateway_discovery::{
//!     AgentConfig, DiscoveryAgent, HttpCatalogPublisher, KongAdminClient, Result,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AgentConfig::from_env()?;
//!     let gateway = Arc::new(KongAdminClient::new(&config.gateway)?);
//!     let publisher = Arc::new(HttpCatalogPublisher::new(config.catalog.clone())?);
//!     let agent = DiscoveryAgent::new(config, gateway, publisher).await?;
//!     agent.run_pass().await?;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod domain;
pub mod errors;
pub mod filter;
pub mod gateway;
pub mod observability;

// Re-export commonly used types and traits
pub use catalog::{CatalogPublisher, HttpCatalogPublisher};
pub use config::AgentConfig;
pub use discovery::{DiscoveryAgent, PassSummary};
pub use errors::{DiscoveryError, Result};
pub use filter::TagFilter;
pub use gateway::{GatewayAdminClient, KongAdminClient};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
