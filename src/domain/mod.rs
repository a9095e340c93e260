//! Domain layer
//!
//! Pure domain entities of the discovery agent with zero infrastructure
//! dependencies. Gateway entities (services, routes, plugins) are read-only
//! snapshots taken once per discovery pass; descriptors are what gets
//! checksummed and published.
//!
//! ## Module Organization
//!
//! - `id`: Type-safe gateway identifiers with NewType pattern
//! - `service`: Services and routes
//! - `plugin`: Plugins, their kinds and attachment scopes
//! - `endpoint`: Externally reachable endpoints
//! - `spec`: Acquired specification documents
//! - `descriptor`: The publishable API descriptor

pub mod descriptor;
pub mod endpoint;
pub mod id;
pub mod plugin;
pub mod service;
pub mod spec;

pub use descriptor::{
    ApiDescriptor, ApiKeyLocation, OAuthFlows, PluginSnapshot, SecurityScheme, DETAIL_CHECKSUM,
    DETAIL_ROUTE_ID, DETAIL_SERVICE_ID,
};
pub use endpoint::{EndpointDefinition, Protocol};
pub use id::{PluginId, RouteId, ServiceId};
pub use plugin::{Plugin, PluginKind, PluginScope};
pub use service::{Route, Service};
pub use spec::{SpecDocument, SpecType};
