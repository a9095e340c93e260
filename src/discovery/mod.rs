//! # Discovery
//!
//! The discovery core: endpoint derivation, plugin resolution, specification
//! acquisition, change detection, descriptor assembly and the orchestrator
//! that ties them together.

pub mod agent;
pub mod cache;
pub mod descriptor;
pub mod endpoints;
pub mod plugins;
pub mod spec;

pub use agent::{DiscoveryAgent, PassSummary};
pub use cache::{checksum, CacheEntry, ChangeCache};
pub use descriptor::{build_descriptor, DescriptorParts};
pub use endpoints::{derive_endpoints, EndpointSettings};
pub use plugins::{require_global_acl, EffectivePlugins, PluginResolver, RouteSecurity};
pub use spec::{parse_spec, SpecChain, SpecSource};
