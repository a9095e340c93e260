//! # Error Handling
//!
//! Error handling for the discovery agent. Failures are split into the classes
//! the orchestrator cares about: fatal startup errors, per-pass errors and
//! per-unit errors that are logged and skipped.

pub mod types;

pub use types::{DiscoveryError, ErrorContext, Result};
