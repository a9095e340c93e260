//! Gateway ID Types with NewType Pattern
//!
//! Type-safe wrappers for the identifiers the gateway assigns to services,
//! routes and plugins, so a route id can never be passed where a service id
//! is expected. Values are opaque strings (Kong hands out UUIDs).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate NewType ID wrappers with all required traits
macro_rules! gateway_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an ID from the string the gateway reported
            pub fn from_string(s: String) -> Self {
                Self(s)
            }

            /// Get the inner string value
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

gateway_id!(
    /// Gateway-assigned identifier of an upstream service
    ServiceId
);

gateway_id!(
    /// Gateway-assigned identifier of a route
    RouteId
);

gateway_id!(
    /// Gateway-assigned identifier of a plugin instance
    PluginId
);
