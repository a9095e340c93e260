//! # Error Types
//!
//! Error types for the discovery agent using `thiserror`.

/// Custom result type for discovery operations
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Main error type for the discovery agent
#[derive(thiserror::Error, Debug)]
pub enum DiscoveryError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String, field: Option<String> },

    /// A startup precondition on the gateway state does not hold
    #[error("Precondition failed: {message}")]
    Precondition { message: String },

    /// The gateway admin API answered with an unexpected status
    #[error("Gateway admin error: {message} (status: {status})")]
    Gateway { message: String, status: u16 },

    /// Transport failures talking to the gateway, a backend or the catalog
    #[error("HTTP error: {context}")]
    Http {
        #[source]
        source: reqwest::Error,
        context: String,
    },

    /// I/O errors with additional context
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {context}")]
    Serialization {
        #[source]
        source: serde_json::Error,
        context: String,
    },

    /// Content could not be recognised as a supported specification format
    #[error("Specification parse error: {message}")]
    SpecParse { message: String },

    /// The catalog rejected a descriptor
    #[error("Publish error: {message}")]
    Publish { message: String, status: Option<u16> },

    /// Timeout errors
    #[error("Operation timed out: {operation} after {duration_ms}ms")]
    Timeout { operation: String, duration_ms: u64 },

    /// Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DiscoveryError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a validation error with field information
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    /// Create a precondition error
    pub fn precondition<S: Into<String>>(message: S) -> Self {
        Self::Precondition { message: message.into() }
    }

    /// Create a gateway admin API error
    pub fn gateway<S: Into<String>>(message: S, status: u16) -> Self {
        Self::Gateway { message: message.into(), status }
    }

    /// Wrap a transport error with context
    pub fn http<S: Into<String>>(source: reqwest::Error, context: S) -> Self {
        Self::Http { source, context: context.into() }
    }

    /// Create a specification parse error
    pub fn spec_parse<S: Into<String>>(message: S) -> Self {
        Self::SpecParse { message: message.into() }
    }

    /// Create a publish error
    pub fn publish<S: Into<String>>(message: S, status: Option<u16>) -> Self {
        Self::Publish { message: message.into(), status }
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(operation: S, duration_ms: u64) -> Self {
        Self::Timeout { operation: operation.into(), duration_ms }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Add context to an error (used by the `ErrorContext` trait)
    pub(crate) fn add_context(&mut self, context: String) {
        match self {
            DiscoveryError::Io { context: ref mut ctx, .. }
            | DiscoveryError::Http { context: ref mut ctx, .. }
            | DiscoveryError::Serialization { context: ref mut ctx, .. } => {
                *ctx = format!("{}: {}", context, ctx);
            }
            DiscoveryError::Gateway { message, .. } | DiscoveryError::Publish { message, .. } => {
                *message = format!("{}: {}", context, message);
            }
            _ => {}
        }
    }

    /// Errors that must stop the agent instead of being retried on the next pass
    pub fn is_fatal(&self) -> bool {
        matches!(self, DiscoveryError::Config { .. } | DiscoveryError::Precondition { .. })
    }

    /// Check if this error should be retried
    pub fn is_retryable(&self) -> bool {
        match self {
            DiscoveryError::Http { .. } => true,
            DiscoveryError::Io { .. } => true,
            DiscoveryError::Timeout { .. } => true,
            DiscoveryError::Gateway { status, .. } => *status >= 500 || *status == 429,
            DiscoveryError::Publish { status, .. } => status.map_or(true, |s| s >= 500),
            _ => false,
        }
    }
}

/// Extension trait for attaching context to fallible discovery operations
pub trait ErrorContext<T> {
    /// Prefix the error (if any) with a static context string
    fn context(self, context: &str) -> Result<T>;

    /// Prefix the error (if any) with a lazily built context string
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T> ErrorContext<T> for Result<T> {
    fn context(self, context: &str) -> Result<T> {
        self.map_err(|mut err| {
            err.add_context(context.to_string());
            err
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|mut err| {
            err.add_context(f());
            err
        })
    }
}

impl From<std::io::Error> for DiscoveryError {
    fn from(error: std::io::Error) -> Self {
        Self::Io { source: error, context: "I/O operation failed".to_string() }
    }
}

impl From<serde_json::Error> for DiscoveryError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization { source: error, context: "JSON serialization failed".to_string() }
    }
}

impl From<reqwest::Error> for DiscoveryError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return Self::timeout(
                error.url().map(|u| u.to_string()).unwrap_or_else(|| "http request".to_string()),
                0,
            );
        }
        Self::Http { source: error, context: "HTTP request failed".to_string() }
    }
}

impl From<config::ConfigError> for DiscoveryError {
    fn from(error: config::ConfigError) -> Self {
        Self::config_with_source("Configuration loading failed", Box::new(error))
    }
}

impl From<validator::ValidationErrors> for DiscoveryError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));
        let message = fields
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::validation(format!("Validation failed: {}", message))
    }
}
