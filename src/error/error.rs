//! Error types and handling for nodescout

use thiserror::Error;

/// Result type alias for nodescout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Main error type for nodescout
#[derive(Error, Debug)]
pub enum ScoutError {
    /// Configuration errors (invalid values, contract violations at construction time)
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Remote capability-host errors (transport failures, unexpected statuses)
    #[error("Remote host error{}: {message}", status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    Remote { status: Option<u16>, message: String },

    /// Package registry errors
    #[error("Package registry error: {message}")]
    Registry { message: String },

    /// Cache errors (refresh failures and similar)
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// Tool selection errors
    #[error("Selection error: {message}")]
    Selection { message: String },

    /// Persistent store errors
    #[error("Store error: {message}")]
    Store { message: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP client errors
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Invalid key pattern
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// Generic errors
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ScoutError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a remote host error carrying the HTTP status, if any
    pub fn remote<S: Into<String>>(status: Option<u16>, message: S) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    /// Create a package registry error
    pub fn registry<S: Into<String>>(message: S) -> Self {
        Self::Registry {
            message: message.into(),
        }
    }

    /// Create a cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Create a selection error
    pub fn selection<S: Into<String>>(message: S) -> Self {
        Self::Selection {
            message: message.into(),
        }
    }

    /// Create a store error
    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Whether this error is a transient remote failure ("unknown, try later")
    pub fn is_transient(&self) -> bool {
        match self {
            ScoutError::Remote { status: None, .. } => true,
            ScoutError::Remote { status: Some(code), .. } => *code == 429 || *code >= 500,
            ScoutError::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().map(|s| s.is_server_error()).unwrap_or(true)
            }
            ScoutError::Io(_) => true,
            _ => false,
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            ScoutError::Config { .. } => "config",
            ScoutError::Remote { .. } => "remote",
            ScoutError::Registry { .. } => "registry",
            ScoutError::Cache { .. } => "cache",
            ScoutError::Selection { .. } => "selection",
            ScoutError::Store { .. } => "store",
            ScoutError::Io(_) => "io",
            ScoutError::Serde(_) => "serialization",
            ScoutError::Yaml(_) => "yaml",
            ScoutError::Http(_) => "http",
            ScoutError::Url(_) => "url",
            ScoutError::Pattern(_) => "pattern",
            ScoutError::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ScoutError::remote(Some(503), "unavailable").is_transient());
        assert!(ScoutError::remote(Some(429), "slow down").is_transient());
        assert!(ScoutError::remote(None, "connection reset").is_transient());
        assert!(!ScoutError::remote(Some(401), "unauthorized").is_transient());
        assert!(!ScoutError::config("bad batch size").is_transient());
    }

    #[test]
    fn test_display_includes_status() {
        let err = ScoutError::remote(Some(500), "boom");
        assert_eq!(err.to_string(), "Remote host error (500): boom");
        let err = ScoutError::remote(None, "reset");
        assert_eq!(err.to_string(), "Remote host error: reset");
        assert_eq!(err.category(), "remote");
    }
}
