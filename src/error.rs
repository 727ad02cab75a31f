//! biomodels-cache error types

use std::fmt;

use crate::merge::PartialWriteFailure;

/// biomodels-cache error types
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Legitimate negative result. The resolver turns this into `Ok(None)`;
    /// it only escapes from collaborator calls such as file lookups.
    #[error("not found: {0}")]
    NotFound(String),

    // Configuration errors
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    // Storage errors
    /// A persistence tier failed an operation. Downgraded to "try the next
    /// tier" wherever one exists.
    #[error("tier '{tier}' unavailable: {message}")]
    TierUnavailable { tier: String, message: String },

    /// Fan-out write reached some tiers but not others.
    #[error("{0}")]
    PartialWrite(PartialWriteFailure),

    // Remote catalog errors
    #[error("remote catalog unavailable: {message}")]
    RemoteUnavailable {
        message: String,
        /// HTTP status, if the server answered at all.
        status: Option<u16>,
    },

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stable, machine-readable error kind.
///
/// Unlike the `Display` output, these identifiers are part of the public
/// contract and safe to match on from other processes (e.g. CLI JSON output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidConfiguration,
    InvalidQuery,
    TierUnavailable,
    PartialWriteFailure,
    RemoteUnavailable,
    Serialization,
    Io,
}

impl ErrorKind {
    /// Snake-case identifier for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidConfiguration => "invalid_configuration",
            ErrorKind::InvalidQuery => "invalid_query",
            ErrorKind::TierUnavailable => "tier_unavailable",
            ErrorKind::PartialWriteFailure => "partial_write_failure",
            ErrorKind::RemoteUnavailable => "remote_unavailable",
            ErrorKind::Serialization => "serialization",
            ErrorKind::Io => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CacheError {
    /// Shorthand for a [`CacheError::TierUnavailable`].
    pub fn tier(tier: impl Into<String>, message: impl fmt::Display) -> Self {
        CacheError::TierUnavailable {
            tier: tier.into(),
            message: message.to_string(),
        }
    }

    /// Shorthand for a transport-level [`CacheError::RemoteUnavailable`].
    pub fn remote(message: impl Into<String>) -> Self {
        CacheError::RemoteUnavailable {
            message: message.into(),
            status: None,
        }
    }

    /// The stable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CacheError::NotFound(_) => ErrorKind::NotFound,
            CacheError::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
            CacheError::InvalidQuery(_) => ErrorKind::InvalidQuery,
            CacheError::TierUnavailable { .. } => ErrorKind::TierUnavailable,
            CacheError::PartialWrite(_) => ErrorKind::PartialWriteFailure,
            CacheError::RemoteUnavailable { .. } => ErrorKind::RemoteUnavailable,
            CacheError::Json(_) => ErrorKind::Serialization,
            CacheError::Io(_) => ErrorKind::Io,
        }
    }

    /// Whether retrying the same remote call may succeed.
    ///
    /// Transport failures (no status), 429 and 5xx are transient. Everything
    /// else, including `NotFound`, is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            CacheError::RemoteUnavailable { status: None, .. } => true,
            CacheError::RemoteUnavailable {
                status: Some(code), ..
            } => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}

/// Result type alias for biomodels-cache operations
pub type Result<T> = std::result::Result<T, CacheError>;
