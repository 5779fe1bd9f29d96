//! Error types for the wind map crates.

use thiserror::Error;

/// Result type alias using WindError.
pub type WindResult<T> = Result<T, WindError>;

/// Failure of a single provider request for a single site.
///
/// Only `RateLimited` is allowed to abort a fetch cycle. `Network` and
/// `Malformed` are transient: the caller logs them and moves on to the next
/// provider.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("Network error from {provider}: {message}")]
    Network { provider: String, message: String },

    #[error("Rate limited by {provider}: {reason}")]
    RateLimited { provider: String, reason: String },

    #[error("Malformed response from {provider}: {message}")]
    Malformed { provider: String, message: String },

    #[error("No data available for site {0}")]
    NoDataAvailable(String),
}

impl FetchError {
    pub fn network(provider: impl Into<String>, message: impl ToString) -> Self {
        FetchError::Network {
            provider: provider.into(),
            message: message.to_string(),
        }
    }

    pub fn rate_limited(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        FetchError::RateLimited {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed(provider: impl Into<String>, message: impl ToString) -> Self {
        FetchError::Malformed {
            provider: provider.into(),
            message: message.to_string(),
        }
    }

    /// Whether this failure must abort the rest of the current cycle.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::RateLimited { .. })
    }

    /// Whether the next provider (or the next cycle) may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Network { .. } | FetchError::Malformed { .. })
    }

    /// Short label used for log fields and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network { .. } => "network",
            FetchError::RateLimited { .. } => "rate_limited",
            FetchError::Malformed { .. } => "malformed",
            FetchError::NoDataAvailable(_) => "no_data",
        }
    }
}

/// Primary error type for wind map operations.
#[derive(Debug, Error)]
pub enum WindError {
    // === Request Errors ===
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Playback index {index} out of range (timeline length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    // === Data Errors ===
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to parse provider data: {0}")]
    ParseError(String),

    // === Storage Errors ===
    #[error("Storage error: {0}")]
    StorageError(String),

    // === Rendering Errors ===
    #[error("Rendering failed: {0}")]
    RenderError(String),

    // === Infrastructure Errors ===
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl WindError {
    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            WindError::MissingParameter(_)
            | WindError::InvalidParameter { .. }
            | WindError::IndexOutOfRange { .. } => 400,

            WindError::Fetch(FetchError::RateLimited { .. }) => 429,
            WindError::Fetch(_) => 502,

            _ => 500,
        }
    }
}

// Conversion from common error types
impl From<std::io::Error> for WindError {
    fn from(err: std::io::Error) -> Self {
        WindError::InternalError(err.to_string())
    }
}

impl From<serde_json::Error> for WindError {
    fn from(err: serde_json::Error) -> Self {
        WindError::ParseError(format!("JSON error: {}", err))
    }
}
