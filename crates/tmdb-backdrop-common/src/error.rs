//! Common error types used throughout tmdb-backdrop.
//!
//! Every variant is non-fatal to the host page: callers log the error and
//! degrade to "no visual change" or "revert to default".

/// Common error type for tmdb-backdrop.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The host settings query failed or carried no access token.
    #[error("Configuration unavailable: {0}")]
    ConfigUnavailable(String),

    /// The host data query failed or returned a malformed payload.
    #[error("Data query failed: {0}")]
    DataQuery(String),

    /// The external media database request failed, returned a non-2xx
    /// status, malformed JSON or an empty candidate list.
    #[error("External fetch failed: {0}")]
    ExternalFetch(String),

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new ConfigUnavailable error.
    pub fn config_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::ConfigUnavailable(msg.into())
    }

    /// Create a new DataQuery error.
    pub fn data_query<S: Into<String>>(msg: S) -> Self {
        Self::DataQuery(msg.into())
    }

    /// Create a new ExternalFetch error.
    pub fn external_fetch<S: Into<String>>(msg: S) -> Self {
        Self::ExternalFetch(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
