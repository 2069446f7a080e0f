//! Client error types.

/// Errors that can occur when talking to the metering platform.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed at the transport level.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The platform returned a non-success response.
    #[error("API error: HTTP {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or status text.
        message: String,
    },

    /// The retry budget was exhausted without a successful response.
    #[error("retries exhausted after {attempts} attempts: {message}")]
    RetriesExhausted {
        /// Total attempts made, including the first.
        attempts: u32,
        /// The last failure observed.
        message: String,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}
