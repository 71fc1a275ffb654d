use thiserror::Error;

/// Fallback shown when an error response carries no usable payload.
pub(crate) const GENERIC_ERROR: &str = "Failed to generate prompt";

/// Client-side failure taxonomy
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response; `message` is the server's `error` field or a
    /// generic fallback when the payload is absent or malformed.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The session was superseded. Never user-visible.
    #[error("generation cancelled")]
    Cancelled,
}
