//! Unified error type.

use http::StatusCode;

/// Boxed error produced by a request body stream.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by sprig's fallible operations.
///
/// Application-level outcomes (403 from a middleware, 404 for an unknown
/// route) are ordinary responses, not `Error`s. This type covers the
/// infrastructure failures and the preprocessing failures that stop a
/// request before any handler runs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// The request carried no usable target.
    #[error("No request url")]
    MissingTarget,

    /// A non-empty body arrived on a method that does not take one.
    #[error("{0} does not support body")]
    BodyNotAllowed(http::Method),

    #[error("Payload Too Large")]
    BodyTooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    BodyRead(#[source] BoxError),

    #[error("error parsing JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// A cookie expiry outside what an HTTP-date can express (1970..=9999).
    #[error("cookie expiry out of range for an HTTP date")]
    InvalidExpires,

    /// Every handle to the response was dropped before `send` was called.
    #[error("request finished without a response")]
    NoResponse,
}

impl Error {
    /// The status written to the wire for this error, if any.
    ///
    /// `None` means the connection is closed without a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::MissingTarget => Some(StatusCode::INTERNAL_SERVER_ERROR),
            Self::BodyNotAllowed(_) => Some(StatusCode::BAD_REQUEST),
            Self::BodyTooLarge { .. } => Some(StatusCode::PAYLOAD_TOO_LARGE),
            _ => None,
        }
    }
}
