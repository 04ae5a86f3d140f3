use serde::Deserialize;

/// Failure of one request/response exchange, classified by how the
/// coordinator reacts to it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// 400: the server rejected the input.
    #[error("{0}")]
    Validation(String),

    /// 404: the record (or every record with that name) is gone.
    #[error("{0}")]
    NotFound(String),

    /// 5xx or any other unexpected status.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    /// Builds the error for a non-2xx response, reading the message from a
    /// `{"error": ..}` body when there is one.
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<ErrorBody>(body)
            .map(|b| b.error)
            .unwrap_or_else(|_| String::from_utf8_lossy(body).into_owned());

        match status {
            400 => ApiError::Validation(message),
            404 => ApiError::NotFound(message),
            _ => ApiError::Server { status, message },
        }
    }

    /// Worth one more attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network(_) => true,
            ApiError::Server { status, .. } => *status >= 500,
            ApiError::Validation(_) | ApiError::NotFound(_) => false,
        }
    }
}

/// Error surfaced by [`Client`](super::Client) operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Input rejected locally; nothing was written or sent.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Api(ApiError::NotFound(_)))
    }
}
