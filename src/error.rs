use http::StatusCode;
use thiserror::Error;

/// Failures surfaced by the cloud clients and the discovery pipeline.
///
/// Every variant is fatal to the discovery call that produced it. Per-instance
/// derivation never returns an error.
#[derive(Debug, Error)]
pub enum SdError {
    /// Identity endpoint rejected the signed assertion or could not be reached.
    #[error("iam token request failed: {0}")]
    Auth(String),

    /// Non-success response from a cloud REST API.
    #[error("api request failed with status {status}: {body}")]
    Api { status: StatusCode, body: String },

    /// Response body did not match the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Service account private key could not be parsed or used for signing.
    #[error("private key error: {0}")]
    Key(String),
}

impl SdError {
    /// Server-side API failures and transient transport problems may be retried,
    /// everything else is final.
    pub fn is_retryable(&self) -> bool {
        match self {
            SdError::Api { status, .. } => status.is_server_error(),
            SdError::Transport(err) => err.is_timeout() || err.is_connect(),
            SdError::Auth(_) | SdError::MalformedResponse(_) | SdError::Key(_) => false,
        }
    }

    /// Short, low-cardinality reason used as a metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            SdError::Auth(_) => "auth",
            SdError::Api { .. } => "api",
            SdError::MalformedResponse(_) => "malformed",
            SdError::Transport(_) => "transport",
            SdError::Key(_) => "key",
        }
    }
}
