use infocars_core::Stage;
use thiserror::Error;

/// Errors returned by the FIPE API client.
#[derive(Debug, Error)]
pub enum FipeError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{base_url}': {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },

    /// A lookup was attempted with an empty ancestor code.
    #[error("cannot fetch {stage} data without a code")]
    EmptyCode { stage: Stage },
}

/// Coarse split of [`FipeError`] as seen by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never produced a usable response.
    Fetch,
    /// A response arrived but its body had an unexpected shape.
    Parse,
}

impl FipeError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            FipeError::Deserialize { .. } => ErrorKind::Parse,
            FipeError::Http(e) if e.is_decode() => ErrorKind::Parse,
            FipeError::Http(_)
            | FipeError::UnexpectedStatus { .. }
            | FipeError::InvalidBaseUrl { .. }
            | FipeError::EmptyCode { .. } => ErrorKind::Fetch,
        }
    }
}
