use thiserror::Error;

/// Failure of a call against the remote task service.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("{url} returned {status}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },
    #[error("malformed response from {url}: {message}")]
    Decode { url: String, message: String },
    #[error("invalid api url {url:?}: {message}")]
    InvalidUrl { url: String, message: String },
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Decode {
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
                message: err.to_string(),
            };
        }
        if let Some(status) = err.status() {
            return Self::Status {
                status,
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            };
        }
        Self::Transport(err)
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
