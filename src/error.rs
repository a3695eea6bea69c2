use reqwest::StatusCode;
use thiserror::Error;

/// Why a single backend call did not yield a usable payload.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: StatusCode },

    #[error("{url} returned a body that is not JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned JSON of an unexpected shape")]
    Shape { url: String },
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;
