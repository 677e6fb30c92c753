//! Error types shared by the content pipeline

use thiserror::Error;

/// Errors raised while fetching, normalizing or formatting content
#[derive(Error, Debug)]
pub enum Error {
    /// A CMS document lacks one of its identity fields (`id` / `uid`)
    #[error("Malformed document: missing `{field}`")]
    MalformedDocument { field: &'static str },

    /// A timestamp that does not parse as a date
    #[error("Invalid timestamp: {0:?}")]
    InvalidTimestamp(String),

    /// The CMS backend could not be reached or answered with an error
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// No document with this uid exists (any more)
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure talking to the CMS backend
#[derive(Error, Debug)]
pub enum FetchError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.)
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code
    #[error("CMS API error ({status}): {body}")]
    Status { status: u16, body: String },

    /// The response body was not the expected JSON shape
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// A next-page cursor that does not point at the configured backend
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    /// The backend has no ref to resolve content against
    #[error("No master ref advertised by {0}")]
    NoMasterRef(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Whether this error is a transient backend failure worth retrying
    pub fn is_fetch(&self) -> bool {
        matches!(self, Error::Fetch(_))
    }
}
