//! Error types for the Goodreads client.
//!
//! # Design
//! Three failure classes reach callers of the accessors: a field missing from
//! a fetched record, a request the remote side rejected (or never answered),
//! and a response whose structure is not what the accessor expected.
//! `NotFound` gets its own `RequestError` variant because callers often want
//! to tell "no such user" apart from other non-success statuses.

use thiserror::Error;

/// Errors returned by the request client, the accessors and the wrappers.
#[derive(Debug, Error)]
pub enum GoodreadsError {
    /// A required field is absent from the backing record.
    #[error("missing field `{field}`")]
    MissingField { field: String },

    /// The request failed at the transport or HTTP level.
    #[error("remote request failed: {0}")]
    RemoteRequest(#[from] RequestError),

    /// The response could not be decoded, or lacks the expected nesting.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The client configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl GoodreadsError {
    pub(crate) fn missing(field: &str) -> Self {
        GoodreadsError::MissingField {
            field: field.to_string(),
        }
    }
}

/// Why a remote request failed.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-200 status other than 404.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never produced a response (DNS, connect, timeout, I/O).
    #[error("transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, GoodreadsError>;
