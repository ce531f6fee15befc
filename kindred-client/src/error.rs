//! Error handling in [`kindred-client`][crate]
use thiserror::Error;

pub use kindred_core::ErrorResponse;
use kindred_core::{dynamic::ParseDynamicObjectError, BoxError};

/// Possible errors from client operations
#[derive(Error, Debug)]
pub enum Error {
    /// ApiError for when things fail
    ///
    /// Surfaced verbatim from the underlying object client; this layer
    /// never inspects, wraps or retries it.
    #[error("ApiError: {0} ({0:?})")]
    Api(#[source] ErrorResponse),

    /// Transport error from the object-client implementation
    #[error("ServiceError: {0}")]
    Service(#[source] BoxError),

    /// Common error case when parsing responses into typed structs
    #[error("Error deserializing response")]
    SerdeError(#[source] serde_json::Error),

    /// A dynamic object claimed the requested kind but did not parse as it
    #[error("ParseError: {0}")]
    Parse(#[from] ParseDynamicObjectError),
}

impl Error {
    /// Whether the error is the standard missing-object response.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Api(e) if e.is_not_found())
    }
}
