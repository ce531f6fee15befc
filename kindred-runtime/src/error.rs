use kindred_core::dynamic::ParseDynamicObjectError;
use thiserror::Error;

/// Failures surfaced by the controller runtime.
#[derive(Debug, Error)]
pub enum Error {
    /// An underlying client call failed
    #[error("client error: {0}")]
    Client(#[from] kindred_client::Error),

    /// A cached object could not be decoded into the requested kind
    #[error("failed to parse cached object: {0}")]
    Parse(#[from] ParseDynamicObjectError),

    /// The controller's run loop was started twice
    #[error("controller for {0} already started")]
    AlreadyStarted(String),
}

impl Error {
    /// Whether this error is a NotFound api response.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Client(e) if e.is_not_found())
    }
}
