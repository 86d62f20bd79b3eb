/// Error types shared by the host bindings and the coordination logic
use thiserror::Error;

/// A failed call into one of the browser's host APIs.
///
/// Lookups degrade to empty results at the call site, so this type mostly
/// travels as far as a status message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    #[error("Lookup failed: {0}")]
    Lookup(String),

    #[error("Deletion failed: {0}")]
    Deletion(String),

    #[error("Messaging failed: {0}")]
    Messaging(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

/// Reasons a site listing run could not start or finish.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("A site listing is already running")]
    AlreadyRunning,

    #[error("History query failed: {0}")]
    History(HostError),
}

pub type HostResult<T> = std::result::Result<T, HostError>;
