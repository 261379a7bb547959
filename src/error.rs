//! Error taxonomy for score loading and playback synchronization

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SyncError {
    #[error("malformed timemap: {0}")]
    MalformedTimemap(String),
    #[error("timemap has no entries")]
    EmptyTimemap,
    #[error("stale element reference: {0}")]
    StaleElementReference(String),
    #[error("midi error: {0}")]
    Midi(String),
    #[error("converter error: {0}")]
    Converter(String),
    #[error("renderer error: {0}")]
    Renderer(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
