use thiserror::Error;

use crate::remote::RemoteError;

/// Errors surfaced by the filter subsystem
#[derive(Debug, Error)]
pub enum Error {
    /// A tagged filter record could not be decoded
    #[error("Malformed filter: {0}")]
    MalformedFilter(String),

    /// A remote save/update/delete/search/list call failed
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// The stored preferences document could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Preset {0} not found")]
    PresetNotFound(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
