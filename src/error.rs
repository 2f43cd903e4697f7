use thiserror::Error;
use validator::ValidationErrors;

use crate::connection::TransportError;

/// Errors surfaced by the synchronizer's operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The connection failed or the backend rejected the command.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Input rejected before anything was sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A backend response did not have the expected shape.
    #[error("malformed backend response")]
    InvalidPayload(#[from] serde_json::Error),
    /// Every eligible song of the playlist was already played.
    #[error("no more songs available in playlist `{playlist_id}`")]
    NoSongsAvailable { playlist_id: String },
}

impl From<ValidationErrors> for ServiceError {
    fn from(err: ValidationErrors) -> Self {
        ServiceError::InvalidInput(format!("validation failed: {}", err))
    }
}
