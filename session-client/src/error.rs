use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server rejected the issuance request. Carries the status and the
    /// server's generic message for display to the user.
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to encode identity snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
