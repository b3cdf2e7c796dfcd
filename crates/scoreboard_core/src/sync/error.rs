use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("match id required")]
    MissingMatchId,

    #[error("transport closed")]
    Closed,

    #[error("bus lock poisoned")]
    Poisoned,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SyncError {
    /// Whether the next broadcast may succeed where this one failed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            SyncError::Store(e) => e.is_recoverable(),
            SyncError::MissingMatchId => false,
            SyncError::Closed => false,
            SyncError::Poisoned => false,
            SyncError::Serialization(_) => false,
        }
    }
}
