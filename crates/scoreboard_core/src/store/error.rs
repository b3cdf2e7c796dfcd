use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid key: {key}")]
    InvalidKey { key: String },

    #[error("Store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub fn is_recoverable(&self) -> bool {
        match self {
            StoreError::Io(_) => true,
            StoreError::Serialization(_) => false,
            StoreError::InvalidKey { .. } => false,
            StoreError::Poisoned => false,
        }
    }
}
