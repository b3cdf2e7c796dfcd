//! # Durable Key-Value Storage
//!
//! The sync layer and the writer's page-reload recovery share one flat
//! string store. Three key families are used per match:
//!
//! - [`mailbox_key`]: `live-scoreboard:{matchId}`, the transient copy of the
//!   last broadcast envelope
//! - [`state_key`]: `{matchId}:state`, the persisted `{meta, state}` document
//! - [`setup_key`]: `{matchId}:setup`, the operator setup form

mod error;
mod file;
mod memory;
mod persist;

pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use persist::{load_persisted, load_setup, save_persisted, save_setup};

/// Prefix of the per-match mailbox key
pub const MAILBOX_PREFIX: &str = "live-scoreboard";

pub fn mailbox_key(match_id: &str) -> String {
    format!("{}:{}", MAILBOX_PREFIX, match_id)
}

pub fn state_key(match_id: &str) -> String {
    format!("{}:state", match_id)
}

pub fn setup_key(match_id: &str) -> String {
    format!("{}:setup", match_id)
}

/// Shared string store visible to every process of one deployment
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(mailbox_key("m1"), "live-scoreboard:m1");
        assert_eq!(state_key("m1"), "m1:state");
        assert_eq!(setup_key("m1"), "m1:setup");
    }
}
