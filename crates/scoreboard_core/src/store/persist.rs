//! Typed helpers over [`KeyValueStore`] for the writer's recovery documents.
//!
//! Loading never fails hard: a missing, unreadable or invalid document is
//! logged and treated as absent, so a bad stored value degrades to a fresh
//! match instead of a crash.

use super::{setup_key, state_key, KeyValueStore, StoreError};
use crate::models::{MatchMeta, MatchRecord, MatchSetup, PersistedMatch};

pub fn load_persisted(store: &dyn KeyValueStore, match_id: &str) -> Option<PersistedMatch> {
    let key = state_key(match_id);
    let raw = match store.get(&key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            log::warn!("Failed to read {}: {}", key, e);
            return None;
        }
    };

    match serde_json::from_str::<PersistedMatch>(&raw) {
        Ok(persisted) => {
            log::debug!("Loaded persisted state for {}", match_id);
            Some(persisted)
        }
        Err(e) => {
            log::warn!("Ignoring corrupt persisted state at {}: {}", key, e);
            None
        }
    }
}

pub fn save_persisted(
    store: &dyn KeyValueStore,
    match_id: &str,
    record: &MatchRecord,
    ts: u64,
) -> Result<(), StoreError> {
    let doc = PersistedMatch { meta: MatchMeta::from_record(record), state: record.clone(), ts };
    let json = serde_json::to_string(&doc)?;
    store.set(&state_key(match_id), &json)?;
    log::trace!("Persisted {} bytes for {}", json.len(), match_id);
    Ok(())
}

/// Returns the stored setup if it parses and validates.
pub fn load_setup(store: &dyn KeyValueStore, match_id: &str) -> Option<MatchSetup> {
    let key = setup_key(match_id);
    let raw = match store.get(&key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            log::warn!("Failed to read {}: {}", key, e);
            return None;
        }
    };

    let setup = match serde_json::from_str::<MatchSetup>(&raw) {
        Ok(setup) => setup,
        Err(e) => {
            log::warn!("Ignoring malformed setup at {}: {}", key, e);
            return None;
        }
    };

    match setup.checked() {
        Ok(setup) => Some(setup),
        Err(e) => {
            log::warn!("Ignoring invalid setup at {}: {}", key, e);
            None
        }
    }
}

pub fn save_setup(
    store: &dyn KeyValueStore,
    match_id: &str,
    setup: &MatchSetup,
) -> Result<(), StoreError> {
    let json = serde_json::to_string(setup)?;
    store.set(&setup_key(match_id), &json)?;
    log::info!("Saved setup for {}", match_id);
    Ok(())
}
