use std::sync::Arc;

use tracing::debug;

use super::{Envelope, EnvelopeSource};
use crate::store::{mailbox_key, KeyValueStore};

/// Durable-storage fallback: reads the per-match mailbox slot at a fixed
/// interval. Works with no primary transport at all, at the cost of up to
/// one interval of latency.
pub struct MailboxPoller {
    store: Arc<dyn KeyValueStore>,
    key: String,
    interval_ms: u64,
    next_poll_at: u64,
    last_id: Option<String>,
}

impl MailboxPoller {
    pub fn new(store: Arc<dyn KeyValueStore>, match_id: &str, interval_ms: u64) -> Self {
        Self {
            store,
            key: mailbox_key(match_id),
            interval_ms: interval_ms.max(1),
            next_poll_at: 0,
            last_id: None,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }
}

impl std::fmt::Debug for MailboxPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailboxPoller")
            .field("key", &self.key)
            .field("interval_ms", &self.interval_ms)
            .finish()
    }
}

impl EnvelopeSource for MailboxPoller {
    fn name(&self) -> &'static str {
        "mailbox"
    }

    fn poll(&mut self, now: u64) -> Vec<Envelope> {
        if now < self.next_poll_at {
            return Vec::new();
        }
        self.next_poll_at = now.saturating_add(self.interval_ms);

        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                debug!(key = %self.key, error = %e, "mailbox read failed");
                return Vec::new();
            }
        };

        match Envelope::decode(&raw) {
            Some(envelope) if self.last_id.as_deref() != Some(envelope.id.as_str()) => {
                self.last_id = Some(envelope.id.clone());
                vec![envelope]
            }
            _ => Vec::new(),
        }
    }
}
