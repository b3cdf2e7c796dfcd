use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use super::seen::SeenSet;
use super::{Envelope, EnvelopeSource, Payload, Role, SyncError, Transport};
use crate::clock::TimeSource;
use crate::config::SyncConfig;
use crate::models::Snapshot;
use crate::store::{mailbox_key, KeyValueStore};

/// Handle returned by [`SyncChannel::on_message`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Handler = Box<dyn FnMut(&Envelope) + Send>;

#[derive(Debug, Clone)]
struct PendingClear {
    due_at: u64,
}

/// One process's endpoint for one match id.
///
/// Tick-driven: [`SyncChannel::tick`] drains every source, fires due
/// timers (presence ping, mailbox clear) and returns the accepted envelopes.
pub struct SyncChannel {
    match_id: String,
    origin_id: String,
    role: Role,
    config: SyncConfig,
    time: Arc<dyn TimeSource>,
    primary: Option<Box<dyn Transport>>,
    sources: Vec<Box<dyn EnvelopeSource>>,
    store: Option<Arc<dyn KeyValueStore>>,
    seen: SeenSet,
    /// Presence ids get their own window so pings never evict state ids
    seen_presence: SeenSet,
    handlers: Vec<(HandlerId, Handler)>,
    next_handler_id: u64,
    next_ping_at: Option<u64>,
    pending_clear: Option<PendingClear>,
    closed: bool,
}

impl std::fmt::Debug for SyncChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncChannel")
            .field("match_id", &self.match_id)
            .field("origin_id", &self.origin_id)
            .field("role", &self.role)
            .field("primary", &self.primary.as_ref().map(|p| p.name()))
            .field("sources", &self.sources.len())
            .field("handlers", &self.handlers.len())
            .field("closed", &self.closed)
            .finish()
    }
}

impl SyncChannel {
    pub fn new(
        match_id: &str,
        role: Role,
        config: &SyncConfig,
        time: Arc<dyn TimeSource>,
    ) -> Result<Self, SyncError> {
        if match_id.trim().is_empty() {
            return Err(SyncError::MissingMatchId);
        }
        Ok(Self {
            match_id: match_id.to_string(),
            origin_id: Uuid::new_v4().to_string(),
            role,
            config: config.clone(),
            time,
            primary: None,
            sources: Vec::new(),
            store: None,
            seen: SeenSet::new(config.dedup_capacity),
            seen_presence: SeenSet::new(config.dedup_capacity),
            handlers: Vec::new(),
            next_handler_id: 0,
            next_ping_at: Some(0),
            pending_clear: None,
            closed: false,
        })
    }

    /// Push transport used for broadcast, ping and receive
    pub fn with_primary(mut self, transport: Box<dyn Transport>) -> Self {
        self.primary = Some(transport);
        self
    }

    /// Additional receive-only source, e.g. a [`super::MailboxPoller`]
    pub fn with_source(mut self, source: Box<dyn EnvelopeSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Shared storage for the transient mailbox copy of each broadcast
    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn match_id(&self) -> &str {
        &self.match_id
    }

    pub fn origin_id(&self) -> &str {
        &self.origin_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn on_message<F>(&mut self, handler: F) -> HandlerId
    where
        F: FnMut(&Envelope) + Send + 'static,
    {
        let id = HandlerId(self.next_handler_id);
        self.next_handler_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    pub fn remove_handler(&mut self, id: HandlerId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(h, _)| *h != id);
        self.handlers.len() != before
    }

    /// Publishes `snapshot` to every peer and the mailbox slot.
    ///
    /// Returns the message id, or `None` when nothing was sent: a reader
    /// calling this is silently ignored.
    pub fn broadcast(&mut self, snapshot: Snapshot) -> Option<String> {
        if self.closed {
            return None;
        }
        if self.role != Role::Writer {
            debug!(match_id = %self.match_id, "reader broadcast ignored");
            return None;
        }

        let now = self.time.now_ms();
        let envelope = Envelope::new(
            &self.match_id,
            &self.origin_id,
            self.role,
            now,
            Payload::State(Box::new(snapshot)),
        );
        self.seen.insert(&envelope.id);

        if let Some(primary) = self.primary.as_mut() {
            if let Err(e) = primary.publish(&envelope) {
                warn!(match_id = %self.match_id, transport = primary.name(), error = %e, "primary publish failed, mailbox only");
            }
        }

        if let Err(e) = self.write_mailbox(&envelope) {
            warn!(match_id = %self.match_id, error = %e, "mailbox write failed");
        }

        debug!(match_id = %self.match_id, id = %envelope.id, "sync:broadcast");
        Some(envelope.id)
    }

    fn write_mailbox(&mut self, envelope: &Envelope) -> Result<(), SyncError> {
        let Some(store) = self.store.as_ref() else {
            return Ok(());
        };
        store.set(&mailbox_key(&self.match_id), &envelope.encode()?)?;
        // a newer write pushes the clear back
        self.pending_clear = Some(PendingClear {
            due_at: envelope.ts.saturating_add(self.config.mailbox_clear_delay_ms),
        });
        Ok(())
    }

    fn clear_mailbox(&mut self) {
        self.pending_clear = None;
        if let Some(store) = self.store.as_ref() {
            if let Err(e) = store.remove(&mailbox_key(&self.match_id)) {
                debug!(match_id = %self.match_id, error = %e, "mailbox clear failed");
            }
        }
    }

    /// Presence announcement on the primary transport only
    pub fn ping(&mut self) {
        if self.closed {
            return;
        }
        let now = self.time.now_ms();
        let envelope =
            Envelope::new(&self.match_id, &self.origin_id, self.role, now, Payload::Presence);
        if let Some(primary) = self.primary.as_mut() {
            if let Err(e) = primary.publish(&envelope) {
                debug!(match_id = %self.match_id, error = %e, "ping failed");
            }
        }
        self.next_ping_at = Some(now.saturating_add(self.config.ping_interval_ms));
    }

    /// Applies the acceptance rules and runs handlers. Returns whether the
    /// envelope was accepted.
    ///
    /// Duplicate suppression remembers the last `dedup_capacity` state ids
    /// and, separately, the last `dedup_capacity` presence ids. A state
    /// envelope replayed after that many newer states has been forgotten
    /// and is delivered again.
    pub fn deliver(&mut self, envelope: &Envelope) -> bool {
        if self.closed
            || envelope.match_id != self.match_id
            || envelope.origin_id == self.origin_id
        {
            return false;
        }
        let window = match envelope.payload {
            Payload::Presence => &mut self.seen_presence,
            Payload::State(_) => &mut self.seen,
        };
        if !window.insert(&envelope.id) {
            return false;
        }

        debug!(
            match_id = %self.match_id,
            from = %envelope.origin_id,
            role = %envelope.role,
            kind = envelope.payload.kind(),
            "sync:incoming"
        );
        for (_, handler) in self.handlers.iter_mut() {
            handler(envelope);
        }
        true
    }

    /// One scheduling step. Returns envelopes accepted on this tick.
    pub fn tick(&mut self) -> Vec<Envelope> {
        if self.closed {
            return Vec::new();
        }
        let now = self.time.now_ms();

        if self.next_ping_at.is_some_and(|at| now >= at) {
            self.ping();
        }
        if self.pending_clear.as_ref().is_some_and(|p| now >= p.due_at) {
            self.clear_mailbox();
        }

        let mut incoming = Vec::new();
        if let Some(primary) = self.primary.as_mut() {
            incoming.extend(primary.poll(now));
        }
        for source in self.sources.iter_mut() {
            incoming.extend(source.poll(now));
        }

        incoming.into_iter().filter(|envelope| self.deliver(envelope)).collect()
    }

    /// Stops timers, closes transports and forgets handlers and seen ids.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        if self.pending_clear.is_some() {
            self.clear_mailbox();
        }
        if let Some(primary) = self.primary.as_mut() {
            primary.close();
        }
        for source in self.sources.iter_mut() {
            source.close();
        }
        self.handlers.clear();
        self.seen.clear();
        self.seen_presence.clear();
        self.next_ping_at = None;
        self.closed = true;
        debug!(match_id = %self.match_id, origin = %self.origin_id, "sync channel closed");
    }
}

impl Drop for SyncChannel {
    fn drop(&mut self) {
        self.close();
    }
}
