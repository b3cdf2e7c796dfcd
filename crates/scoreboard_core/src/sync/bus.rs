//! In-process primary transport.
//!
//! Every [`BusEndpoint`] connected to the same [`LocalBus`] receives what the
//! others publish, never its own messages. Queues are bounded per endpoint;
//! a lagging endpoint loses its oldest envelopes first, which is harmless
//! because every state payload is a complete snapshot.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

use super::{Envelope, EnvelopeSource, SyncError, Transport};

#[derive(Debug)]
struct BusState {
    queue_capacity: usize,
    next_endpoint_id: u64,
    queues: BTreeMap<u64, VecDeque<Envelope>>,
}

#[derive(Debug, Clone)]
pub struct LocalBus {
    inner: Arc<Mutex<BusState>>,
}

impl LocalBus {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BusState {
                queue_capacity: queue_capacity.max(1),
                next_endpoint_id: 0,
                queues: BTreeMap::new(),
            })),
        }
    }

    pub fn connect(&self) -> Result<BusEndpoint, SyncError> {
        let mut state = self.lock_state()?;
        let id = state.next_endpoint_id;
        state.next_endpoint_id = state.next_endpoint_id.saturating_add(1);
        state.queues.insert(id, VecDeque::new());
        Ok(BusEndpoint { id, bus: self.clone(), closed: false })
    }

    pub fn endpoint_count(&self) -> usize {
        self.lock_state().map(|s| s.queues.len()).unwrap_or(0)
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, BusState>, SyncError> {
        self.inner.lock().map_err(|_| SyncError::Poisoned)
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new(crate::config::SyncConfig::default().bus_queue_capacity)
    }
}

#[derive(Debug)]
pub struct BusEndpoint {
    id: u64,
    bus: LocalBus,
    closed: bool,
}

impl BusEndpoint {
    fn disconnect(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Ok(mut state) = self.bus.lock_state() {
            state.queues.remove(&self.id);
        }
    }
}

impl EnvelopeSource for BusEndpoint {
    fn name(&self) -> &'static str {
        "bus"
    }

    fn poll(&mut self, _now: u64) -> Vec<Envelope> {
        if self.closed {
            return Vec::new();
        }
        match self.bus.lock_state() {
            Ok(mut state) => {
                state.queues.get_mut(&self.id).map(|q| q.drain(..).collect()).unwrap_or_default()
            }
            Err(_) => Vec::new(),
        }
    }

    fn close(&mut self) {
        self.disconnect();
    }
}

impl Transport for BusEndpoint {
    fn publish(&mut self, envelope: &Envelope) -> Result<(), SyncError> {
        if self.closed {
            return Err(SyncError::Closed);
        }
        let mut state = self.bus.lock_state()?;
        let capacity = state.queue_capacity;
        for (id, queue) in state.queues.iter_mut() {
            if *id == self.id {
                continue;
            }
            if queue.len() >= capacity {
                queue.pop_front();
                warn!(endpoint = id, "bus endpoint lagging, dropped oldest envelope");
            }
            queue.push_back(envelope.clone());
        }
        Ok(())
    }
}

impl Drop for BusEndpoint {
    fn drop(&mut self) {
        self.disconnect();
    }
}
