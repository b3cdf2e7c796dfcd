use super::{Envelope, SyncError};

/// Anything envelopes can arrive from: the push bus or a polled mailbox.
///
/// The channel drains every source on each tick and does not care which
/// one delivered a given envelope.
pub trait EnvelopeSource: Send {
    fn name(&self) -> &'static str;

    /// Envelopes received since the previous poll.
    fn poll(&mut self, now: u64) -> Vec<Envelope>;

    fn close(&mut self) {}
}

/// A source that can also publish
pub trait Transport: EnvelopeSource {
    fn publish(&mut self, envelope: &Envelope) -> Result<(), SyncError>;
}
