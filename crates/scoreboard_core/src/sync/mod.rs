//! # Sync Channel
//!
//! Single-writer fan-out of match snapshots. The writer's [`SyncChannel`]
//! publishes each snapshot on a primary [`Transport`] and leaves a transient
//! copy in the durable mailbox slot; readers accept an envelope once,
//! whichever [`EnvelopeSource`] delivered it.

mod bus;
mod channel;
mod envelope;
mod error;
mod mailbox;
mod seen;
mod transport;

pub use bus::{BusEndpoint, LocalBus};
pub use channel::{HandlerId, SyncChannel};
pub use envelope::{Envelope, Payload, Role};
pub use error::SyncError;
pub use mailbox::MailboxPoller;
pub use seen::SeenSet;
pub use transport::{EnvelopeSource, Transport};
