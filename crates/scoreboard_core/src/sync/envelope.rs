//! Wire unit of the sync channel.
//!
//! ```json
//! { "id": "…", "matchId": "m1", "originId": "…", "role": "writer",
//!   "ts": 1700000000000, "payload": { "type": "state", "score": { … }, "derived": { … } } }
//! ```

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The single authoritative process for a match
    Writer,
    Reader,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Writer => write!(f, "writer"),
            Role::Reader => write!(f, "reader"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Payload {
    /// Liveness announcement
    Presence,
    State(Box<Snapshot>),
}

impl Payload {
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Presence => "presence",
            Payload::State(_) => "state",
        }
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            Payload::State(snapshot) => Some(snapshot),
            Payload::Presence => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Unique per message; the dedup key
    pub id: String,
    pub match_id: String,
    /// Per-process identity of the sender
    pub origin_id: String,
    pub role: Role,
    /// Epoch ms at send time
    pub ts: u64,
    pub payload: Payload,
}

impl Envelope {
    pub fn new(match_id: &str, origin_id: &str, role: Role, ts: u64, payload: Payload) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            match_id: match_id.to_string(),
            origin_id: origin_id.to_string(),
            role,
            ts,
            payload,
        }
    }

    /// Malformed input is "no message", never an error.
    pub fn decode(json: &str) -> Option<Self> {
        match serde_json::from_str(json) {
            Ok(envelope) => Some(envelope),
            Err(e) => {
                tracing::debug!(error = %e, "dropping malformed envelope");
                None
            }
        }
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// JSON schema of the wire format
    pub fn wire_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Envelope)
    }
}
