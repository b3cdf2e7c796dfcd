use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{Period, Side};
use crate::error::CoreError;

/// Scorer name used when the operator leaves it blank
pub const UNKNOWN_SCORER: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GoalRecord {
    pub id: String,
    /// Per-match ordering across goal and substitution histories
    pub seq: u64,
    pub side: Side,
    pub scorer: String,
    pub time_ms: u64,
    pub minute: u32,
    pub period: Period,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubKind {
    In,
    Out,
    /// One player on, one player off
    Swap,
}

impl fmt::Display for SubKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            SubKind::In => "IN",
            SubKind::Out => "OUT",
            SubKind::Swap => "SWAP",
        };
        f.write_str(s)
    }
}

impl FromStr for SubKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IN" => Ok(SubKind::In),
            "OUT" => Ok(SubKind::Out),
            "SWAP" => Ok(SubKind::Swap),
            other => Err(CoreError::InvalidParameter(format!("substitution kind {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubRecord {
    pub id: String,
    pub seq: u64,
    pub side: Side,
    pub kind: SubKind,
    pub in_name: Option<String>,
    pub out_name: Option<String>,
    pub time_ms: u64,
    pub minute: u32,
    pub period: Period,
    pub timestamp: u64,
}

/// Most recent goal or substitution, for "new since last render" detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LastEvent {
    Goal(GoalRecord),
    Sub(SubRecord),
}

impl LastEvent {
    pub fn id(&self) -> &str {
        match self {
            LastEvent::Goal(goal) => &goal.id,
            LastEvent::Sub(sub) => &sub.id,
        }
    }

    pub fn seq(&self) -> u64 {
        match self {
            LastEvent::Goal(goal) => goal.seq,
            LastEvent::Sub(sub) => sub.seq,
        }
    }

    pub fn side(&self) -> Side {
        match self {
            LastEvent::Goal(goal) => goal.side,
            LastEvent::Sub(sub) => sub.side,
        }
    }
}
