use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::record::MatchRecord;
use crate::clock::MINUTE_MS;

/// Timing fields computed at broadcast time, so readers never re-derive phase rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Derived {
    pub elapsed_ms: u64,
    pub threshold_ms: u64,
    /// `min(elapsed, threshold)`
    pub main_elapsed: u64,
    /// `max(0, elapsed - threshold)`
    pub extra_elapsed: u64,
    /// Announced added time in whole minutes
    pub added_time_min: u64,
}

impl Derived {
    pub fn compute(record: &MatchRecord, now: u64) -> Self {
        let elapsed_ms = record.timer.elapsed(now);
        let threshold_ms = record.period.threshold_ms(record.match_duration_ms).unwrap_or(elapsed_ms);

        Self {
            elapsed_ms,
            threshold_ms,
            main_elapsed: elapsed_ms.min(threshold_ms),
            extra_elapsed: elapsed_ms.saturating_sub(threshold_ms),
            added_time_min: record.extra_time_ms / MINUTE_MS,
        }
    }
}

/// Complete, self-contained copy of match state plus derived timing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Snapshot {
    #[serde(flatten)]
    pub record: MatchRecord,
    pub derived: Derived,
}

impl Snapshot {
    /// Deep copy of `record` with timing derived at `now`
    pub fn derive(record: &MatchRecord, now: u64) -> Self {
        Self { record: record.clone(), derived: Derived::compute(record, now) }
    }
}
