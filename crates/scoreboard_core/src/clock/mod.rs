//! Match Clock Accumulator
//!
//! Elapsed running time is `base_ms` plus, while running, the time since
//! `start_ts`. Start/pause cycles fold the running segment into `base_ms`,
//! so the clock never drifts no matter how often it is stopped.
//!
//! ## Invariant
//! `start_ts` is `Some` iff `running` is true.

mod source;

pub use source::{ManualClock, SystemClock, TimeSource};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One minute in milliseconds
pub const MINUTE_MS: u64 = 60_000;

/// Clock state carried inside the match record and every snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct TimerState {
    pub running: bool,
    /// Time accumulated before the current run segment
    pub base_ms: u64,
    /// Epoch ms at which the current run segment started
    pub start_ts: Option<u64>,
}

impl TimerState {
    /// Stopped clock showing `base_ms`
    pub fn stopped(base_ms: u64) -> Self {
        Self { running: false, base_ms, start_ts: None }
    }

    /// Clock running from `base_ms` since `now`
    pub fn running_from(base_ms: u64, now: u64) -> Self {
        Self { running: true, base_ms, start_ts: Some(now) }
    }

    /// Elapsed match time at `now`
    pub fn elapsed(&self, now: u64) -> u64 {
        elapsed(self, now)
    }

    /// Returns false if the clock was already running.
    pub fn start(&mut self, now: u64) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.start_ts = Some(now);
        true
    }

    /// Folds the running segment into `base_ms`. Returns false if already stopped.
    pub fn pause(&mut self, now: u64) -> bool {
        if !self.running {
            return false;
        }
        self.base_ms = elapsed(self, now);
        self.running = false;
        self.start_ts = None;
        true
    }

    /// Pause, then zero.
    pub fn reset(&mut self, now: u64) {
        self.pause(now);
        self.base_ms = 0;
    }

    /// Sets the displayed time to `ms`, keeping the run-state.
    pub fn set(&mut self, ms: u64, now: u64) {
        self.base_ms = ms;
        if self.running {
            self.start_ts = Some(now);
        }
    }

    /// Restores the `start_ts`/`running` invariant after an external edit.
    ///
    /// A clock marked running without a start point starts now; a stopped
    /// clock with a dangling start point has that segment folded in.
    pub fn normalize(&mut self, now: u64) {
        match (self.running, self.start_ts) {
            (true, None) => self.start_ts = Some(now),
            (false, Some(start)) => {
                self.base_ms = self.base_ms.saturating_add(now.saturating_sub(start));
                self.start_ts = None;
            }
            _ => {}
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.running == self.start_ts.is_some()
    }
}

/// `running ? base + (now - start) : base`
///
/// A start point in the future (clock skew between processes) contributes nothing.
pub fn elapsed(timer: &TimerState, now: u64) -> u64 {
    match (timer.running, timer.start_ts) {
        (true, Some(start)) => timer.base_ms.saturating_add(now.saturating_sub(start)),
        _ => timer.base_ms,
    }
}

/// Match minute shown next to an event: `ceil(elapsed / 60s)`, never below 1.
pub fn match_minute(elapsed_ms: u64) -> u32 {
    let minute = elapsed_ms.div_ceil(MINUTE_MS).max(1);
    u32::try_from(minute).unwrap_or(u32::MAX)
}
