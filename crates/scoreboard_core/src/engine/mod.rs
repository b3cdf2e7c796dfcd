//! # Match State Engine
//!
//! Owns the canonical [`MatchRecord`] for one match id. Every mutation goes
//! through an operation here; callers observe state only through
//! [`MatchEngine::snapshot`], which returns an independent deep copy.
//!
//! The engine never talks to a transport. Each operation that actually
//! changes state queues a [`StateChange`]; a thin adapter (see
//! `controller::MatchController`) drains them and forwards a snapshot to
//! the sync channel.
//!
//! No automatic period transitions happen in here. Threshold-driven
//! advancement is an external policy ([`PeriodDriver`]).

mod patch;
mod policy;

#[cfg(test)]
mod tests;

pub use patch::{MatchPatch, ScorePatch, TeamPatch, TeamsPatch, TimerPatch};
pub use policy::{AdvancePolicy, PeriodDriver};

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::clock::{match_minute, TimeSource, TimerState, MINUTE_MS};
use crate::config::EngineConfig;
use crate::models::{
    GoalRecord, LastEvent, MatchRecord, MatchSetup, Period, PeriodEntry, Score, Side, Snapshot,
    SubKind, SubRecord, UNKNOWN_SCORER,
};

/// Default depth of the period undo stack
pub const PERIOD_HISTORY_CAP: usize = 10;

/// Notification queued by every operation that changed the record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    ClockStarted,
    ClockPaused,
    ClockReset,
    ClockSet { ms: u64 },
    PeriodChanged { from: Period, to: Period },
    PeriodRestored { period: Period },
    GoalRecorded { id: String, side: Side },
    GoalUndone { id: String, side: Side },
    SubRecorded { id: String, side: Side },
    SubUndone { id: String, side: Side },
    ExtraTimeSet { ms: u64 },
    Patched,
}

pub struct MatchEngine {
    match_id: String,
    record: MatchRecord,
    time: Arc<dyn TimeSource>,
    history_cap: usize,
    changes: Vec<StateChange>,
}

impl std::fmt::Debug for MatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchEngine")
            .field("match_id", &self.match_id)
            .field("period", &self.record.period)
            .field("score", &self.record.score)
            .field("pending_changes", &self.changes.len())
            .finish()
    }
}

impl MatchEngine {
    /// Fresh match with default values
    pub fn new(match_id: impl Into<String>, time: Arc<dyn TimeSource>) -> Self {
        Self::with_config(match_id, &EngineConfig::default(), time)
    }

    pub fn with_config(
        match_id: impl Into<String>,
        config: &EngineConfig,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        let record = MatchRecord {
            match_duration_ms: u64::from(config.default_match_duration_min) * MINUTE_MS,
            ..MatchRecord::default()
        };
        Self {
            match_id: match_id.into(),
            record,
            time,
            history_cap: config.period_history_cap,
            changes: Vec::new(),
        }
    }

    /// Resume from a prior durable snapshot
    pub fn restore(
        match_id: impl Into<String>,
        mut record: MatchRecord,
        config: &EngineConfig,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        record.sanitize(time.now_ms());
        while record.period_history.len() > config.period_history_cap {
            record.period_history.remove(0);
        }
        Self {
            match_id: match_id.into(),
            record,
            time,
            history_cap: config.period_history_cap,
            changes: Vec::new(),
        }
    }

    pub fn match_id(&self) -> &str {
        &self.match_id
    }

    pub fn now(&self) -> u64 {
        self.time.now_ms()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.record.timer.elapsed(self.now())
    }

    pub fn period(&self) -> Period {
        self.record.period
    }

    pub fn score(&self) -> Score {
        self.record.score
    }

    pub fn is_running(&self) -> bool {
        self.record.timer.running
    }

    pub fn match_duration_ms(&self) -> u64 {
        self.record.match_duration_ms
    }

    pub fn extra_time_ms(&self) -> u64 {
        self.record.extra_time_ms
    }

    /// Fully independent copy of the record plus derived timing
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::derive(&self.record, self.now())
    }

    /// Takes the notifications queued since the last call.
    pub fn drain_changes(&mut self) -> Vec<StateChange> {
        std::mem::take(&mut self.changes)
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    fn emit(&mut self, change: StateChange) {
        debug!(match_id = %self.match_id, ?change, score = %self.record.score, "state changed");
        self.changes.push(change);
    }

    // ========================
    // Clock
    // ========================

    pub fn start_clock(&mut self) {
        let now = self.now();
        if self.record.timer.start(now) {
            self.emit(StateChange::ClockStarted);
        }
    }

    pub fn pause_clock(&mut self) {
        let now = self.now();
        if self.record.timer.pause(now) {
            self.emit(StateChange::ClockPaused);
        }
    }

    pub fn reset_clock(&mut self) {
        let now = self.now();
        self.record.timer.reset(now);
        self.emit(StateChange::ClockReset);
    }

    pub fn set_clock(&mut self, ms: u64) {
        let now = self.now();
        self.record.timer.set(ms, now);
        self.emit(StateChange::ClockSet { ms });
    }

    // ========================
    // Periods
    // ========================

    /// Pushes the prior `{period, timer}` and transitions. No-op on the current period.
    fn change_period(&mut self, next: Period) -> bool {
        let from = self.record.period;
        if from == next {
            return false;
        }

        self.record.period_history.push(PeriodEntry {
            period: from,
            timer: self.record.timer,
            timestamp: self.now(),
        });
        while self.record.period_history.len() > self.history_cap {
            self.record.period_history.remove(0);
        }

        self.record.period = next;
        self.emit(StateChange::PeriodChanged { from, to: next });
        true
    }

    /// Any period may follow any other; sequencing is the caller's call.
    pub fn set_period(&mut self, period: Period) {
        self.change_period(period);
    }

    /// `FIRST_HALF` with the clock running from zero
    pub fn start_first_half(&mut self) {
        self.change_period(Period::FirstHalf);
        self.restart_clock_from(0);
    }

    /// `SECOND_HALF` with the clock running from exactly half the match duration
    pub fn start_second_half(&mut self) {
        self.change_period(Period::SecondHalf);
        let half = self.record.half_duration_ms();
        self.restart_clock_from(half);
    }

    fn restart_clock_from(&mut self, base_ms: u64) {
        self.record.timer = TimerState::running_from(base_ms, self.now());
        self.emit(StateChange::ClockStarted);
    }

    /// Pause, then `HALF_TIME`
    pub fn call_half_time(&mut self) {
        self.pause_clock();
        self.change_period(Period::HalfTime);
    }

    /// `ADDED_TIME`; the clock keeps running
    pub fn start_added_time(&mut self) {
        self.change_period(Period::AddedTime);
    }

    /// Pause, then `FULL_TIME`
    pub fn end_match(&mut self) {
        self.pause_clock();
        self.change_period(Period::FullTime);
    }

    /// Starts the first half if the match has not kicked off yet.
    pub fn auto_start(&mut self) -> bool {
        if self.record.period != Period::PreMatch {
            return false;
        }
        self.start_first_half();
        true
    }

    /// Restores the most recent `{period, timer}` verbatim.
    pub fn undo_period(&mut self) -> Option<Period> {
        let entry = self.record.period_history.pop()?;
        self.record.period = entry.period;
        self.record.timer = entry.timer;
        self.emit(StateChange::PeriodRestored { period: entry.period });
        Some(entry.period)
    }

    // ========================
    // Goals & substitutions
    // ========================

    /// Returns the id of the new goal record.
    pub fn record_goal(&mut self, side: Side, scorer: &str) -> String {
        let now = self.now();
        let elapsed = self.record.timer.elapsed(now);
        let scorer = scorer.trim();

        let goal = GoalRecord {
            id: Uuid::new_v4().to_string(),
            seq: self.record.next_seq(),
            side,
            scorer: if scorer.is_empty() { UNKNOWN_SCORER.to_string() } else { scorer.to_string() },
            time_ms: elapsed,
            minute: match_minute(elapsed),
            period: self.record.period,
            timestamp: now,
        };

        let score = self.record.score.get_mut(side);
        *score = score.saturating_add(1);

        let id = goal.id.clone();
        self.record.last_event = Some(LastEvent::Goal(goal.clone()));
        self.record.goal_history.push(goal);
        self.emit(StateChange::GoalRecorded { id: id.clone(), side });
        id
    }

    /// Pops the latest goal and reverses its score, floored at zero.
    pub fn undo_goal(&mut self) -> Option<GoalRecord> {
        let goal = self.record.goal_history.pop()?;
        let score = self.record.score.get_mut(goal.side);
        *score = score.saturating_sub(1);
        self.record.last_event = self.record.latest_event();
        self.emit(StateChange::GoalUndone { id: goal.id.clone(), side: goal.side });
        Some(goal)
    }

    pub fn record_sub(
        &mut self,
        side: Side,
        kind: SubKind,
        in_name: Option<&str>,
        out_name: Option<&str>,
    ) -> String {
        let now = self.now();
        let elapsed = self.record.timer.elapsed(now);
        let clean = |name: Option<&str>| {
            name.map(str::trim).filter(|n| !n.is_empty()).map(str::to_string)
        };

        let sub = SubRecord {
            id: Uuid::new_v4().to_string(),
            seq: self.record.next_seq(),
            side,
            kind,
            in_name: clean(in_name),
            out_name: clean(out_name),
            time_ms: elapsed,
            minute: match_minute(elapsed),
            period: self.record.period,
            timestamp: now,
        };

        let id = sub.id.clone();
        self.record.last_event = Some(LastEvent::Sub(sub.clone()));
        self.record.sub_history.push(sub);
        self.emit(StateChange::SubRecorded { id: id.clone(), side });
        id
    }

    pub fn undo_sub(&mut self) -> Option<SubRecord> {
        let sub = self.record.sub_history.pop()?;
        self.record.last_event = self.record.latest_event();
        self.emit(StateChange::SubUndone { id: sub.id.clone(), side: sub.side });
        Some(sub)
    }

    // ========================
    // Setup & bulk edits
    // ========================

    /// Announced added time. Does not change period.
    pub fn set_extra_time(&mut self, minutes: u32) {
        let ms = u64::from(minutes) * MINUTE_MS;
        self.record.extra_time_ms = ms;
        self.emit(StateChange::ExtraTimeSet { ms });
    }

    /// Field-level merge over the known record schema
    pub fn apply_patch(&mut self, patch: &MatchPatch) -> bool {
        if patch.is_empty() {
            return false;
        }
        let now = self.now();
        patch.apply_to(&mut self.record, now);
        self.emit(StateChange::Patched);
        true
    }

    /// Team names and match duration from the operator setup
    pub fn apply_setup(&mut self, setup: &MatchSetup) -> bool {
        self.apply_patch(&MatchPatch::from_setup(setup))
    }
}
