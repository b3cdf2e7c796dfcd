use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::events::{GoalRecord, LastEvent, SubRecord};
use super::types::{Period, Score, Teams};
use crate::clock::{TimerState, MINUTE_MS};

/// Default full match length (90 minutes)
pub const DEFAULT_MATCH_DURATION_MS: u64 = 90 * MINUTE_MS;

/// Period-undo entry: where the match was before a transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PeriodEntry {
    pub period: Period,
    pub timer: TimerState,
    pub timestamp: u64,
}

/// Canonical match record, owned by the writer's engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchRecord {
    pub teams: Teams,
    pub score: Score,
    pub period: Period,
    pub timer: TimerState,
    pub match_duration_ms: u64,
    pub extra_time_ms: u64,
    pub goal_history: Vec<GoalRecord>,
    pub sub_history: Vec<SubRecord>,
    pub period_history: Vec<PeriodEntry>,
    pub last_event: Option<LastEvent>,
}

impl Default for MatchRecord {
    fn default() -> Self {
        Self {
            teams: Teams::default(),
            score: Score::default(),
            period: Period::PreMatch,
            timer: TimerState::default(),
            match_duration_ms: DEFAULT_MATCH_DURATION_MS,
            extra_time_ms: 0,
            goal_history: Vec::new(),
            sub_history: Vec::new(),
            period_history: Vec::new(),
            last_event: None,
        }
    }
}

impl MatchRecord {
    pub fn half_duration_ms(&self) -> u64 {
        self.match_duration_ms / 2
    }

    /// Next sequence number for an appended event
    pub fn next_seq(&self) -> u64 {
        let last_goal = self.goal_history.last().map(|g| g.seq);
        let last_sub = self.sub_history.last().map(|s| s.seq);
        last_goal.max(last_sub).map_or(1, |seq| seq.saturating_add(1))
    }

    /// Most recent surviving goal or substitution
    pub fn latest_event(&self) -> Option<LastEvent> {
        match (self.goal_history.last(), self.sub_history.last()) {
            (Some(goal), Some(sub)) if sub.seq > goal.seq => Some(LastEvent::Sub(sub.clone())),
            (Some(goal), _) => Some(LastEvent::Goal(goal.clone())),
            (None, Some(sub)) => Some(LastEvent::Sub(sub.clone())),
            (None, None) => None,
        }
    }

    /// Repairs a record decoded from storage: timer invariant and score floor
    /// are re-established rather than trusted.
    pub fn sanitize(&mut self, now: u64) {
        self.timer.normalize(now);
        for entry in &mut self.period_history {
            entry.timer.normalize(entry.timestamp);
        }
        if let Some(last) = &self.last_event {
            let known = match last {
                LastEvent::Goal(g) => self.goal_history.iter().any(|x| x.id == g.id),
                LastEvent::Sub(s) => self.sub_history.iter().any(|x| x.id == s.id),
            };
            if !known {
                self.last_event = self.latest_event();
            }
        }
    }
}
