//! Structural merge over the known record schema.
//!
//! Only whitelisted fields exist on [`MatchPatch`], so unknown or reserved
//! keys in an incoming JSON patch are simply never read. Every level merges
//! field by field: `{"score": {"home": 3}}` leaves `score.away` alone.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{MatchRecord, MatchSetup, Period, TeamInfo};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TeamPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TeamsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home: Option<TeamPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub away: Option<TeamPatch>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ScorePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub away: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub running: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_ts: Option<u64>,
}

/// Partial record for bulk setup edits
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teams: Option<TeamsPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<ScorePatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer: Option<TimerPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_time_ms: Option<u64>,
}

impl MatchPatch {
    /// Malformed JSON yields `None`.
    pub fn from_json(json: &str) -> Option<Self> {
        match serde_json::from_str(json) {
            Ok(patch) => Some(patch),
            Err(e) => {
                debug!(error = %e, "rejected malformed patch");
                None
            }
        }
    }

    pub fn from_setup(setup: &MatchSetup) -> Self {
        let setup = setup.clone().normalized();
        Self {
            teams: Some(TeamsPatch {
                home: Some(TeamPatch { name: Some(setup.team_a.name.clone()) }),
                away: Some(TeamPatch { name: Some(setup.team_b.name.clone()) }),
            }),
            match_duration_ms: Some(setup.match_duration_ms()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merges into `record`, then re-establishes the timer invariant at `now`.
    pub fn apply_to(&self, record: &mut MatchRecord, now: u64) {
        if let Some(teams) = &self.teams {
            merge_team(&mut record.teams.home, teams.home.as_ref());
            merge_team(&mut record.teams.away, teams.away.as_ref());
        }

        if let Some(score) = self.score {
            if let Some(home) = score.home {
                record.score.home = home;
            }
            if let Some(away) = score.away {
                record.score.away = away;
            }
        }

        if let Some(period) = self.period {
            record.period = period;
        }

        if let Some(timer) = self.timer {
            if let Some(running) = timer.running {
                record.timer.running = running;
            }
            if let Some(base_ms) = timer.base_ms {
                record.timer.base_ms = base_ms;
            }
            if let Some(start_ts) = timer.start_ts {
                record.timer.start_ts = Some(start_ts);
            }
            record.timer.normalize(now);
        }

        if let Some(duration) = self.match_duration_ms {
            record.match_duration_ms = duration;
        }
        if let Some(extra) = self.extra_time_ms {
            record.extra_time_ms = extra;
        }
    }
}

fn merge_team(team: &mut TeamInfo, patch: Option<&TeamPatch>) {
    if let Some(name) = patch.and_then(|p| p.name.as_deref()) {
        team.name = name.to_string();
    }
}
