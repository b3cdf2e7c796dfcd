//! Operator setup and the persisted match-state document

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::record::MatchRecord;
use crate::clock::MINUTE_MS;
use crate::error::{CoreError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TeamSetup {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
}

/// Operator-entered configuration, consumed once when the writer starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchSetup {
    #[validate]
    pub team_a: TeamSetup,
    #[validate]
    pub team_b: TeamSetup,
    /// Full match length in minutes
    #[validate(range(min = 1, max = 240))]
    pub match_duration: u32,
}

impl Default for MatchSetup {
    fn default() -> Self {
        Self {
            team_a: TeamSetup { name: "Team A".to_string() },
            team_b: TeamSetup { name: "Team B".to_string() },
            match_duration: 90,
        }
    }
}

impl MatchSetup {
    pub fn new(home: impl Into<String>, away: impl Into<String>, match_duration: u32) -> Self {
        Self {
            team_a: TeamSetup { name: home.into() },
            team_b: TeamSetup { name: away.into() },
            match_duration,
        }
    }

    pub fn match_duration_ms(&self) -> u64 {
        u64::from(self.match_duration) * MINUTE_MS
    }

    /// Trims names; blank names fall back to the defaults.
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        self.team_a.name = self.team_a.name.trim().to_string();
        self.team_b.name = self.team_b.name.trim().to_string();
        if self.team_a.name.is_empty() {
            self.team_a.name = defaults.team_a.name;
        }
        if self.team_b.name.is_empty() {
            self.team_b.name = defaults.team_b.name;
        }
        self
    }

    /// Normalized and validated copy
    pub fn checked(self) -> Result<Self> {
        let setup = self.normalized();
        setup.validate().map_err(|e| CoreError::ValidationError(e.to_string()))?;
        Ok(setup)
    }
}

/// Presentation metadata stored next to the match record
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchMeta {
    pub home: String,
    pub away: String,
    /// Minutes
    pub duration: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub away_logo: Option<String>,
}

impl MatchMeta {
    pub fn from_record(record: &MatchRecord) -> Self {
        Self {
            home: record.teams.home.name.clone(),
            away: record.teams.away.name.clone(),
            duration: u32::try_from(record.match_duration_ms / MINUTE_MS).unwrap_or(u32::MAX),
            home_logo: None,
            away_logo: None,
        }
    }
}

/// Page-reload recovery document: `{meta, state}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PersistedMatch {
    #[serde(default)]
    pub meta: MatchMeta,
    pub state: MatchRecord,
    /// Writer clock when the document was saved, same scale as envelope `ts`
    #[serde(default)]
    pub ts: u64,
}
