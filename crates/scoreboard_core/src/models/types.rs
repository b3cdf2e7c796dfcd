use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[cfg_attr(test, derive(strum_macros::EnumIter))]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Home => "home",
            Side::Away => "away",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "home" | "h" => Ok(Side::Home),
            "away" | "a" => Ok(Side::Away),
            other => Err(CoreError::UnknownSide(other.to_string())),
        }
    }
}

/// Phase of the match lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[cfg_attr(test, derive(strum_macros::EnumIter))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Period {
    #[default]
    PreMatch,
    FirstHalf,
    HalfTime,
    SecondHalf,
    AddedTime,
    FullTime,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::PreMatch => "PRE_MATCH",
            Period::FirstHalf => "FIRST_HALF",
            Period::HalfTime => "HALF_TIME",
            Period::SecondHalf => "SECOND_HALF",
            Period::AddedTime => "ADDED_TIME",
            Period::FullTime => "FULL_TIME",
        }
    }

    /// Human-readable label for display surfaces
    pub fn label(&self) -> &'static str {
        match self {
            Period::PreMatch => "Pre-Match",
            Period::FirstHalf => "First Half",
            Period::HalfTime => "Half Time",
            Period::SecondHalf => "Second Half",
            Period::AddedTime => "Added Time",
            Period::FullTime => "Full Time",
        }
    }

    /// Elapsed-time boundary past which time counts as extra.
    ///
    /// `None` for phases without an overrun concept (pre-match, half-time).
    pub fn threshold_ms(&self, match_duration_ms: u64) -> Option<u64> {
        match self {
            Period::FirstHalf => Some(match_duration_ms / 2),
            Period::SecondHalf | Period::AddedTime | Period::FullTime => Some(match_duration_ms),
            Period::PreMatch | Period::HalfTime => None,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "PRE_MATCH" | "PREMATCH" => Ok(Period::PreMatch),
            "FIRST_HALF" | "1H" => Ok(Period::FirstHalf),
            "HALF_TIME" | "HALFTIME" | "HT" => Ok(Period::HalfTime),
            "SECOND_HALF" | "2H" => Ok(Period::SecondHalf),
            "ADDED_TIME" => Ok(Period::AddedTime),
            "FULL_TIME" | "FULLTIME" | "FT" => Ok(Period::FullTime),
            _ => Err(CoreError::UnknownPeriod(s.trim().to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TeamInfo {
    pub name: String,
}

impl TeamInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Teams {
    pub home: TeamInfo,
    pub away: TeamInfo,
}

impl Default for Teams {
    fn default() -> Self {
        Self { home: TeamInfo::new("Home"), away: TeamInfo::new("Away") }
    }
}

impl Teams {
    pub fn get(&self, side: Side) -> &TeamInfo {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

impl Score {
    pub fn get(&self, side: Side) -> u32 {
        match side {
            Side::Home => self.home,
            Side::Away => self.away,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut u32 {
        match side {
            Side::Home => &mut self.home,
            Side::Away => &mut self.away,
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}", self.home, self.away)
    }
}
