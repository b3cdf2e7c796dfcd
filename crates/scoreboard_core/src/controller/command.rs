//! Operator commands, from JSON or from free text.
//!
//! Free-text grammar, one command per line:
//!
//! ```text
//! start | pause | reset | clock <MM:SS|minutes>
//! kickoff | second-half | half-time | added-time | end | auto-start
//! period <PERIOD> | undo-period
//! goal <home|away> [scorer name...] | undo-goal
//! sub <home|away> in <name> | sub <home|away> out <name>
//! sub <home|away> swap <in name> / <out name> | undo-sub
//! extra <minutes> | patch <json>
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::clock::MINUTE_MS;
use crate::engine::MatchPatch;
use crate::error::{CoreError, Result};
use crate::models::{MatchSetup, Period, Side, SubKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    StartClock,
    PauseClock,
    ResetClock,
    SetClock { ms: u64 },
    SetPeriod { period: Period },
    StartFirstHalf,
    StartSecondHalf,
    CallHalfTime,
    StartAddedTime,
    EndMatch,
    AutoStart,
    UndoPeriod,
    Goal {
        side: Side,
        #[serde(default)]
        scorer: String,
    },
    UndoGoal,
    #[serde(rename_all = "camelCase")]
    Sub {
        side: Side,
        kind: SubKind,
        #[serde(default)]
        in_name: Option<String>,
        #[serde(default)]
        out_name: Option<String>,
    },
    UndoSub,
    SetExtraTime { minutes: u32 },
    ApplyPatch { patch: MatchPatch },
    ApplySetup { setup: MatchSetup },
}

impl Command {
    /// JSON object or free-text line
    pub fn parse_line(line: &str) -> Result<Self> {
        let line = line.trim();
        if line.starts_with('{') {
            return Ok(serde_json::from_str(line)?);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "start" => Command::StartClock,
            "pause" | "stop" => Command::PauseClock,
            "reset" => Command::ResetClock,
            "clock" => Command::SetClock { ms: parse_clock(rest)? },
            "period" => Command::SetPeriod { period: Period::from_str(rest)? },
            "kickoff" | "first-half" => Command::StartFirstHalf,
            "second-half" => Command::StartSecondHalf,
            "half-time" | "halftime" | "ht" => Command::CallHalfTime,
            "added-time" => Command::StartAddedTime,
            "end" | "full-time" | "ft" => Command::EndMatch,
            "auto-start" => Command::AutoStart,
            "undo-period" => Command::UndoPeriod,
            "goal" => {
                let (side, scorer) = split_side(rest)?;
                Command::Goal { side, scorer: scorer.to_string() }
            }
            "undo-goal" | "undo" => Command::UndoGoal,
            "sub" => parse_sub(rest)?,
            "undo-sub" => Command::UndoSub,
            "extra" => Command::SetExtraTime {
                minutes: rest.parse().map_err(|_| {
                    CoreError::InvalidParameter(format!("extra minutes '{}'", rest))
                })?,
            },
            "patch" => Command::ApplyPatch { patch: serde_json::from_str(rest)? },
            "" => return Err(CoreError::UnknownCommand(String::new())),
            other => return Err(CoreError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }
}

impl FromStr for Command {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_line(s)
    }
}

fn split_side(rest: &str) -> Result<(Side, &str)> {
    let (side, tail) = match rest.split_once(char::is_whitespace) {
        Some((side, tail)) => (side, tail.trim()),
        None => (rest, ""),
    };
    Ok((Side::from_str(side)?, tail))
}

fn parse_sub(rest: &str) -> Result<Command> {
    let (side, tail) = split_side(rest)?;
    let (kind, names) = match tail.split_once(char::is_whitespace) {
        Some((kind, names)) => (kind, names.trim()),
        None => (tail, ""),
    };
    let kind = SubKind::from_str(kind)?;
    let name = |s: &str| Some(s.trim().to_string()).filter(|n| !n.is_empty());

    let (in_name, out_name) = match kind {
        SubKind::In => (name(names), None),
        SubKind::Out => (None, name(names)),
        SubKind::Swap => match names.split_once('/') {
            Some((on, off)) => (name(on), name(off)),
            None => (name(names), None),
        },
    };
    Ok(Command::Sub { side, kind, in_name, out_name })
}

/// `MM:SS` or whole minutes
fn parse_clock(value: &str) -> Result<u64> {
    let invalid = || CoreError::InvalidParameter(format!("clock value '{}'", value));
    match value.split_once(':') {
        Some((m, s)) => {
            let minutes: u64 = m.trim().parse().map_err(|_| invalid())?;
            let seconds: u64 = s.trim().parse().map_err(|_| invalid())?;
            if seconds >= 60 {
                return Err(invalid());
            }
            minutes
                .checked_mul(MINUTE_MS)
                .and_then(|ms| ms.checked_add(seconds * 1000))
                .ok_or_else(invalid)
        }
        None => {
            let minutes: u64 = value.parse().map_err(|_| invalid())?;
            minutes.checked_mul(MINUTE_MS).ok_or_else(invalid)
        }
    }
}
