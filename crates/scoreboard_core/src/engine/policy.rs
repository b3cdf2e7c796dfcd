//! Period advancement policy.
//!
//! Exactly one policy is active per deployment. Under `Manual` only operator
//! commands change the period. Under `Automatic` the driving loop calls
//! [`PeriodDriver::tick`] and transitions happen when thresholds are crossed:
//!
//! | from          | when                              | action                                |
//! |---------------|-----------------------------------|---------------------------------------|
//! | `FIRST_HALF`  | elapsed >= duration / 2           | pause, clamp clock, `HALF_TIME`       |
//! | `SECOND_HALF` | elapsed >= duration               | `ADDED_TIME`, clock keeps running     |
//! | `ADDED_TIME`  | elapsed >= duration + extra time  | pause, `FULL_TIME`                    |

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::MatchEngine;
use crate::models::Period;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AdvancePolicy {
    /// Only explicit operator action changes period
    #[default]
    Manual,
    /// Thresholds crossed on a driver tick advance the period
    Automatic,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PeriodDriver {
    policy: AdvancePolicy,
}

impl PeriodDriver {
    pub fn new(policy: AdvancePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> AdvancePolicy {
        self.policy
    }

    /// Returns the period entered on this tick, if any.
    pub fn tick(&self, engine: &mut MatchEngine) -> Option<Period> {
        if self.policy == AdvancePolicy::Manual {
            return None;
        }

        let elapsed = engine.elapsed_ms();
        let full = engine.match_duration_ms();
        let half = full / 2;

        let entered = match engine.period() {
            Period::FirstHalf if elapsed >= half => {
                engine.pause_clock();
                engine.set_clock(half);
                engine.set_period(Period::HalfTime);
                Period::HalfTime
            }
            Period::SecondHalf if elapsed >= full => {
                engine.start_added_time();
                Period::AddedTime
            }
            Period::AddedTime if elapsed >= full.saturating_add(engine.extra_time_ms()) => {
                engine.end_match();
                Period::FullTime
            }
            _ => return None,
        };

        info!(match_id = engine.match_id(), period = %entered, elapsed, "period advanced automatically");
        Some(entered)
    }
}
