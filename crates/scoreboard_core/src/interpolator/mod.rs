//! # Timer Interpolator
//!
//! Advances the displayed clock between snapshots. It reads the last
//! snapshot's timer and never writes back; each [`TimerInterpolator::update`]
//! replaces its reference completely.

use std::collections::HashSet;

use tracing::debug;

use crate::clock::TimerState;
use crate::config::DisplayConfig;
use crate::models::{Period, Snapshot};

/// `MM:SS`, minutes unbounded
pub fn format_clock(ms: u64) -> String {
    let total = ms / 1000;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// `+M:SS` for time past the threshold
pub fn format_added(ms: u64) -> String {
    let total = ms / 1000;
    format!("+{}:{:02}", total / 60, total % 60)
}

/// `"45:00 +2:13"` once past the threshold, plain `MM:SS` before.
pub fn format_split(main_ms: u64, extra_ms: u64) -> String {
    if extra_ms >= 1000 {
        format!("{} {}", format_clock(main_ms), format_added(extra_ms))
    } else {
        format_clock(main_ms)
    }
}

/// One rendered clock value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub elapsed_ms: u64,
    pub main_ms: u64,
    pub extra_ms: u64,
    /// Plain `MM:SS` of the total elapsed time
    pub clock: String,
    /// `MM:SS` or `MM:SS +M:SS`
    pub display: String,
    pub running: bool,
    pub period: Period,
}

/// Fired once per `period:target` when the clock reaches the target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Milestone {
    pub period: Period,
    pub elapsed_ms: u64,
    pub target_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickOutput {
    /// `None` when throttled
    pub frame: Option<Frame>,
    pub milestone: Option<Milestone>,
}

#[derive(Debug, Clone, Copy)]
struct Reference {
    timer: TimerState,
    period: Period,
    match_duration_ms: u64,
    extra_time_ms: u64,
}

#[derive(Debug, Clone)]
pub struct TimerInterpolator {
    reference: Option<Reference>,
    render_interval_ms: u64,
    last_render_at: Option<u64>,
    dirty: bool,
    fired: HashSet<(Period, u64)>,
}

impl Default for TimerInterpolator {
    fn default() -> Self {
        Self::new(&DisplayConfig::default())
    }
}

impl TimerInterpolator {
    pub fn new(config: &DisplayConfig) -> Self {
        Self {
            reference: None,
            render_interval_ms: config.render_interval_ms,
            last_render_at: None,
            dirty: false,
            fired: HashSet::new(),
        }
    }

    /// Replaces the reference timer. The next tick renders unthrottled.
    pub fn update(&mut self, snapshot: &Snapshot) {
        let record = &snapshot.record;
        self.reference = Some(Reference {
            timer: record.timer,
            period: record.period,
            match_duration_ms: record.match_duration_ms,
            extra_time_ms: record.extra_time_ms,
        });
        self.dirty = true;
    }

    pub fn has_reference(&self) -> bool {
        self.reference.is_some()
    }

    /// Live elapsed time; frozen at `baseMs` while stopped.
    pub fn elapsed_at(&self, now: u64) -> Option<u64> {
        self.reference.map(|r| r.timer.elapsed(now))
    }

    /// Target for the current period: its threshold plus announced added time
    fn target_ms(reference: &Reference) -> Option<u64> {
        match reference.period {
            Period::FirstHalf | Period::SecondHalf | Period::AddedTime => reference
                .period
                .threshold_ms(reference.match_duration_ms)
                .map(|t| t.saturating_add(reference.extra_time_ms))
                .filter(|t| *t > 0),
            _ => None,
        }
    }

    pub fn frame_at(&self, now: u64) -> Option<Frame> {
        let reference = self.reference?;
        let elapsed_ms = reference.timer.elapsed(now);
        let threshold =
            reference.period.threshold_ms(reference.match_duration_ms).unwrap_or(elapsed_ms);
        let main_ms = elapsed_ms.min(threshold);
        let extra_ms = elapsed_ms.saturating_sub(threshold);

        Some(Frame {
            elapsed_ms,
            main_ms,
            extra_ms,
            clock: format_clock(elapsed_ms),
            display: format_split(main_ms, extra_ms),
            running: reference.timer.running,
            period: reference.period,
        })
    }

    /// One render-loop step.
    pub fn tick(&mut self, now: u64) -> TickOutput {
        let Some(reference) = self.reference else {
            return TickOutput::default();
        };
        let elapsed_ms = reference.timer.elapsed(now);

        let milestone = Self::target_ms(&reference).and_then(|target_ms| {
            if elapsed_ms >= target_ms && self.fired.insert((reference.period, target_ms)) {
                debug!(period = %reference.period, elapsed_ms, target_ms, "milestone reached");
                Some(Milestone { period: reference.period, elapsed_ms, target_ms })
            } else {
                None
            }
        });

        let due = self.dirty
            || self.last_render_at.map_or(true, |last| now.saturating_sub(last) >= self.render_interval_ms);
        let frame = if due {
            self.dirty = false;
            self.last_render_at = Some(now);
            self.frame_at(now)
        } else {
            None
        };

        TickOutput { frame, milestone }
    }

    pub fn reset_milestones(&mut self) {
        self.fired.clear();
    }
}
