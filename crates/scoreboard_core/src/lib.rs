//! # scoreboard_core - Live Match Scoreboard Engine
//!
//! One authoritative writer owns the match state; any number of read-only
//! displays follow it over a local bus with a durable-storage fallback.
//!
//! ## Features
//! - Drift-free match clock (base offset + running-since epoch)
//! - Period transitions with a bounded undo stack
//! - Goal and substitution logs with independent undo
//! - Deduplicated single-writer fan-out with a polled mailbox fallback
//! - Smooth clock interpolation between snapshots on readers
//!
//! ```rust
//! use std::sync::Arc;
//! use scoreboard_core::clock::ManualClock;
//! use scoreboard_core::engine::MatchEngine;
//! use scoreboard_core::models::{Period, Side};
//!
//! let clock = ManualClock::new(0);
//! let mut engine = MatchEngine::new("demo", Arc::new(clock.clone()));
//! engine.start_first_half();
//! clock.advance(12 * 60_000);
//! engine.record_goal(Side::Home, "A. Smith");
//!
//! let snapshot = engine.snapshot();
//! assert_eq!(snapshot.record.period, Period::FirstHalf);
//! assert_eq!(snapshot.record.score.home, 1);
//! assert_eq!(snapshot.derived.elapsed_ms, 12 * 60_000);
//! ```

// Struct initialization pattern used intentionally
#![allow(clippy::field_reassign_with_default)]
// Large enum variants - boxing would require API changes
#![allow(clippy::large_enum_variant)]

pub mod clock;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod interpolator;
pub mod models;
pub mod reader;
pub mod store;
pub mod sync;

pub use clock::{ManualClock, SystemClock, TimeSource, TimerState};
pub use config::ScoreboardConfig;
pub use controller::{Command, MatchController};
pub use engine::{AdvancePolicy, MatchEngine, MatchPatch, PeriodDriver, StateChange};
pub use error::{CoreError, Result};
pub use models::{MatchRecord, Period, Side, Snapshot};
pub use reader::{ReaderUpdate, ScoreboardReader};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use sync::{Envelope, LocalBus, Role, SyncChannel};
