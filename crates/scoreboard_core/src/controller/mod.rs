//! # Writer Session
//!
//! [`MatchController`] is the one authoritative process for a match id. It
//! owns the [`MatchEngine`], a writer-role [`SyncChannel`], the shared store
//! and the period driver. After every command (and every driver tick) it
//! drains the engine's change notifications and, if anything changed,
//! persists `{meta, state}` and broadcasts one snapshot.

mod command;


pub use command::Command;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::clock::TimeSource;
use crate::config::ScoreboardConfig;
use crate::engine::{MatchEngine, PeriodDriver};
use crate::models::{Period, Snapshot};
use crate::store::{load_persisted, load_setup, save_persisted, KeyValueStore};
use crate::sync::{Role, SyncChannel, SyncError, Transport};

pub struct MatchController {
    engine: MatchEngine,
    channel: SyncChannel,
    store: Arc<dyn KeyValueStore>,
    driver: PeriodDriver,
}

impl std::fmt::Debug for MatchController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchController")
            .field("engine", &self.engine)
            .field("channel", &self.channel)
            .field("policy", &self.driver.policy())
            .finish()
    }
}

impl MatchController {
    /// Restores the persisted record if one exists, applies the stored setup
    /// and announces the resulting state.
    pub fn start(
        match_id: &str,
        config: &ScoreboardConfig,
        time: Arc<dyn TimeSource>,
        store: Arc<dyn KeyValueStore>,
        primary: Option<Box<dyn Transport>>,
    ) -> Result<Self, SyncError> {
        let mut channel = SyncChannel::new(match_id, Role::Writer, &config.sync, Arc::clone(&time))?
            .with_store(Arc::clone(&store));
        if let Some(primary) = primary {
            channel = channel.with_primary(primary);
        }

        let mut engine = match load_persisted(store.as_ref(), match_id) {
            Some(persisted) => {
                info!(match_id, period = %persisted.state.period, score = %persisted.state.score, "restored persisted match");
                MatchEngine::restore(match_id, persisted.state, &config.engine, time)
            }
            None => MatchEngine::with_config(match_id, &config.engine, time),
        };

        if let Some(setup) = load_setup(store.as_ref(), match_id) {
            engine.apply_setup(&setup);
        }

        let mut controller = Self {
            engine,
            channel,
            store,
            driver: PeriodDriver::new(config.engine.advance_policy),
        };
        controller.engine.drain_changes();
        controller.publish();
        info!(match_id, policy = ?config.engine.advance_policy, "controller started");
        Ok(controller)
    }

    pub fn match_id(&self) -> &str {
        self.engine.match_id()
    }

    pub fn engine(&self) -> &MatchEngine {
        &self.engine
    }

    pub fn channel(&self) -> &SyncChannel {
        &self.channel
    }

    pub fn snapshot(&self) -> Snapshot {
        self.engine.snapshot()
    }

    /// Runs one command. Returns whether the match state changed.
    pub fn execute(&mut self, command: Command) -> bool {
        debug!(match_id = self.engine.match_id(), ?command, "executing command");
        let engine = &mut self.engine;
        match command {
            Command::StartClock => engine.start_clock(),
            Command::PauseClock => engine.pause_clock(),
            Command::ResetClock => engine.reset_clock(),
            Command::SetClock { ms } => engine.set_clock(ms),
            Command::SetPeriod { period } => engine.set_period(period),
            Command::StartFirstHalf => engine.start_first_half(),
            Command::StartSecondHalf => engine.start_second_half(),
            Command::CallHalfTime => engine.call_half_time(),
            Command::StartAddedTime => engine.start_added_time(),
            Command::EndMatch => engine.end_match(),
            Command::AutoStart => {
                engine.auto_start();
            }
            Command::UndoPeriod => {
                engine.undo_period();
            }
            Command::Goal { side, scorer } => {
                engine.record_goal(side, &scorer);
            }
            Command::UndoGoal => {
                engine.undo_goal();
            }
            Command::Sub { side, kind, in_name, out_name } => {
                engine.record_sub(side, kind, in_name.as_deref(), out_name.as_deref());
            }
            Command::UndoSub => {
                engine.undo_sub();
            }
            Command::SetExtraTime { minutes } => engine.set_extra_time(minutes),
            Command::ApplyPatch { patch } => {
                engine.apply_patch(&patch);
            }
            Command::ApplySetup { setup } => {
                engine.apply_setup(&setup);
            }
        }
        self.flush()
    }

    /// Parses and runs one operator line. Invalid input is logged and ignored.
    pub fn execute_line(&mut self, line: &str) -> bool {
        match Command::parse_line(line) {
            Ok(command) => self.execute(command),
            Err(e) => {
                warn!(match_id = self.engine.match_id(), input = line.trim(), error = %e, "ignored operator input");
                false
            }
        }
    }

    /// Driver step plus channel housekeeping. Returns the period entered
    /// automatically on this tick, if any.
    pub fn tick(&mut self) -> Option<Period> {
        let entered = self.driver.tick(&mut self.engine);
        for envelope in self.channel.tick() {
            debug!(match_id = self.engine.match_id(), from = %envelope.origin_id, kind = envelope.payload.kind(), "writer ignoring inbound envelope");
        }
        self.flush();
        entered
    }

    /// Persists and broadcasts if the engine reported changes.
    fn flush(&mut self) -> bool {
        let changes = self.engine.drain_changes();
        if changes.is_empty() {
            return false;
        }
        debug!(match_id = self.engine.match_id(), ?changes, "flushing state");
        self.publish();
        true
    }

    /// Persist first, so a reader polling storage is never behind the bus.
    fn publish(&mut self) {
        let snapshot = self.engine.snapshot();
        let now = self.engine.now();
        if let Err(e) = save_persisted(self.store.as_ref(), self.engine.match_id(), &snapshot.record, now) {
            warn!(match_id = self.engine.match_id(), error = %e, "failed to persist match state");
        }
        self.channel.broadcast(snapshot);
    }

    pub fn close(&mut self) {
        self.engine.drain_changes();
        self.channel.close();
        info!(match_id = self.engine.match_id(), "controller closed");
    }
}
