//! # Reader Session
//!
//! A display process for one match: a reader-role [`SyncChannel`], the
//! mailbox fallback, periodic reads of the persisted match-state key and a
//! [`TimerInterpolator`]. Readers never hold a `MatchRecord` of their own,
//! only the last snapshot they accepted.

use std::sync::Arc;

use tracing::{debug, info};

use crate::clock::TimeSource;
use crate::config::ScoreboardConfig;
use crate::interpolator::{Frame, Milestone, TimerInterpolator};
use crate::models::{LastEvent, Snapshot};
use crate::store::{load_persisted, KeyValueStore};
use crate::sync::{Envelope, MailboxPoller, Payload, Role, SyncChannel, SyncError, Transport};

/// What changed on one reader tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReaderUpdate {
    /// A snapshot was applied on this tick
    pub snapshot_changed: bool,
    /// Goal or substitution not seen by this reader before
    pub new_event: Option<LastEvent>,
    pub frame: Option<Frame>,
    pub milestone: Option<Milestone>,
}

impl ReaderUpdate {
    fn note(&mut self, applied: Option<Option<LastEvent>>) {
        if let Some(event) = applied {
            self.snapshot_changed = true;
            if event.is_some() {
                self.new_event = event;
            }
        }
    }
}

pub struct ScoreboardReader {
    match_id: String,
    time: Arc<dyn TimeSource>,
    channel: SyncChannel,
    store: Option<Arc<dyn KeyValueStore>>,
    interpolator: TimerInterpolator,
    snapshot: Option<Snapshot>,
    latest_ts: u64,
    last_event_seq: Option<u64>,
    poll_interval_ms: u64,
    next_state_poll_at: u64,
}

impl std::fmt::Debug for ScoreboardReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreboardReader")
            .field("match_id", &self.match_id)
            .field("channel", &self.channel)
            .field("has_snapshot", &self.snapshot.is_some())
            .field("latest_ts", &self.latest_ts)
            .finish()
    }
}

impl ScoreboardReader {
    /// Connects and recovers from the persisted match-state key if present.
    pub fn open(
        match_id: &str,
        config: &ScoreboardConfig,
        time: Arc<dyn TimeSource>,
        primary: Option<Box<dyn Transport>>,
        store: Option<Arc<dyn KeyValueStore>>,
    ) -> Result<Self, SyncError> {
        let mut channel = SyncChannel::new(match_id, Role::Reader, &config.sync, Arc::clone(&time))?;
        if let Some(primary) = primary {
            channel = channel.with_primary(primary);
        }
        if let Some(store) = store.as_ref() {
            channel = channel.with_source(Box::new(MailboxPoller::new(
                Arc::clone(store),
                match_id,
                config.sync.poll_interval_ms,
            )));
        }

        let mut reader = Self {
            match_id: match_id.to_string(),
            time,
            channel,
            store,
            interpolator: TimerInterpolator::new(&config.display),
            snapshot: None,
            latest_ts: 0,
            last_event_seq: None,
            poll_interval_ms: config.sync.poll_interval_ms.max(1),
            next_state_poll_at: 0,
        };
        reader.poll_persisted();
        info!(match_id = %reader.match_id, recovered = reader.snapshot.is_some(), "reader opened");
        Ok(reader)
    }

    pub fn match_id(&self) -> &str {
        &self.match_id
    }

    pub fn channel(&self) -> &SyncChannel {
        &self.channel
    }

    /// Last accepted snapshot, if any
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn frame(&self) -> Option<Frame> {
        self.interpolator.frame_at(self.time.now_ms())
    }

    /// Replaces the current snapshot. Returns the last event if it is new
    /// to this reader.
    fn apply(&mut self, snapshot: Snapshot) -> Option<LastEvent> {
        let event = snapshot.record.last_event.clone();
        let seq = event.as_ref().map(LastEvent::seq);
        let primed = self.snapshot.is_some();
        let previous = self.last_event_seq;

        self.interpolator.update(&snapshot);
        self.snapshot = Some(snapshot);
        self.last_event_seq = seq;

        // the first snapshot only primes the tracker
        if !primed {
            return None;
        }
        match (seq, previous) {
            (Some(seq), Some(prev)) if seq > prev => event,
            (Some(_), None) => event,
            _ => None,
        }
    }

    /// Latest-wins: an envelope older than the newest applied one is dropped.
    fn apply_envelope(&mut self, envelope: Envelope) -> Option<Option<LastEvent>> {
        if envelope.ts < self.latest_ts {
            debug!(match_id = %self.match_id, id = %envelope.id, ts = envelope.ts, "stale envelope dropped");
            return None;
        }
        let Envelope { ts, payload, .. } = envelope;
        let Payload::State(snapshot) = payload else {
            return None;
        };
        self.latest_ts = ts;
        Some(self.apply(*snapshot))
    }

    /// Reads `{matchId}:state` and applies it when it differs from what is
    /// shown. Shares the latest-wins gate with envelopes.
    fn poll_persisted(&mut self) -> Option<Option<LastEvent>> {
        let now = self.time.now_ms();
        self.next_state_poll_at = now.saturating_add(self.poll_interval_ms);
        let store = self.store.as_ref()?;
        let persisted = load_persisted(store.as_ref(), &self.match_id)?;

        if persisted.ts < self.latest_ts {
            debug!(match_id = %self.match_id, ts = persisted.ts, latest = self.latest_ts, "stale persisted state skipped");
            return None;
        }
        self.latest_ts = persisted.ts;
        if self.snapshot.as_ref().is_some_and(|s| s.record == persisted.state) {
            return None;
        }
        debug!(match_id = %self.match_id, "applying persisted state");
        Some(self.apply(Snapshot::derive(&persisted.state, now)))
    }

    /// One scheduling step: drain the channel, poll storage when due, render.
    pub fn tick(&mut self) -> ReaderUpdate {
        let mut update = ReaderUpdate::default();
        if self.channel.is_closed() {
            return update;
        }

        for envelope in self.channel.tick() {
            let applied = self.apply_envelope(envelope);
            update.note(applied);
        }

        if self.time.now_ms() >= self.next_state_poll_at {
            let applied = self.poll_persisted();
            update.note(applied);
        }

        let output = self.interpolator.tick(self.time.now_ms());
        update.frame = output.frame;
        update.milestone = output.milestone;
        update
    }

    pub fn close(&mut self) {
        self.channel.close();
        info!(match_id = %self.match_id, "reader closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualClock, MINUTE_MS};
    use crate::models::{MatchRecord, Side};
    use crate::store::{mailbox_key, save_persisted, MemoryStore};
    use crate::sync::LocalBus;

    struct Rig {
        clock: ManualClock,
        bus: LocalBus,
        store: MemoryStore,
        writer: SyncChannel,
    }

    fn rig() -> Rig {
        let clock = ManualClock::new(10_000);
        let bus = LocalBus::new(16);
        let store = MemoryStore::new();
        let writer = SyncChannel::new(
            "m1",
            Role::Writer,
            &ScoreboardConfig::default().sync,
            Arc::new(clock.clone()),
        )
        .unwrap()
        .with_primary(Box::new(bus.connect().unwrap()));
        Rig { clock, bus, store, writer }
    }

    fn open_reader(rig: &Rig) -> ScoreboardReader {
        ScoreboardReader::open(
            "m1",
            &ScoreboardConfig::default(),
            Arc::new(rig.clock.clone()),
            Some(Box::new(rig.bus.connect().unwrap())),
            Some(Arc::new(rig.store.clone())),
        )
        .unwrap()
    }

    fn record_with_goal(seq: u64, home: u32) -> MatchRecord {
        let mut record = MatchRecord::default();
        record.score.home = home;
        record.goal_history.push(crate::models::GoalRecord {
            id: format!("g{}", seq),
            seq,
            side: Side::Home,
            scorer: "A. Smith".to_string(),
            time_ms: 0,
            minute: 1,
            period: record.period,
            timestamp: 0,
        });
        record.last_event = record.latest_event();
        record
    }

    #[test]
    fn test_late_join_recovers_persisted_state() {
        let rig = rig();
        save_persisted(&rig.store, "m1", &record_with_goal(1, 1), 10_000).unwrap();

        let mut reader = open_reader(&rig);
        assert_eq!(reader.snapshot().unwrap().record.score.home, 1);

        // recovered event is not announced as new
        let update = reader.tick();
        assert!(update.new_event.is_none());
        assert!(update.frame.is_some());
    }

    #[test]
    fn test_new_event_detection() {
        let mut rig = rig();
        let mut reader = open_reader(&rig);
        assert!(reader.snapshot().is_none());

        rig.writer.broadcast(Snapshot::derive(&record_with_goal(1, 1), 0));
        let update = reader.tick();
        assert!(update.snapshot_changed);
        assert!(update.new_event.is_none());

        rig.clock.advance(10);
        rig.writer.broadcast(Snapshot::derive(&record_with_goal(2, 2), 0));
        let update = reader.tick();
        assert_eq!(update.new_event.map(|e| e.id().to_string()), Some("g2".to_string()));

        // re-broadcast of the same state is not a new event
        rig.clock.advance(10);
        rig.writer.broadcast(Snapshot::derive(&record_with_goal(2, 2), 0));
        let update = reader.tick();
        assert!(update.snapshot_changed);
        assert!(update.new_event.is_none());
    }

    #[test]
    fn test_undo_does_not_announce_older_event() {
        let mut rig = rig();
        let mut reader = open_reader(&rig);
        rig.writer.broadcast(Snapshot::derive(&record_with_goal(1, 1), 0));
        reader.tick();
        rig.writer.broadcast(Snapshot::derive(&record_with_goal(2, 2), 0));
        reader.tick();

        rig.writer.broadcast(Snapshot::derive(&record_with_goal(1, 1), 0));
        let update = reader.tick();
        assert!(update.snapshot_changed);
        assert!(update.new_event.is_none());
        assert_eq!(reader.snapshot().unwrap().record.score.home, 1);
    }

    #[test]
    fn test_stale_envelope_is_ignored() {
        let rig = rig();
        let mut reader = open_reader(&rig);
        let mut publisher = rig.bus.connect().unwrap();

        let newer = Envelope::new(
            "m1",
            "w",
            Role::Writer,
            2_000,
            Payload::State(Box::new(Snapshot::derive(&record_with_goal(2, 2), 0))),
        );
        let older = Envelope::new(
            "m1",
            "w",
            Role::Writer,
            1_000,
            Payload::State(Box::new(Snapshot::derive(&record_with_goal(1, 1), 0))),
        );
        publisher.publish(&newer).unwrap();
        publisher.publish(&older).unwrap();

        reader.tick();
        assert_eq!(reader.snapshot().unwrap().record.score.home, 2);
    }

    #[test]
    fn test_persisted_and_envelopes_share_freshness() {
        let mut rig = rig();
        save_persisted(&rig.store, "m1", &record_with_goal(2, 2), 10_000).unwrap();
        let older = Envelope::new(
            "m1",
            "w",
            Role::Writer,
            9_990,
            Payload::State(Box::new(Snapshot::derive(&record_with_goal(1, 1), 0))),
        );
        rig.store.set(&mailbox_key("m1"), &older.encode().unwrap()).unwrap();

        let mut reader = open_reader(&rig);
        assert_eq!(reader.snapshot().unwrap().record.score.home, 2);

        // mailbox holds a state older than the recovered one
        let update = reader.tick();
        assert!(!update.snapshot_changed);
        assert_eq!(reader.snapshot().unwrap().record.score.home, 2);

        rig.clock.advance(1_000);
        let update = reader.tick();
        assert!(update.new_event.is_none());
        assert_eq!(reader.snapshot().unwrap().record.score.home, 2);

        rig.writer.broadcast(Snapshot::derive(&record_with_goal(3, 3), 0));
        let update = reader.tick();
        assert_eq!(update.new_event.map(|e| e.id().to_string()), Some("g3".to_string()));

        // persisted document now lags the bus
        rig.clock.advance(1_000);
        let update = reader.tick();
        assert!(!update.snapshot_changed);
        assert_eq!(reader.snapshot().unwrap().record.score.home, 3);
    }

    #[test]
    fn test_degraded_mode_follows_persisted_state() {
        let rig = rig();
        let mut reader = ScoreboardReader::open(
            "m1",
            &ScoreboardConfig::default(),
            Arc::new(rig.clock.clone()),
            None,
            Some(Arc::new(rig.store.clone())),
        )
        .unwrap();
        assert!(reader.snapshot().is_none());

        save_persisted(&rig.store, "m1", &record_with_goal(1, 1), 10_000).unwrap();
        assert!(!reader.tick().snapshot_changed);

        rig.clock.advance(1_000);
        let update = reader.tick();
        assert!(update.snapshot_changed);
        assert_eq!(reader.snapshot().unwrap().record.score.home, 1);
    }

    #[test]
    fn test_interpolates_between_snapshots() {
        let mut rig = rig();
        let mut reader = open_reader(&rig);
        let mut record = MatchRecord::default();
        record.timer = crate::clock::TimerState::running_from(0, 10_000);
        rig.writer.broadcast(Snapshot::derive(&record, 10_000));
        reader.tick();

        rig.clock.advance(MINUTE_MS + 5_000);
        assert_eq!(reader.frame().unwrap().clock, "01:05");
    }

    #[test]
    fn test_close() {
        let rig = rig();
        let mut reader = open_reader(&rig);
        reader.close();
        assert!(reader.channel().is_closed());
        assert_eq!(reader.tick(), ReaderUpdate::default());
    }
}
