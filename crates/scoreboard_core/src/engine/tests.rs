use std::sync::Arc;

use proptest::prelude::*;

use super::*;
use crate::clock::ManualClock;
use crate::config::EngineConfig;

const HALF: u64 = 45 * MINUTE_MS;
const FULL: u64 = 90 * MINUTE_MS;

fn create_test_engine() -> (MatchEngine, ManualClock) {
    let clock = ManualClock::new(1_700_000_000_000);
    let engine = MatchEngine::new("match-1", Arc::new(clock.clone()));
    (engine, clock)
}

#[test]
fn test_defaults() {
    let (engine, _) = create_test_engine();
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.record.period, Period::PreMatch);
    assert_eq!(snapshot.record.score, Score::default());
    assert_eq!(snapshot.record.match_duration_ms, FULL);
    assert!(!snapshot.record.timer.running);
    assert_eq!(snapshot.derived.elapsed_ms, 0);
    assert_eq!(engine.match_id(), "match-1");
}

#[test]
fn test_first_half_to_second_half_scenario() {
    let (mut engine, clock) = create_test_engine();

    engine.start_first_half();
    let s = engine.snapshot();
    assert_eq!(s.record.period, Period::FirstHalf);
    assert!(s.record.timer.running);
    assert_eq!(s.record.timer.base_ms, 0);

    clock.advance(HALF);
    engine.set_period(Period::HalfTime);
    engine.pause_clock();
    assert_eq!(engine.elapsed_ms(), HALF);

    clock.advance(15 * MINUTE_MS);
    assert_eq!(engine.elapsed_ms(), HALF);

    engine.start_second_half();
    let s = engine.snapshot();
    assert_eq!(s.record.period, Period::SecondHalf);
    assert_eq!(s.record.timer.base_ms, HALF);
    assert!(s.record.timer.running);

    clock.advance(10 * MINUTE_MS);
    assert_eq!(engine.elapsed_ms(), HALF + 10 * MINUTE_MS);
}

#[test]
fn test_second_half_ignores_drifted_first_half_value() {
    let (mut engine, clock) = create_test_engine();
    engine.start_first_half();
    clock.advance(HALF + 3 * MINUTE_MS);
    engine.call_half_time();
    assert_eq!(engine.elapsed_ms(), HALF + 3 * MINUTE_MS);

    engine.start_second_half();
    assert_eq!(engine.elapsed_ms(), HALF);
}

#[test]
fn test_clock_noops_emit_nothing() {
    let (mut engine, _) = create_test_engine();
    engine.pause_clock();
    assert!(!engine.has_pending_changes());

    engine.start_clock();
    assert_eq!(engine.drain_changes(), vec![StateChange::ClockStarted]);

    engine.start_clock();
    assert!(engine.drain_changes().is_empty());
}

#[test]
fn test_reset_and_set_clock() {
    let (mut engine, clock) = create_test_engine();
    engine.start_clock();
    clock.advance(5_000);
    engine.reset_clock();
    let s = engine.snapshot();
    assert_eq!(s.record.timer, TimerState::stopped(0));

    engine.set_clock(12 * MINUTE_MS);
    assert_eq!(engine.elapsed_ms(), 12 * MINUTE_MS);
    assert!(!engine.is_running());
}

#[test]
fn test_set_period_pushes_one_entry_per_change() {
    let (mut engine, _) = create_test_engine();
    engine.set_period(Period::PreMatch);
    assert!(engine.snapshot().record.period_history.is_empty());
    assert!(!engine.has_pending_changes());

    engine.set_period(Period::FullTime);
    engine.set_period(Period::FullTime);
    let history = engine.snapshot().record.period_history;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].period, Period::PreMatch);
}

#[test]
fn test_any_period_can_follow_any_other() {
    let (mut engine, _) = create_test_engine();
    engine.set_period(Period::FullTime);
    engine.set_period(Period::FirstHalf);
    engine.set_period(Period::PreMatch);
    assert_eq!(engine.period(), Period::PreMatch);
}

#[test]
fn test_undo_period_restores_exact_prior_state() {
    let (mut engine, clock) = create_test_engine();
    engine.start_first_half();
    clock.advance(20 * MINUTE_MS);
    let before = engine.snapshot().record;

    engine.set_period(Period::HalfTime);
    engine.pause_clock();
    assert_eq!(engine.undo_period(), Some(Period::FirstHalf));

    let after = engine.snapshot().record;
    assert_eq!(after.period, before.period);
    assert_eq!(after.timer, before.timer);
    assert_eq!(after.period_history, before.period_history);
}

#[test]
fn test_undo_period_on_empty_history_is_noop() {
    let (mut engine, _) = create_test_engine();
    assert_eq!(engine.undo_period(), None);
    assert!(!engine.has_pending_changes());
}

#[test]
fn test_period_history_is_capped() {
    let (mut engine, _) = create_test_engine();
    let cycle = [Period::FirstHalf, Period::HalfTime];
    for i in 0..25 {
        engine.set_period(cycle[i % 2]);
    }
    let history = engine.snapshot().record.period_history;
    assert_eq!(history.len(), PERIOD_HISTORY_CAP);
    // oldest entries dropped: the PRE_MATCH entry is gone
    assert!(history.iter().all(|e| e.period != Period::PreMatch));
}

#[test]
fn test_custom_history_cap() {
    let clock = ManualClock::new(0);
    let config = EngineConfig { period_history_cap: 2, ..EngineConfig::default() };
    let mut engine = MatchEngine::with_config("m", &config, Arc::new(clock));
    engine.set_period(Period::FirstHalf);
    engine.set_period(Period::HalfTime);
    engine.set_period(Period::SecondHalf);
    let history = engine.snapshot().record.period_history;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].period, Period::FirstHalf);
}

#[test]
fn test_record_goal_minute_and_history() {
    let (mut engine, clock) = create_test_engine();
    engine.start_first_half();
    clock.advance(23 * MINUTE_MS + 10_000);

    let id = engine.record_goal(Side::Home, "A. Smith");
    let s = engine.snapshot();
    assert_eq!(s.record.score.home, 1);
    let goal = &s.record.goal_history[0];
    assert_eq!(goal.id, id);
    assert_eq!(goal.minute, 24);
    assert_eq!(goal.period, Period::FirstHalf);
    assert_eq!(goal.scorer, "A. Smith");
    assert_eq!(s.record.last_event.as_ref().map(LastEvent::id), Some(id.as_str()));
}

#[test]
fn test_goal_before_kickoff_is_minute_one() {
    let (mut engine, _) = create_test_engine();
    engine.record_goal(Side::Away, "   ");
    let goal = engine.snapshot().record.goal_history[0].clone();
    assert_eq!(goal.minute, 1);
    assert_eq!(goal.scorer, UNKNOWN_SCORER);
}

#[test]
fn test_goal_ids_are_unique() {
    let (mut engine, _) = create_test_engine();
    let a = engine.record_goal(Side::Home, "x");
    let b = engine.record_goal(Side::Home, "x");
    assert_ne!(a, b);
}

#[test]
fn test_record_then_undo_restores_score() {
    let (mut engine, _) = create_test_engine();
    engine.record_goal(Side::Away, "B");
    let before = engine.score();
    engine.record_goal(Side::Home, "A");
    let undone = engine.undo_goal().unwrap();
    assert_eq!(undone.side, Side::Home);
    assert_eq!(engine.score(), before);
}

#[test]
fn test_undo_goal_on_empty_history_is_noop() {
    let (mut engine, _) = create_test_engine();
    assert!(engine.undo_goal().is_none());
    assert_eq!(engine.score(), Score::default());
    assert!(!engine.has_pending_changes());
}

#[test]
fn test_undo_goal_never_goes_negative() {
    let (mut engine, _) = create_test_engine();
    engine.record_goal(Side::Home, "A");
    engine.apply_patch(&MatchPatch {
        score: Some(ScorePatch { home: Some(0), away: None }),
        ..MatchPatch::default()
    });
    engine.undo_goal();
    assert_eq!(engine.score().home, 0);
}

#[test]
fn test_last_event_after_undo_points_to_surviving_event() {
    let (mut engine, _) = create_test_engine();
    let home = engine.record_goal(Side::Home, "A. Smith");
    engine.record_goal(Side::Away, "B. Jones");
    engine.undo_goal();

    let s = engine.snapshot();
    assert_eq!(s.record.score, Score { home: 1, away: 0 });
    assert!(s.record.sub_history.is_empty());
    match s.record.last_event {
        Some(LastEvent::Goal(goal)) => assert_eq!(goal.id, home),
        other => panic!("unexpected last event {:?}", other),
    }
}

#[test]
fn test_last_event_across_event_types() {
    let (mut engine, _) = create_test_engine();
    engine.record_goal(Side::Home, "A");
    let sub = engine.record_sub(Side::Away, SubKind::Swap, Some("C"), Some("D"));

    // undoing the goal leaves the later substitution as the latest event
    engine.undo_goal();
    assert_eq!(engine.snapshot().record.last_event.map(|e| e.id().to_string()), Some(sub));

    engine.undo_sub();
    assert!(engine.snapshot().record.last_event.is_none());
}

#[test]
fn test_sub_history_is_independent_of_goals() {
    let (mut engine, clock) = create_test_engine();
    engine.start_first_half();
    clock.advance(61 * 1000);
    engine.record_sub(Side::Home, SubKind::In, Some(" Keane "), None);
    engine.record_goal(Side::Home, "A");
    engine.undo_goal();

    let s = engine.snapshot();
    assert_eq!(s.record.sub_history.len(), 1);
    let sub = &s.record.sub_history[0];
    assert_eq!(sub.in_name.as_deref(), Some("Keane"));
    assert_eq!(sub.out_name, None);
    assert_eq!(sub.minute, 2);

    assert!(engine.undo_sub().is_some());
    assert!(engine.undo_sub().is_none());
    assert_eq!(engine.score().home, 0);
}

#[test]
fn test_set_extra_time_does_not_change_period() {
    let (mut engine, _) = create_test_engine();
    engine.start_first_half();
    engine.drain_changes();
    engine.set_extra_time(4);
    let s = engine.snapshot();
    assert_eq!(s.record.extra_time_ms, 4 * MINUTE_MS);
    assert_eq!(s.derived.added_time_min, 4);
    assert_eq!(s.record.period, Period::FirstHalf);
    assert_eq!(engine.drain_changes(), vec![StateChange::ExtraTimeSet { ms: 4 * MINUTE_MS }]);
}

#[test]
fn test_apply_patch_merges_fields() {
    let (mut engine, _) = create_test_engine();
    engine.record_goal(Side::Away, "B");
    let patch = MatchPatch::from_json(r#"{"score":{"home":3}}"#).unwrap();
    assert!(engine.apply_patch(&patch));
    assert_eq!(engine.score(), Score { home: 3, away: 1 });

    assert!(!engine.apply_patch(&MatchPatch::default()));
}

#[test]
fn test_apply_setup() {
    let (mut engine, _) = create_test_engine();
    engine.apply_setup(&MatchSetup::new("Rovers", "United", 80));
    let s = engine.snapshot();
    assert_eq!(s.record.teams.home.name, "Rovers");
    assert_eq!(s.record.teams.away.name, "United");
    assert_eq!(s.record.match_duration_ms, 80 * MINUTE_MS);
}

#[test]
fn test_snapshot_is_independent() {
    let (mut engine, _) = create_test_engine();
    let mut snapshot = engine.snapshot();
    snapshot.record.score.home = 99;
    snapshot.record.goal_history.clear();
    engine.record_goal(Side::Home, "A");
    assert_eq!(engine.score().home, 1);
    assert_eq!(snapshot.record.score.home, 99);
}

#[test]
fn test_auto_start_only_from_pre_match() {
    let (mut engine, _) = create_test_engine();
    assert!(engine.auto_start());
    assert_eq!(engine.period(), Period::FirstHalf);
    assert!(engine.is_running());
    assert!(!engine.auto_start());
}

#[test]
fn test_end_match_pauses() {
    let (mut engine, clock) = create_test_engine();
    engine.start_second_half();
    clock.advance(MINUTE_MS);
    engine.end_match();
    assert_eq!(engine.period(), Period::FullTime);
    assert!(!engine.is_running());
    assert_eq!(engine.elapsed_ms(), HALF + MINUTE_MS);
}

#[test]
fn test_restore_sanitizes_record() {
    let clock = ManualClock::new(500);
    let mut record = MatchRecord::default();
    record.score.home = 2;
    record.timer = TimerState { running: true, base_ms: 10, start_ts: None };
    let engine =
        MatchEngine::restore("m", record, &EngineConfig::default(), Arc::new(clock.clone()));
    let s = engine.snapshot();
    assert_eq!(s.record.score.home, 2);
    assert_eq!(s.record.timer.start_ts, Some(500));
    assert!(!engine.has_pending_changes());
}

#[derive(Debug, Clone)]
enum Op {
    Goal(Side),
    UndoGoal,
    Sub(Side),
    UndoSub,
    Advance(u64),
    Start,
    Pause,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let side = prop_oneof![Just(Side::Home), Just(Side::Away)];
    prop_oneof![
        side.clone().prop_map(Op::Goal),
        Just(Op::UndoGoal),
        side.prop_map(Op::Sub),
        Just(Op::UndoSub),
        (0u64..120_000).prop_map(Op::Advance),
        Just(Op::Start),
        Just(Op::Pause),
    ]
}

proptest! {
    #[test]
    fn prop_score_matches_goal_history(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let (mut engine, clock) = create_test_engine();
        let mut last_elapsed = 0;

        for op in ops {
            match op {
                Op::Goal(side) => { engine.record_goal(side, "p"); }
                Op::UndoGoal => { engine.undo_goal(); }
                Op::Sub(side) => { engine.record_sub(side, SubKind::Swap, Some("a"), Some("b")); }
                Op::UndoSub => { engine.undo_sub(); }
                Op::Advance(ms) => clock.advance(ms),
                Op::Start => engine.start_clock(),
                Op::Pause => engine.pause_clock(),
            }

            let s = engine.snapshot();
            let home = s.record.goal_history.iter().filter(|g| g.side == Side::Home).count();
            let away = s.record.goal_history.iter().filter(|g| g.side == Side::Away).count();
            prop_assert_eq!(s.record.score.home as usize, home);
            prop_assert_eq!(s.record.score.away as usize, away);
            prop_assert!(s.record.timer.is_consistent());
            prop_assert!(s.derived.elapsed_ms >= last_elapsed);
            prop_assert_eq!(&s.record.last_event, &s.record.latest_event());
            last_elapsed = s.derived.elapsed_ms;
        }
    }
}
