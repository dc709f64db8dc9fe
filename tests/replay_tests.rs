//! Replay tests over the fixture tree.
//!
//! Every recorded trace under `fixtures/traces` must replay without a
//! single mismatch.

use std::path::PathBuf;

use puzzle_harness::model::registry::TraceVerdict;
use puzzle_harness::{
    replay, Catalog, Cellularena, GameKind, HarnessError, Model, Registry, SimResult, Trace,
    TraceEntry,
};
use serde_json::json;

fn registry() -> Registry {
    Registry::new(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures"))
}

/// Test that every model has fixtures and every trace replays cleanly.
#[test]
fn test_all_fixture_traces_match() {
    let registry = registry();
    for kind in GameKind::ALL {
        assert!(!registry.test_cases(kind).is_empty(), "{kind} has no test cases");
        let checks = registry.check_traces(kind);
        assert!(!checks.is_empty(), "{kind} has no traces");
        for check in checks {
            assert_eq!(check.verdict, TraceVerdict::Ok, "{kind}/{}", check.trace);
        }
    }
}

/// Test the single-trace path and its summary.
#[test]
fn test_replay_summary() {
    let summary = registry().replay(GameKind::TheFall, "turn_the_pipe").unwrap();
    assert!(summary.is_ok());
    assert_eq!(summary.turns, 2);
    assert_eq!(summary.test_case, "turn_the_pipe");
    assert_eq!(summary.result, SimResult::success());
}

/// Test the multi-agent fixture, including a `null` command slot.
#[test]
fn test_multi_agent_trace() {
    let registry = registry();
    let trace = registry.load_trace(GameKind::Cellularena, "duel_opening").unwrap();
    assert!(trace.is_multi_agent());

    let summary = registry.replay(GameKind::Cellularena, "duel_opening").unwrap();
    assert!(summary.is_ok(), "{:?}", summary.mismatches);
    assert_eq!(
        summary.result,
        SimResult::success_because("no progress - all WAIT")
    );
}

/// Test that a wrong expectation is caught at the right turn.
#[test]
fn test_mismatch_turn_is_reported() {
    let registry = registry();
    let mut trace = registry.load_trace(GameKind::MarsLander, "flat_zone_descent").unwrap();
    trace.cg_trace[2].expected.insert("fuel".into(), json!(999));

    let model = puzzle_harness::MarsLander::new(Catalog::from_dir(
        &registry.root().join("tests").join("mars_lander"),
    ));
    let report = replay(&model, "edited", &trace).unwrap();
    assert_eq!(report.mismatches.len(), 1);
    let first = report.first_mismatch().unwrap();
    assert_eq!(first.turn, 3);
    assert_eq!(first.diffs, vec!["fuel: got 544, expected 999".to_string()]);
    // Replay goes on after a state mismatch.
    assert_eq!(report.turns(), trace.len());
}

/// Test that a growth collision replays the same way twice.
#[test]
fn test_collision_replay_is_idempotent() {
    let case = serde_json::from_value(json!({
        "width": 3,
        "height": 1,
        "entities": [
            { "x": 0, "y": 0, "type": "ROOT", "owner": 0, "organId": 1, "organRootId": 1 },
            { "x": 2, "y": 0, "type": "ROOT", "owner": 1, "organId": 2, "organRootId": 2 }
        ]
    }))
    .unwrap();
    let model = Cellularena::new(Catalog::new().with("corridor", case));
    let trace = Trace {
        test_case: Some("corridor".into()),
        cg_trace: vec![TraceEntry::multi(
            1,
            vec![Some("GROW 1 1 0 BASIC".into()), Some("GROW 2 1 0 BASIC".into())],
        )
        .expect("proteins", json!({ "0": { "A": 10 }, "1": { "A": 10 } }))],
    };

    let first = replay(&model, "corridor", &trace).unwrap();
    let second = replay(&model, "corridor", &trace).unwrap();
    assert!(first.is_ok(), "{:?}", first.mismatches);
    assert_eq!(
        model.describe(first.trajectory.last_state()),
        model.describe(second.trajectory.last_state())
    );
    let wall = first.trajectory.last_state().tiles.get(&puzzle_harness::GridPos::new(1, 0));
    assert_eq!(wall.map(|tile| tile.type_name()), Some("WALL"));
}

/// Test that a missing trace is an error, not an empty report.
#[test]
fn test_unknown_trace() {
    assert!(matches!(
        registry().replay(GameKind::ThereIsNoSpoon, "nope"),
        Err(HarnessError::TraceNotFound { .. })
    ));
}
