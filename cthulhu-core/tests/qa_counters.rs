//! QA tests for the counter engine: truth factor behavior, scene
//! contributions, and the reconciliation invariant.

use cthulhu_core::counters::{compute_scene_counters, sum_scene_counters, truth_factor};
use cthulhu_core::scene::VoteKind;
use cthulhu_core::store::{
    reconcile_counters, seeded_counters, CounterStore, MemoryCounterStore, MemorySceneStore,
    SceneStore,
};
use cthulhu_core::testing::{assert_counters_close, StoryHarness};
use cthulhu_core::{Faction, OutcomeKind, WinCounters};

#[test]
fn truth_factor_stays_bounded_everywhere() {
    for truth in 0..40 {
        for lie in 0..40 {
            let factor = truth_factor(truth, lie);
            assert!(
                (0.5..=2.0).contains(&factor),
                "factor {factor} out of bounds at truth={truth} lie={lie}"
            );
        }
    }
}

#[test]
fn truth_factor_is_neutral_on_ties() {
    for t in [0, 3, 17, 400] {
        assert_eq!(truth_factor(t, t), 1.0);
    }
}

#[tokio::test]
async fn untouched_scene_contributes_raw_outcome_delta() {
    // Scenario: success outcome, no votes. The truth factor is 1.0 and the
    // contribution equals the raw delta table entry.
    let mut harness = StoryHarness::new();
    harness.expect_scene("Opening", "But the record omits much.", "It begins.");
    let scenes = harness.run_articles(1).await.expect("run");

    let scene = &scenes[0];
    assert_eq!(scene.protagonists, Faction::Cultists);
    let raw = scene.outcome.counter_change(Faction::Cultists);
    assert_eq!(compute_scene_counters(scene), raw);
    assert_eq!(scene.scene_counters, raw);
}

#[tokio::test]
async fn strong_truth_consensus_amplifies_contribution() {
    // Scenario: ten truth votes against none pushes the factor to
    // tanh(10) + 1, within a rounding error of 2x.
    let mut harness = StoryHarness::new();
    harness.expect_scene("Opening", "But the record omits much.", "It begins.");
    let scenes = harness.run_articles(1).await.expect("run");

    let mut scene = scenes[0].clone();
    let raw = scene.scene_counters;
    for _ in 0..10 {
        scene.record_vote(VoteKind::Truth, None);
    }

    let amplified = compute_scene_counters(&scene);
    let expected = raw.scaled(10.0f64.tanh() + 1.0);
    assert_counters_close(&amplified, &expected);
    assert!(truth_factor(10, 0) > 1.9999);
}

#[tokio::test]
async fn amplified_failure_deepens_the_loss() {
    // Scenario: failure outcome with a 10-0 truth tally. The negative raw
    // delta is scaled by nearly 2x, not clamped.
    let mut harness = StoryHarness::new();
    harness.expect_scene("Setback", "But the record omits much.", "Summary.");
    let scenes = harness.run_articles(1).await.expect("run");

    let mut scene = scenes[0].clone();
    scene.outcome = OutcomeKind::Failure;
    for _ in 0..10 {
        scene.record_vote(VoteKind::Truth, None);
    }

    let counters = compute_scene_counters(&scene);
    let expected = OutcomeKind::Failure
        .counter_change(scene.protagonists)
        .scaled(10.0f64.tanh() + 1.0);
    assert_counters_close(&counters, &expected);
    assert!(counters.get(scene.protagonists) < -0.39);
}

#[test]
fn summation_is_order_independent_and_zero_based() {
    assert_eq!(sum_scene_counters([]), WinCounters::zero());

    let contributions = vec![
        OutcomeKind::Success.counter_change(Faction::Cultists),
        OutcomeKind::Failure.counter_change(Faction::Detectives),
        OutcomeKind::Mixed.counter_change(Faction::Cultists),
    ];
    let forward = sum_scene_counters(&contributions);
    let reversed: Vec<_> = contributions.iter().rev().cloned().collect();
    assert_eq!(forward, sum_scene_counters(&reversed));
}

#[tokio::test]
async fn reconciliation_matches_incremental_totals() {
    // Generate a few scenes, letting the director maintain the totals
    // incrementally, then recompute from scratch and compare.
    let mut harness = StoryHarness::new();
    for n in 1..=3 {
        harness.expect_scene(
            &format!("Scene {n}"),
            "But the record omits much.",
            "Summary so far.",
        );
    }
    harness.run_articles(3).await.expect("run");

    let incremental = harness.totals();
    let reconciled =
        reconcile_counters(&mut harness.scene_store, &mut harness.counter_store).expect("sweep");

    assert_eq!(reconciled, incremental);
    assert_eq!(harness.totals(), incremental);
}

#[tokio::test]
async fn votes_only_move_totals_through_the_sweep() {
    let mut harness = StoryHarness::new();
    harness.expect_scene("Voted", "But the record omits much.", "Summary.");
    harness.run_articles(1).await.expect("run");

    let before = harness.totals();
    for _ in 0..6 {
        harness
            .scene_store
            .record_vote(1, VoteKind::Truth, None)
            .expect("vote");
    }
    // Recording votes does not touch the totals.
    assert_eq!(harness.totals(), before);

    let after =
        reconcile_counters(&mut harness.scene_store, &mut harness.counter_store).expect("sweep");

    let stored = harness
        .scene_store
        .load_scene(1)
        .unwrap()
        .unwrap()
        .scene_counters;
    let mut expected = seeded_counters();
    expected.add(&stored);
    assert_counters_close(&after, &expected);
    assert_counters_close(&harness.counter_store.current().unwrap(), &expected);
}

#[test]
fn counter_limits_survive_resync() {
    let mut store = MemoryCounterStore::new();
    store
        .increment_counters(&WinCounters {
            cultists: 4.0,
            detectives: 2.0,
        })
        .expect("increment");

    store.sync_limits().expect("sync");
    let rows = store.get_counters().expect("rows");
    for row in rows {
        assert_eq!(row.limit_value, 30.0);
    }
    // The counters themselves were not reset by the limit sync.
    assert_eq!(store.current().unwrap().cultists, 5.0);
    assert_eq!(store.current().unwrap().detectives, 3.0);
}

#[test]
fn reconcile_on_empty_history_restores_seeds() {
    let mut scenes = MemorySceneStore::new();
    let mut counters = MemoryCounterStore::new();
    counters
        .set_counters(&WinCounters {
            cultists: 99.0,
            detectives: -4.0,
        })
        .expect("set");

    let totals = reconcile_counters(&mut scenes, &mut counters).expect("sweep");
    assert_eq!(totals, seeded_counters());
}
