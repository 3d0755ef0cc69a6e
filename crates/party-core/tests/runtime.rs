//! End-to-end runs of the cooperative runtime under paused time.

use party_core::{PartyConfig, PartyRuntime, RunSummary, RuntimeHandle};
use party_events::fixtures::{pair_catalog, sample_catalog};
use party_events::{Catalog, DisplayStatus, PartySnapshot};
use std::future::Future;
use std::time::Duration;
use tempfile::tempdir;

/// Arena small enough that any two guests start within talking range.
fn cozy_config(seed: u64) -> PartyConfig {
    let mut config = PartyConfig::default();
    config.world.arena_width = 200.0;
    config.world.arena_height = 200.0;
    config.schedule.seed = Some(seed);
    config
}

/// Runs the party alongside `script`, which must stop it.
async fn run_with<F, Fut>(config: PartyConfig, catalog: Catalog, script: F) -> RunSummary
where
    F: FnOnce(RuntimeHandle) -> Fut,
    Fut: Future<Output = ()>,
{
    let (runtime, handle) = PartyRuntime::new(config, catalog).unwrap();
    let (summary, ()) = tokio::join!(runtime.run(), script(handle));
    summary
}

#[tokio::test(start_paused = true)]
async fn test_cozy_pair_starts_talking() {
    let summary = run_with(cozy_config(1), pair_catalog(), |handle| async move {
        tokio::time::sleep(Duration::from_secs(3)).await;

        let snapshot = handle.latest_snapshot();
        assert_eq!(snapshot.entities.len(), 2);
        assert_eq!(snapshot.active_count(), 1);
        for entity in &snapshot.entities {
            assert_eq!(entity.status, DisplayStatus::Chatting);
        }
        let conversation = &snapshot.conversations[0];
        assert!(conversation.turn_count >= 1);
        assert!(conversation.last_text().is_some());

        handle.stop();
    })
    .await;

    assert!(summary.ticks >= 170, "only {} ticks", summary.ticks);
    assert!(summary.polls >= 6);
    assert_eq!(summary.conversations_started, 1);
    assert!(summary.turns_produced >= 1);
}

#[tokio::test(start_paused = true)]
async fn test_turn_reaches_snapshot_before_next_poll() {
    let mut config = cozy_config(7);
    config.conversation.latency_min_ms = 100;
    config.conversation.latency_max_ms = 100;
    config.schedule.poll_interval_ms = 500;

    run_with(config, pair_catalog(), |handle| async move {
        tokio::time::sleep(Duration::from_millis(300)).await;

        let snapshot = handle.latest_snapshot();
        assert_eq!(snapshot.active_count(), 1);
        for entity in &snapshot.entities {
            assert_eq!(entity.status, DisplayStatus::Chatting);
        }

        let turn = snapshot.conversations[0].last_turn.clone().unwrap();
        assert_eq!(turn.produced_at_ms, 100);
        assert!(turn.produced_at_ms <= snapshot.elapsed_ms);
        handle.stop();
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_tears_down_conversations() {
    let (runtime, handle) = PartyRuntime::new(cozy_config(2), pair_catalog()).unwrap();
    let observer = handle.clone();
    let script = async move {
        tokio::time::sleep(Duration::from_millis(1200)).await;
        handle.stop();
    };
    let (summary, ()) = tokio::join!(runtime.run(), script);

    assert_eq!(summary.conversations_started, 1);
    assert!(!observer.stop(), "runtime should be gone");
    assert!(!observer.pointer_down(0.0, 0.0));
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handles_stops_runtime() {
    let summary = run_with(cozy_config(3), pair_catalog(), |handle| async move {
        tokio::time::sleep(Duration::from_millis(700)).await;
        drop(handle);
    })
    .await;

    assert!(summary.ticks > 0);
}

#[tokio::test(start_paused = true)]
async fn test_pointer_pins_entity_under_cursor() {
    let summary = run_with(cozy_config(4), pair_catalog(), |handle| async move {
        tokio::time::sleep(Duration::from_millis(520)).await;
        let target = handle.latest_snapshot().entities[0].clone();
        assert!(!target.pinned);

        handle.pointer_down(target.x, target.y);
        tokio::time::sleep(Duration::from_millis(100)).await;
        let pinned_at = handle.positions().get(&target.id).unwrap();
        assert!(pinned_at.pinned);

        tokio::time::sleep(Duration::from_millis(500)).await;
        let later = handle.positions().get(&target.id).unwrap();
        assert_eq!(later.position, pinned_at.position);
        assert!(later.tick > pinned_at.tick);

        handle.stop();
    })
    .await;

    assert!(summary.ticks > 0);
}

#[tokio::test(start_paused = true)]
async fn test_snapshots_are_published_per_poll() {
    let mut config = cozy_config(5);
    config.world.arena_width = 2000.0;
    config.world.arena_height = 2000.0;

    run_with(config, sample_catalog(), |handle| async move {
        let mut snapshots = handle.snapshots();
        snapshots.borrow_and_update();

        snapshots.changed().await.unwrap();
        let first = snapshots.borrow_and_update().clone();
        snapshots.changed().await.unwrap();
        let second = snapshots.borrow_and_update().clone();

        assert_eq!(first.entities.len(), 12);
        assert!(second.tick > first.tick);
        assert!(second.elapsed_ms > first.elapsed_ms);
        handle.stop();
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_final_snapshot_round_trips_through_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("final.json");

    let (runtime, handle) = PartyRuntime::new(cozy_config(6), pair_catalog()).unwrap();
    let stopper = handle.clone();
    let (_, ()) = tokio::join!(runtime.run(), async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        stopper.stop();
    });

    let snapshot = handle.latest_snapshot();
    std::fs::write(&path, snapshot.to_json().unwrap()).unwrap();
    let loaded: PartySnapshot =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(loaded.conversations.len(), snapshot.conversations.len());
    assert_eq!(loaded.entities.len(), 2);
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = PartyConfig::default();
    config.conversation.disconnect_threshold = 100.0;
    assert!(PartyRuntime::new(config, pair_catalog()).is_err());
}

#[test]
fn test_config_file_loads() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("party.toml");
    std::fs::write(
        &path,
        "[conversation]\nconnect_threshold = 120.0\ndisconnect_threshold = 160.0\n",
    )
    .unwrap();

    let config = PartyConfig::from_file(&path).unwrap();
    assert_eq!(config.conversation.connect_threshold, 120.0);
    assert_eq!(config.schedule.tick_hz, 60.0);
}
