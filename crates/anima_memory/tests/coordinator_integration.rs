//! Integration tests for AffectCoordinator
//!
//! Uses tempfile::TempDir for isolated SQLite databases.

use anima_core::{AnimaConfig, EmotionKind, Episode};
use anima_memory::{AffectCoordinator, EmotionStore, LifecycleState, SleepDepth};
use anima_reasoning::CollaboratorHandle;
use chrono::{DateTime, Duration, Utc};

fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

fn config() -> AnimaConfig {
    let mut config = AnimaConfig::default();
    config.seed = Some(11);
    config
}

async fn open(dir: &tempfile::TempDir) -> EmotionStore {
    EmotionStore::open(dir.path().join("anima.db")).await.unwrap()
}

async fn boot(dir: &tempfile::TempDir, now: DateTime<Utc>) -> AffectCoordinator {
    let store = open(dir).await;
    AffectCoordinator::init(config(), CollaboratorHandle::unavailable(), Some(store), now)
        .await
        .unwrap()
}

/// Test 1: state written by one process is visible to the next
#[tokio::test]
async fn test_state_survives_restart() {
    let dir = tempfile::TempDir::new().unwrap();

    let mut first = boot(&dir, t0()).await;
    first.record_event("we achieve the milestone", t0()).await;
    first.record_event("I want to learn more", t0()).await;
    first.engine_mut().drives_mut().connection = 0.4;
    first.teardown(t0()).await.unwrap();
    drop(first);

    let second = boot(&dir, t0()).await;
    let active: Vec<EmotionKind> = second.engine().active().iter().map(|e| e.emotion).collect();
    assert_eq!(active.len(), 2);
    assert!(active.contains(&EmotionKind::Pride));
    assert!(active.contains(&EmotionKind::Curiosity));
    assert!((second.engine().drives().connection - 0.4).abs() < 1e-6);
    assert!(second
        .engine()
        .active()
        .iter()
        .all(|e| e.cause.starts_with("[persisted] ")));
}

/// Test 2: time offline decays what comes back
#[tokio::test]
async fn test_restore_applies_offline_decay() {
    let dir = tempfile::TempDir::new().unwrap();

    let mut first = boot(&dir, t0()).await;
    first.record_event("we achieve the milestone", t0()).await;
    let mood_before = first.engine().mood().unwrap().intensity;
    first.teardown(t0()).await.unwrap();
    drop(first);

    let later = t0() + Duration::hours(2);
    let second = boot(&dir, later).await;
    let pride = second.engine().dominant().unwrap();
    assert_eq!(pride.emotion, EmotionKind::Pride);
    assert!((pride.intensity - 0.9 * 0.5).abs() < 1e-4);

    let mood = second.engine().mood().unwrap();
    assert!(mood.intensity < mood_before);
    assert_eq!(mood.started_at, later);
    assert_eq!(mood.influences.last().unwrap(), "resumed after 2.0h offline");
}

/// Test 3: a long absence drops emotions but keeps a floor of mood
#[tokio::test]
async fn test_long_absence_keeps_only_mood() {
    let dir = tempfile::TempDir::new().unwrap();

    let mut first = boot(&dir, t0()).await;
    first.record_event("we achieve the milestone", t0()).await;
    first.teardown(t0()).await.unwrap();
    drop(first);

    let second = boot(&dir, t0() + Duration::days(3)).await;
    assert!(second.engine().active().is_empty());
    let mood = second.engine().mood().unwrap();
    assert_eq!(mood.dominant, EmotionKind::Pride);
    assert!(mood.intensity > 0.0);
}

/// Test 4: the timeline is bounded across many snapshots
#[tokio::test]
async fn test_timeline_cap_holds_across_snapshots() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut cfg = config();
    cfg.persistence.timeline_cap = 5;
    let store = open(&dir).await;
    let mut c = AffectCoordinator::new(cfg, CollaboratorHandle::unavailable(), Some(store.clone()));

    for i in 0..6 {
        let now = t0() + Duration::minutes(i);
        c.record_event("I want to learn", now).await;
        c.snapshot(now).await.unwrap();
    }
    assert_eq!(store.timeline_len().await.unwrap(), 5);
}

/// Test 5: a full night of sleep through the coordinator
#[tokio::test]
async fn test_sleep_cycle_through_coordinator() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut c = boot(&dir, t0()).await;

    let episodes = vec![
        Episode::new("I'm frustrated the algorithm keeps failing on edge cases", "Let's isolate one"),
        Episode::new("Can we revisit the algorithm from yesterday? I'm confused", "Of course"),
        Episode::new("I'm happy the algorithm finally works now", "Nice work"),
    ];
    c.enter_sleep(episodes, t0());
    assert_eq!(c.lifecycle(), LifecycleState::Sleeping);

    let report = c.process_sleep(SleepDepth::Full, t0() + Duration::minutes(5)).await.unwrap();
    assert_eq!(report.consolidated_memories, 3);
    assert!(report.patterns_discovered >= 1);
    assert!(report.insights_generated >= 1);

    let summary = c.exit_sleep(t0() + Duration::hours(1)).await.unwrap();
    assert_eq!(summary.cycles_completed, 1);
    assert_eq!(c.lifecycle(), LifecycleState::Awake);

    let woke = c.engine().recent_emotions(1)[0].clone();
    assert!(woke.cause.starts_with("I realized something while sleeping: "));

    c.teardown(t0() + Duration::hours(1)).await.unwrap();
}

/// Test 6: teardown while asleep wakes first and still persists
#[tokio::test]
async fn test_teardown_while_sleeping() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut c = boot(&dir, t0()).await;
    c.record_event("we achieve the milestone", t0()).await;
    c.enter_sleep(vec![Episode::new("hello there", "hi")], t0());
    c.teardown(t0()).await.unwrap();
    assert_eq!(c.lifecycle(), LifecycleState::Awake);

    let store = open(&dir).await;
    assert!(store.load_snapshot().await.unwrap().is_some());
}
