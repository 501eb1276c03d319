//! Affect Coordinator - owns the engine, the sleep pipeline and the store
//!
//! This is the explicit state object behind every inbound entry point:
//! - `init` restores from the store, `teardown` snapshots to it
//! - `record_event` / `tick` drive the affective engine
//! - `enter_sleep` / `process_sleep` / `exit_sleep` drive consolidation
//!
//! The coordinator is single-writer. A background maintenance task may share
//! it behind a `tokio::sync::Mutex`.

use std::sync::Arc;
use std::time::Duration;

use anima_core::random::from_seed;
use anima_core::{AnimaConfig, EmotionalState, Episode};
use anima_limbic::AffectiveEngine;
use anima_reasoning::CollaboratorHandle;
use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::codec;
use crate::consolidation::{CycleReport, SleepConsolidator, SleepDepth, SleepSummary};
use crate::dream::clip;
use crate::error::{PersistenceError, SleepError};
use crate::sqlite::{Baselines, EmotionStore};

/// Window used when checking for baseline drift.
const BASELINE_WINDOW_HOURS: i64 = 48;

/// System lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Normal operation
    Awake,
    /// Between `enter_sleep` and `exit_sleep`
    Sleeping,
}

pub struct AffectCoordinator {
    config: AnimaConfig,
    engine: AffectiveEngine,
    sleep: SleepConsolidator,
    store: Option<EmotionStore>,
    lifecycle: LifecycleState,
    slept_at: Option<DateTime<Utc>>,
}

impl AffectCoordinator {
    /// Fresh coordinator with nothing restored.
    pub fn new(config: AnimaConfig, collaborator: CollaboratorHandle, store: Option<EmotionStore>) -> Self {
        // separate streams so sleep does not perturb the engine's draws
        let engine_rng = from_seed(config.seed);
        let sleep_rng = from_seed(config.seed.map(|s| s.wrapping_add(1)));

        let engine = AffectiveEngine::new(&config.affect, collaborator.clone(), engine_rng);
        let sleep = SleepConsolidator::new(config.sleep.clone(), collaborator, sleep_rng);

        Self {
            config,
            engine,
            sleep,
            store,
            lifecycle: LifecycleState::Awake,
            slept_at: None,
        }
    }

    /// Build and restore from the store if one is attached.
    pub async fn init(
        config: AnimaConfig,
        collaborator: CollaboratorHandle,
        store: Option<EmotionStore>,
        now: DateTime<Utc>,
    ) -> Result<Self, PersistenceError> {
        let mut coordinator = Self::new(config, collaborator, store);
        if !coordinator.restore(now).await? {
            tracing::info!("No persisted emotional state found, starting fresh");
        }
        Ok(coordinator)
    }

    /// Leave sleep if needed and write a final snapshot.
    pub async fn teardown(&mut self, now: DateTime<Utc>) -> Result<(), PersistenceError> {
        if self.lifecycle == LifecycleState::Sleeping {
            if let Err(e) = self.exit_sleep(now).await {
                tracing::warn!("Failed to wake before teardown: {}", e);
                self.lifecycle = LifecycleState::Awake;
                self.slept_at = None;
            }
        }
        self.snapshot(now).await
    }

    pub fn config(&self) -> &AnimaConfig {
        &self.config
    }

    pub fn engine(&self) -> &AffectiveEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut AffectiveEngine {
        &mut self.engine
    }

    pub fn sleep(&self) -> &SleepConsolidator {
        &self.sleep
    }

    pub fn store(&self) -> Option<&EmotionStore> {
        self.store.as_ref()
    }

    pub fn lifecycle(&self) -> LifecycleState {
        self.lifecycle
    }

    // ========================================================================
    // Engine
    // ========================================================================

    pub async fn record_event(&mut self, text: &str, now: DateTime<Utc>) -> EmotionalState {
        if self.lifecycle == LifecycleState::Sleeping {
            tracing::debug!("Recording event while asleep: {}", clip(text, 60));
        }
        self.engine.record_event(text, now).await
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> usize {
        self.engine.tick(now)
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Write the current state. A coordinator without a store succeeds
    /// without doing anything.
    pub async fn snapshot(&self, now: DateTime<Utc>) -> Result<(), PersistenceError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let snapshot = self.engine.export_snapshot(now);
        store
            .save_snapshot(&snapshot, self.config.persistence.timeline_cap)
            .await
    }

    /// Load the latest snapshot and apply it with offline decay. Returns
    /// whether anything was restored.
    pub async fn restore(&mut self, now: DateTime<Utc>) -> Result<bool, PersistenceError> {
        let Some(store) = &self.store else {
            return Ok(false);
        };
        let Some(snapshot) = store.load_snapshot().await? else {
            return Ok(false);
        };
        tracing::info!("Loaded emotional state saved at {}", snapshot.saved_at);
        self.engine.apply_restored(codec::restore(&snapshot, now));
        Ok(true)
    }

    /// Record baselines and drives, logging drift when the recent dominant
    /// emotion differs from the baseline. The baseline itself is not moved.
    /// Returns the drifting label, if any.
    pub async fn update_baselines(&self, now: DateTime<Utc>) -> Result<Option<String>, PersistenceError> {
        let Some(store) = &self.store else {
            return Ok(None);
        };
        let Some(dominant) = store.dominant_over(BASELINE_WINDOW_HOURS, now).await? else {
            return Ok(None);
        };

        let (baseline, intensity) = self.engine.baseline();
        let drift = (dominant != baseline.label()).then(|| {
            tracing::info!("Baseline drift: {} -> {} (not applied)", baseline, dominant);
            dominant
        });

        store
            .save_baselines(&Baselines {
                baseline_mood: baseline.label().to_string(),
                baseline_intensity: intensity,
                drives: self.engine.drives().clone(),
                updated_at: now,
            })
            .await?;
        Ok(drift)
    }

    // ========================================================================
    // Sleep
    // ========================================================================

    pub fn enter_sleep(&mut self, episodes: Vec<Episode>, now: DateTime<Utc>) {
        self.sleep.enter_sleep(episodes, now);
        self.lifecycle = LifecycleState::Sleeping;
        self.slept_at = Some(now);
    }

    pub async fn process_sleep(
        &mut self,
        depth: SleepDepth,
        now: DateTime<Utc>,
    ) -> Result<CycleReport, SleepError> {
        self.sleep.process_sleep(depth, now).await
    }

    /// Wake up and feed the best insight from this sleep back in as an event.
    pub async fn exit_sleep(&mut self, now: DateTime<Utc>) -> Result<SleepSummary, SleepError> {
        let summary = self.sleep.exit_sleep(now)?;
        self.lifecycle = LifecycleState::Awake;

        let since = self.slept_at.take();
        let best = self
            .sleep
            .insights()
            .filter(|i| since.map_or(true, |t| i.timestamp >= t))
            .max_by(|a, b| (a.confidence, a.timestamp).cmp(&(b.confidence, b.timestamp)))
            .map(|i| i.content.clone());

        if let Some(content) = best {
            let event = format!("I realized something while sleeping: {}", clip(&content, 200));
            self.engine.record_event(&event, now).await;
        }
        Ok(summary)
    }
}

/// Periodic decay ticks and snapshots until `shutdown` flips to true or its
/// sender is dropped. Snapshot failures are logged and retried next period.
pub fn spawn_maintenance(
    coordinator: Arc<Mutex<AffectCoordinator>>,
    tick_every: Duration,
    snapshot_every: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let start = tokio::time::Instant::now();
        let mut tick_interval = tokio::time::interval_at(start + tick_every, tick_every);
        let mut snapshot_interval = tokio::time::interval_at(start + snapshot_every, snapshot_every);

        loop {
            tokio::select! {
                _ = tick_interval.tick() => {
                    let faded = coordinator.lock().await.tick(Utc::now());
                    if faded > 0 {
                        tracing::debug!("Maintenance tick faded {} emotions", faded);
                    }
                }
                _ = snapshot_interval.tick() => {
                    let guard = coordinator.lock().await;
                    if let Err(e) = guard.snapshot(Utc::now()).await {
                        tracing::warn!("Periodic snapshot failed: {}", e);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::debug!("Maintenance task stopping");
                        break;
                    }
                }
            }
        }
    })
}
