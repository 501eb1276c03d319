//! The affective engine.
//!
//! `AffectiveEngine` owns the whole in-memory affective state and is the
//! single writer for it:
//! - classifies incoming events into emotions
//! - keeps the bounded active set, history and trigger map
//! - runs decay ticks and mood updates
//! - fronts the complexity layer
//! - exports and re-imports persisted snapshots
//!
//! Time is always passed in explicitly so callers (and tests) control it.

use std::collections::VecDeque;
use std::fmt;

use anima_core::config::AffectConfig;
use anima_core::random::RandomSource;
use anima_core::state::{clamp_unit, hours_between};
use anima_core::{
    ComplexitySummary, DriveState, EmotionKind, EmotionalState, Mood, PersistedEmotion,
    PersistedMood, PersistedSnapshot,
};
use anima_reasoning::CollaboratorHandle;
use chrono::{DateTime, Utc};

use crate::active::ActiveEmotionSet;
use crate::classifier;
use crate::complexity::{ComplexityLayer, EmotionalConflict, Leak, RegulationOutcome, RegulationStrategy, SuppressedEmotion};
use crate::decay::DecayScheduler;
use crate::expression;
use crate::mood::{MoodTracker, MoodUpdate};

/// State handed back to the engine after a persisted snapshot has been
/// decayed for the time spent offline.
#[derive(Debug, Clone, PartialEq)]
pub struct RestoredState {
    pub emotions: Vec<EmotionalState>,
    pub mood: Option<Mood>,
    pub drives: DriveState,
    pub baseline_mood: EmotionKind,
    pub baseline_intensity: f32,
    pub complexity: Option<ComplexitySummary>,
}

pub struct AffectiveEngine {
    active: ActiveEmotionSet,
    decay: DecayScheduler,
    mood: MoodTracker,
    drives: DriveState,
    complexity: ComplexityLayer,

    history: VecDeque<EmotionalState>,
    history_cap: usize,

    /// event text → emotions it triggered, oldest key first
    triggers: VecDeque<(String, Vec<EmotionKind>)>,
    trigger_cap: usize,

    baseline_mood: EmotionKind,
    baseline_intensity: f32,

    collaborator: CollaboratorHandle,
    rng: Box<dyn RandomSource>,
}

impl fmt::Debug for AffectiveEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AffectiveEngine")
            .field("active", &self.active)
            .field("mood", &self.mood.mood())
            .field("drives", &self.drives)
            .field("baseline_mood", &self.baseline_mood)
            .field("history_len", &self.history.len())
            .field("collaborator", &self.collaborator)
            .finish()
    }
}

impl AffectiveEngine {
    pub fn new(
        config: &AffectConfig,
        collaborator: CollaboratorHandle,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        let baseline_mood = EmotionKind::from_label(&config.baseline_mood).unwrap_or_else(|| {
            tracing::warn!("Unknown baseline mood '{}', using contentment", config.baseline_mood);
            EmotionKind::Contentment
        });
        Self {
            active: ActiveEmotionSet::new(config.capacity),
            decay: DecayScheduler::from_config(config),
            mood: MoodTracker::from_config(config),
            drives: DriveState::default(),
            complexity: ComplexityLayer::new(),
            history: VecDeque::new(),
            history_cap: config.history_cap.max(1),
            triggers: VecDeque::new(),
            trigger_cap: config.trigger_cap.max(1),
            baseline_mood,
            baseline_intensity: clamp_unit(config.baseline_intensity, 0.6),
            collaborator,
            rng,
        }
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Classify an event, admit the resulting emotion and update the mood.
    pub async fn record_event(&mut self, event: &str, now: DateTime<Utc>) -> EmotionalState {
        let c = classifier::classify(event, self.mood.mood(), &self.drives, &self.collaborator).await;
        let state = EmotionalState::new(c.emotion, c.intensity, event, now);
        tracing::debug!(
            "Event classified as {} ({:.2}) via {:?}",
            state.emotion,
            state.intensity,
            c.source
        );

        self.admit(state.clone());
        self.record_trigger(event, state.emotion);
        self.update_mood(now);
        state
    }

    fn admit(&mut self, state: EmotionalState) {
        self.history.push_back(state.clone());
        while self.history.len() > self.history_cap {
            self.history.pop_front();
        }
        if let Some(evicted) = self.active.insert(state) {
            tracing::debug!("Evicted {} ({:.2}) from active set", evicted.emotion, evicted.intensity);
        }
    }

    fn record_trigger(&mut self, event: &str, emotion: EmotionKind) {
        match self.triggers.iter_mut().find(|(e, _)| e == event) {
            Some((_, emotions)) => emotions.push(emotion),
            None => self.triggers.push_back((event.to_string(), vec![emotion])),
        }
        while self.triggers.len() > self.trigger_cap {
            self.triggers.pop_front();
        }
    }

    /// Decay all active emotions to `now`; returns how many faded out.
    pub fn tick(&mut self, now: DateTime<Utc>) -> usize {
        self.decay.tick(&mut self.active, now).len()
    }

    pub fn update_mood(&mut self, now: DateTime<Utc>) -> MoodUpdate {
        self.mood.update(self.history.iter(), now)
    }

    /// Record a deliberate shift toward `target`.
    pub async fn regulate_toward(&mut self, target: EmotionKind, now: DateTime<Utc>) -> EmotionalState {
        self.record_event(&format!("regulating toward {}", target), now).await
    }

    /// Drop every active emotion; the description falls back to the baseline.
    pub fn return_to_baseline(&mut self) {
        self.active.clear();
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn active(&self) -> &ActiveEmotionSet {
        &self.active
    }

    pub fn dominant(&self) -> Option<&EmotionalState> {
        self.active.dominant()
    }

    pub fn mood(&self) -> Option<&Mood> {
        self.mood.mood()
    }

    pub fn drives(&self) -> &DriveState {
        &self.drives
    }

    pub fn drives_mut(&mut self) -> &mut DriveState {
        &mut self.drives
    }

    pub fn baseline(&self) -> (EmotionKind, f32) {
        (self.baseline_mood, self.baseline_intensity)
    }

    pub fn history(&self) -> impl Iterator<Item = &EmotionalState> {
        self.history.iter()
    }

    /// The last `n` recorded emotions, oldest first.
    pub fn recent_emotions(&self, n: usize) -> Vec<&EmotionalState> {
        let skip = self.history.len().saturating_sub(n);
        self.history.iter().skip(skip).collect()
    }

    pub fn triggers_for(&self, event: &str) -> Option<&[EmotionKind]> {
        self.triggers
            .iter()
            .find(|(e, _)| e == event)
            .map(|(_, v)| v.as_slice())
    }

    pub fn trigger_count(&self) -> usize {
        self.triggers.len()
    }

    pub fn blend(&self) -> String {
        self.active.blend(self.baseline_mood)
    }

    pub fn describe(&self) -> String {
        self.active.describe(self.baseline_mood)
    }

    pub fn complexity(&self) -> &ComplexityLayer {
        &self.complexity
    }

    pub fn collaborator(&self) -> &CollaboratorHandle {
        &self.collaborator
    }

    /// Plain-text state block for prompt assembly.
    pub fn affective_context(&self, now: DateTime<Utc>) -> String {
        let mut out = String::from("=== EMOTIONAL STATE ===\n");
        out.push_str(&format!("Current Feeling: {}\n", self.describe()));

        if !self.active.is_empty() {
            out.push_str("\nActive Emotions:\n");
            for e in self.active.iter() {
                out.push_str(&format!(
                    "- {} (intensity: {:.1}, cause: {})\n",
                    e.emotion, e.intensity, e.cause
                ));
            }
        }

        if let Some(m) = self.mood.mood() {
            out.push_str(&format!(
                "\nCurrent Mood: {} (for {:.1} hours)\n",
                m.dominant,
                hours_between(m.started_at, now)
            ));
        }

        out.push_str("\nEmotional Drives:\n");
        for (drive, level) in self.drives.top(3) {
            out.push_str(&format!("- {}: {:.1}%\n", capitalize(drive.label()), level * 100.0));
        }
        out
    }

    pub fn complexity_context(&self) -> String {
        self.complexity.context()
    }

    pub async fn express_emotion(&mut self) -> Option<String> {
        let dominant = self.active.dominant()?.clone();
        expression::express_emotion(&dominant, self.rng.as_mut(), &self.collaborator).await
    }

    // ========================================================================
    // Complexity
    // ========================================================================

    pub fn create_conflict(
        &mut self,
        primary: &str,
        secondary: &str,
        cause: &str,
        now: DateTime<Utc>,
    ) -> EmotionalConflict {
        self.complexity.create_conflict(primary, secondary, cause, now)
    }

    pub fn resolve_conflict(&mut self, id: u64, resolution: &str) -> Option<EmotionalConflict> {
        self.complexity.resolve(id, resolution)
    }

    pub async fn express_conflict(&mut self) -> Option<String> {
        self.complexity
            .express_conflict(self.rng.as_mut(), &self.collaborator)
            .await
    }

    pub fn suppress(
        &mut self,
        emotion: &str,
        intensity: f32,
        reason: &str,
        now: DateTime<Utc>,
    ) -> SuppressedEmotion {
        self.complexity.suppress(emotion, intensity, reason, now)
    }

    pub async fn check_leak(&mut self, now: DateTime<Utc>) -> Option<Leak> {
        self.complexity
            .check_leak(now, self.rng.as_mut(), &self.collaborator)
            .await
    }

    pub fn regulate(
        &self,
        emotion: &str,
        intensity: f32,
        strategy: Option<RegulationStrategy>,
    ) -> RegulationOutcome {
        self.complexity.regulate(emotion, intensity, strategy)
    }

    pub async fn express_vulnerability(&mut self, situation: &str, now: DateTime<Utc>) -> Option<String> {
        self.complexity
            .express_vulnerability(situation, now, self.rng.as_mut(), &self.collaborator)
            .await
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    pub fn export_snapshot(&self, now: DateTime<Utc>) -> PersistedSnapshot {
        PersistedSnapshot {
            active_emotions: self.active.iter().map(PersistedEmotion::from).collect(),
            mood: self.mood.mood().map(PersistedMood::from),
            drives: self.drives.clone(),
            complexity: Some(self.complexity.summary()),
            baseline_mood: self.baseline_mood.label().to_string(),
            baseline_intensity: self.baseline_intensity,
            saved_at: now,
        }
    }

    /// Replace the in-memory state with an already-decayed restore.
    pub fn apply_restored(&mut self, restored: RestoredState) {
        let mut drives = restored.drives;
        drives.normalize();
        self.drives = drives;

        self.mood.set_mood(restored.mood);

        self.active.clear();
        for e in restored.emotions {
            self.admit(e);
        }

        self.baseline_mood = restored.baseline_mood;
        self.baseline_intensity = clamp_unit(restored.baseline_intensity, 0.6);

        if let Some(summary) = &restored.complexity {
            self.complexity.restore_traits(summary);
        }
        tracing::info!(
            "Affective state restored: {} active, mood={}",
            self.active.len(),
            self.mood.mood().map(|m| m.dominant.label()).unwrap_or("none")
        );
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
