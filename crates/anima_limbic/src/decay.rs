//! Time-based intensity decay for the active set.

use anima_core::config::AffectConfig;
use anima_core::EmotionalState;
use chrono::{DateTime, Utc};

use crate::active::ActiveEmotionSet;

/// Recomputes every intensity from its creation-time value, so repeated
/// ticks at the same instant are idempotent.
#[derive(Debug, Clone, Copy)]
pub struct DecayScheduler {
    pub rate_per_minute: f32,
    pub fade_threshold: f32,
}

impl Default for DecayScheduler {
    fn default() -> Self {
        Self {
            rate_per_minute: 0.1,
            fade_threshold: 0.1,
        }
    }
}

impl DecayScheduler {
    pub fn from_config(config: &AffectConfig) -> Self {
        Self {
            rate_per_minute: config.decay_per_minute.max(0.0),
            fade_threshold: config.fade_threshold,
        }
    }

    /// Decay every member to `now` and evict those below the fade threshold.
    /// Returns the evicted states.
    pub fn tick(&self, set: &mut ActiveEmotionSet, now: DateTime<Utc>) -> Vec<EmotionalState> {
        let faded = set.sweep(|s| {
            s.intensity = s.intensity_at(now, self.rate_per_minute);
            s.intensity >= self.fade_threshold
        });
        for s in &faded {
            tracing::debug!("Emotion faded: {} ({:.2})", s.emotion, s.intensity);
        }
        faded
    }
}
