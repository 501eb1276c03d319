//! Time-aware restore of a persisted snapshot.
//!
//! Two decay time-constants apply across the restart boundary:
//! - mood intensity is scaled by `max(0.1, 1 - h/24)`
//! - each active emotion is scaled by `max(0, 1 - h/4)` and dropped below 0.1
//!
//! Drives come back unchanged. Labels that are no longer in the taxonomy are
//! skipped rather than failing the restore.

use anima_core::state::hours_between;
use anima_core::{EmotionKind, EmotionalState, Mood, PersistedSnapshot};
use anima_limbic::RestoredState;
use chrono::{DateTime, Utc};

pub const MOOD_DECAY_HOURS: f32 = 24.0;
pub const MOOD_DECAY_FLOOR: f32 = 0.1;
pub const EMOTION_DECAY_HOURS: f32 = 4.0;
/// Restored emotions below this intensity are not re-admitted.
pub const RESTORE_THRESHOLD: f32 = 0.1;

const PERSISTED_PREFIX: &str = "[persisted] ";

pub fn mood_decay_factor(elapsed_hours: f32) -> f32 {
    (1.0 - elapsed_hours / MOOD_DECAY_HOURS).max(MOOD_DECAY_FLOOR)
}

pub fn emotion_decay_factor(elapsed_hours: f32) -> f32 {
    (1.0 - elapsed_hours / EMOTION_DECAY_HOURS).max(0.0)
}

/// Decay `snapshot` for the time between `saved_at` and `now`.
///
/// Negative elapsed time (clock skew) counts as zero.
pub fn restore(snapshot: &PersistedSnapshot, now: DateTime<Utc>) -> RestoredState {
    let elapsed = hours_between(snapshot.saved_at, now);

    let mood = snapshot.mood.as_ref().and_then(|m| {
        let dominant = match EmotionKind::from_label(&m.dominant) {
            Some(k) => k,
            None => {
                tracing::warn!("Skipping persisted mood with unknown label '{}'", m.dominant);
                return None;
            }
        };
        let mut mood = Mood::new(dominant, m.intensity * mood_decay_factor(elapsed), now);
        for influence in &m.influences {
            mood.push_influence(influence.clone());
        }
        mood.push_influence(format!("resumed after {:.1}h offline", elapsed));
        Some(mood)
    });

    let factor = emotion_decay_factor(elapsed);
    let emotions = snapshot
        .active_emotions
        .iter()
        .filter_map(|e| {
            let Some(kind) = EmotionKind::from_label(&e.emotion) else {
                tracing::warn!("Skipping persisted emotion with unknown label '{}'", e.emotion);
                return None;
            };
            let intensity = e.intensity * factor;
            if intensity < RESTORE_THRESHOLD {
                tracing::debug!("{} too faded to restore ({:.2})", kind, intensity);
                return None;
            }
            Some(EmotionalState::new(kind, intensity, persisted_cause(&e.cause), now))
        })
        .collect();

    let (baseline_mood, baseline_intensity) = match EmotionKind::from_label(&snapshot.baseline_mood) {
        Some(k) => (k, snapshot.baseline_intensity),
        None => (EmotionKind::Contentment, 0.6),
    };

    RestoredState {
        emotions,
        mood,
        drives: snapshot.drives.clone(),
        baseline_mood,
        baseline_intensity,
        complexity: snapshot.complexity.clone(),
    }
}

fn persisted_cause(cause: &str) -> String {
    if cause.starts_with(PERSISTED_PREFIX) {
        cause.to_string()
    } else if cause.is_empty() {
        format!("{}unknown", PERSISTED_PREFIX)
    } else {
        format!("{}{}", PERSISTED_PREFIX, cause)
    }
}
