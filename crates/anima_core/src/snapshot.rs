//! Serialized form of the engine written to the durable store.
//!
//! Emotion and mood labels are kept as plain strings so a snapshot written
//! by a build with a different taxonomy still loads; unknown labels are
//! skipped on restore instead of failing the whole row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{deserialize_safe_f32, DriveState, EmotionalState, Mood};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedEmotion {
    pub emotion: String,
    #[serde(deserialize_with = "deserialize_safe_f32")]
    pub intensity: f32,
    #[serde(default)]
    pub cause: String,
    pub created_at: DateTime<Utc>,
}

impl From<&EmotionalState> for PersistedEmotion {
    fn from(s: &EmotionalState) -> Self {
        Self {
            emotion: s.emotion.label().to_string(),
            intensity: s.intensity,
            cause: s.cause.clone(),
            created_at: s.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedMood {
    pub dominant: String,
    #[serde(deserialize_with = "deserialize_safe_f32")]
    pub intensity: f32,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub influences: Vec<String>,
}

impl From<&Mood> for PersistedMood {
    fn from(m: &Mood) -> Self {
        Self {
            dominant: m.dominant.label().to_string(),
            intensity: m.intensity,
            started_at: m.started_at,
            influences: m.influences.clone(),
        }
    }
}

/// Learned traits and counts from the complexity layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexitySummary {
    pub emotional_maturity: f32,
    pub vulnerability_comfort: f32,
    pub active_conflicts: usize,
    pub suppressed_count: usize,
    #[serde(default)]
    pub highest_tension: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSnapshot {
    pub active_emotions: Vec<PersistedEmotion>,
    pub mood: Option<PersistedMood>,
    #[serde(default)]
    pub drives: DriveState,
    #[serde(default)]
    pub complexity: Option<ComplexitySummary>,
    pub baseline_mood: String,
    #[serde(deserialize_with = "deserialize_safe_f32")]
    pub baseline_intensity: f32,
    pub saved_at: DateTime<Utc>,
}
