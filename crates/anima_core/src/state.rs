//! Affective state primitives.
//!
//! - `EmotionalState`: one felt emotion with its cause and creation time
//! - `Mood`: slow aggregate over recent emotions
//! - `DriveState`: homeostatic levels that bias emotion intensity
//!
//! All intensities live in [0, 1] and are clamped at write time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::emotion::EmotionKind;

/// Guard against NaN and Infinity in state values.
/// If the value is NaN or Inf, replace with the provided fallback.
#[inline]
pub fn sanitize_f32(v: f32, fallback: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        tracing::warn!("NaN/Inf detected in affective state, resetting to fallback {}", fallback);
        fallback
    }
}

/// Sanitize then clamp into [0, 1].
#[inline]
pub fn clamp_unit(v: f32, fallback: f32) -> f32 {
    sanitize_f32(v, fallback).clamp(0.0, 1.0)
}

/// Deserialize an f32, mapping null/non-finite values to 0.0.
/// JSON has no NaN, but a hand-edited snapshot can still carry `null`.
pub fn deserialize_safe_f32<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    let v: Option<f32> = Option::deserialize(deserializer)?;
    Ok(v.filter(|x| x.is_finite()).unwrap_or(0.0))
}

/// Minutes elapsed between two instants; negative spans count as zero.
pub fn minutes_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f32 {
    let ms = (to - from).num_milliseconds().max(0);
    ms as f32 / 60_000.0
}

/// Hours elapsed between two instants; negative spans count as zero.
pub fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f32 {
    minutes_between(from, to) / 60.0
}

// =============================================================================
// EmotionalState
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalState {
    pub emotion: EmotionKind,
    /// Current intensity after decay
    pub intensity: f32,
    /// Intensity at creation; decay is always recomputed from this
    pub initial_intensity: f32,
    pub cause: String,
    pub created_at: DateTime<Utc>,
}

impl EmotionalState {
    pub fn new(
        emotion: EmotionKind,
        intensity: f32,
        cause: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let intensity = clamp_unit(intensity, 0.5);
        Self {
            emotion,
            intensity,
            initial_intensity: intensity,
            cause: cause.into(),
            created_at,
        }
    }

    /// Linear decay from the creation instant:
    /// `max(0, initial - age_minutes * rate_per_minute)`.
    pub fn intensity_at(&self, now: DateTime<Utc>, rate_per_minute: f32) -> f32 {
        let age = minutes_between(self.created_at, now);
        clamp_unit(self.initial_intensity - age * rate_per_minute, 0.0)
    }

    /// Ordering key used for eviction and dominance: stronger first, then newer.
    pub fn rank_key(&self) -> (f32, DateTime<Utc>) {
        (self.intensity, self.created_at)
    }

    /// True if `self` outranks `other` under `(intensity, created_at)`.
    pub fn outranks(&self, other: &EmotionalState) -> bool {
        match self.intensity.partial_cmp(&other.intensity) {
            Some(std::cmp::Ordering::Greater) => true,
            Some(std::cmp::Ordering::Less) => false,
            _ => self.created_at > other.created_at,
        }
    }
}

// =============================================================================
// Mood
// =============================================================================

/// Maximum number of influences remembered on a mood.
pub const MAX_MOOD_INFLUENCES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mood {
    pub dominant: EmotionKind,
    pub intensity: f32,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub influences: Vec<String>,
}

impl Mood {
    pub fn new(dominant: EmotionKind, intensity: f32, started_at: DateTime<Utc>) -> Self {
        Self {
            dominant,
            intensity: clamp_unit(intensity, 0.5),
            started_at,
            influences: Vec::new(),
        }
    }

    pub fn push_influence(&mut self, influence: impl Into<String>) {
        self.influences.push(influence.into());
        if self.influences.len() > MAX_MOOD_INFLUENCES {
            let excess = self.influences.len() - MAX_MOOD_INFLUENCES;
            self.influences.drain(..excess);
        }
    }
}

// =============================================================================
// Drives
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Drive {
    Learning,
    Connection,
    Competence,
    Contribution,
    Autonomy,
}

impl Drive {
    pub const ALL: [Drive; 5] = [
        Drive::Learning,
        Drive::Connection,
        Drive::Competence,
        Drive::Contribution,
        Drive::Autonomy,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Drive::Learning => "learning",
            Drive::Connection => "connection",
            Drive::Competence => "competence",
            Drive::Contribution => "contribution",
            Drive::Autonomy => "autonomy",
        }
    }
}

/// Homeostatic drive levels. Read-only bias source for classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveState {
    #[serde(deserialize_with = "deserialize_safe_f32")]
    pub learning: f32,
    #[serde(deserialize_with = "deserialize_safe_f32")]
    pub connection: f32,
    #[serde(deserialize_with = "deserialize_safe_f32")]
    pub competence: f32,
    #[serde(deserialize_with = "deserialize_safe_f32")]
    pub contribution: f32,
    #[serde(deserialize_with = "deserialize_safe_f32")]
    pub autonomy: f32,
}

impl Default for DriveState {
    fn default() -> Self {
        Self {
            learning: 0.8,
            connection: 0.7,
            competence: 0.8,
            contribution: 0.9,
            autonomy: 0.6,
        }
    }
}

impl DriveState {
    pub fn get(&self, drive: Drive) -> f32 {
        match drive {
            Drive::Learning => self.learning,
            Drive::Connection => self.connection,
            Drive::Competence => self.competence,
            Drive::Contribution => self.contribution,
            Drive::Autonomy => self.autonomy,
        }
    }

    pub fn set(&mut self, drive: Drive, level: f32) {
        let level = clamp_unit(level, Self::default().get(drive));
        match drive {
            Drive::Learning => self.learning = level,
            Drive::Connection => self.connection = level,
            Drive::Competence => self.competence = level,
            Drive::Contribution => self.contribution = level,
            Drive::Autonomy => self.autonomy = level,
        }
    }

    /// Sanitize and clamp all fields to valid ranges.
    pub fn normalize(&mut self) {
        for drive in Drive::ALL {
            self.set(drive, self.get(drive));
        }
    }

    /// The `n` strongest drives, strongest first.
    pub fn top(&self, n: usize) -> Vec<(Drive, f32)> {
        let mut all: Vec<(Drive, f32)> = Drive::ALL.iter().map(|d| (*d, self.get(*d))).collect();
        all.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        all.truncate(n);
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_new_clamps_intensity() {
        let s = EmotionalState::new(EmotionKind::Joy, 1.7, "x", t0());
        assert_eq!(s.intensity, 1.0);
        let s = EmotionalState::new(EmotionKind::Joy, -0.3, "x", t0());
        assert_eq!(s.intensity, 0.0);
        let s = EmotionalState::new(EmotionKind::Joy, f32::NAN, "x", t0());
        assert_eq!(s.intensity, 0.5);
    }

    #[test]
    fn test_intensity_at_is_linear_in_minutes() {
        let s = EmotionalState::new(EmotionKind::Awe, 0.8, "x", t0());
        let later = t0() + Duration::minutes(3);
        assert!((s.intensity_at(later, 0.1) - 0.5).abs() < 1e-5);
        let much_later = t0() + Duration::minutes(30);
        assert_eq!(s.intensity_at(much_later, 0.1), 0.0);
    }

    #[test]
    fn test_negative_age_counts_as_zero() {
        let s = EmotionalState::new(EmotionKind::Awe, 0.8, "x", t0());
        let earlier = t0() - Duration::minutes(10);
        assert_eq!(s.intensity_at(earlier, 0.1), 0.8);
        assert_eq!(hours_between(t0(), earlier), 0.0);
    }

    #[test]
    fn test_outranks_breaks_ties_toward_recency() {
        let old = EmotionalState::new(EmotionKind::Joy, 0.5, "a", t0());
        let new = EmotionalState::new(EmotionKind::Hope, 0.5, "b", t0() + Duration::seconds(1));
        assert!(new.outranks(&old));
        assert!(!old.outranks(&new));
    }

    #[test]
    fn test_mood_influences_are_capped() {
        let mut mood = Mood::new(EmotionKind::Contentment, 0.6, t0());
        for i in 0..15 {
            mood.push_influence(format!("influence {}", i));
        }
        assert_eq!(mood.influences.len(), MAX_MOOD_INFLUENCES);
        assert_eq!(mood.influences[0], "influence 5");
    }

    #[test]
    fn test_drive_defaults_and_set_clamp() {
        let mut d = DriveState::default();
        assert_eq!(d.get(Drive::Contribution), 0.9);
        d.set(Drive::Learning, 3.0);
        assert_eq!(d.learning, 1.0);
        d.set(Drive::Autonomy, f32::INFINITY);
        assert_eq!(d.autonomy, 0.6);
    }

    #[test]
    fn test_top_drives_sorted() {
        let top = DriveState::default().top(2);
        assert_eq!(top[0].0, Drive::Contribution);
        assert_eq!(top.len(), 2);
    }

    #[test]
    fn test_drive_state_deserializes_null_as_zero() {
        let d: DriveState = serde_json::from_str(r#"{"learning": null}"#).unwrap();
        assert_eq!(d.learning, 0.0);
        assert_eq!(d.connection, 0.7);
    }
}
