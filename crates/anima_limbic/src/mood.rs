//! Slow-moving mood over a trailing window of recent emotions.
//!
//! The dominant mood only changes when a challenger has appeared at least
//! `switch_count` times in the window (hysteresis). Intensity follows the
//! window mean on every update whether or not the dominant switched.

use anima_core::config::AffectConfig;
use anima_core::{EmotionKind, EmotionalState, Mood};
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoodUpdate {
    /// Nothing in the window; mood left untouched.
    Unchanged,
    Created(EmotionKind),
    Switched { from: EmotionKind, to: EmotionKind },
    /// Dominant kept, intensity refreshed.
    Refreshed,
}

#[derive(Debug, Clone)]
pub struct MoodTracker {
    mood: Option<Mood>,
    window: Duration,
    switch_count: usize,
}

impl Default for MoodTracker {
    fn default() -> Self {
        Self::new(Duration::hours(1), 3)
    }
}

impl MoodTracker {
    pub fn new(window: Duration, switch_count: usize) -> Self {
        Self {
            mood: None,
            window,
            switch_count,
        }
    }

    pub fn from_config(config: &AffectConfig) -> Self {
        Self::new(
            Duration::seconds(config.mood_window_secs as i64),
            config.mood_switch_count,
        )
    }

    pub fn mood(&self) -> Option<&Mood> {
        self.mood.as_ref()
    }

    pub fn set_mood(&mut self, mood: Option<Mood>) {
        self.mood = mood;
    }

    /// Recompute mood from `history` entries newer than `now - window`.
    ///
    /// The intensity mean is taken over each entry's `initial_intensity`,
    /// the strength at classification time, not its current decayed value.
    /// An emotion that has faded from the active set still counts at full
    /// strength while it remains in the window.
    pub fn update<'a, I>(&mut self, history: I, now: DateTime<Utc>) -> MoodUpdate
    where
        I: IntoIterator<Item = &'a EmotionalState>,
    {
        let cutoff = now - self.window;

        // (kind, count) in first-seen order
        let mut counts: Vec<(EmotionKind, usize)> = Vec::new();
        let mut total = 0.0f32;
        let mut n = 0usize;
        for s in history.into_iter().filter(|s| s.created_at > cutoff) {
            match counts.iter_mut().find(|(k, _)| *k == s.emotion) {
                Some((_, c)) => *c += 1,
                None => counts.push((s.emotion, 1)),
            }
            total += s.initial_intensity;
            n += 1;
        }
        if n == 0 {
            return MoodUpdate::Unchanged;
        }

        let mut candidate = counts[0];
        for &(k, c) in &counts[1..] {
            if c > candidate.1 {
                candidate = (k, c);
            }
        }
        let mean = total / n as f32;

        match self.mood.as_mut() {
            None => {
                self.mood = Some(Mood::new(candidate.0, mean, now));
                tracing::debug!("Mood established: {}", candidate.0);
                MoodUpdate::Created(candidate.0)
            }
            Some(mood) => {
                mood.intensity = anima_core::state::clamp_unit(mean, mood.intensity);
                if candidate.0 != mood.dominant && candidate.1 >= self.switch_count {
                    let from = mood.dominant;
                    mood.dominant = candidate.0;
                    mood.started_at = now;
                    tracing::debug!("Mood switched: {} -> {}", from, candidate.0);
                    MoodUpdate::Switched { from, to: candidate.0 }
                } else {
                    MoodUpdate::Refreshed
                }
            }
        }
    }
}
