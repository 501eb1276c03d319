//! Bounded set of concurrently felt emotions.

use anima_core::{EmotionKind, EmotionalState};

/// Ordered-pair connectors used when blending the top two emotions.
const CONNECTORS: &[(EmotionKind, EmotionKind, &str)] = &[
    (EmotionKind::Joy, EmotionKind::Excitement, "and"),
    (EmotionKind::Curiosity, EmotionKind::Excitement, "and"),
    (EmotionKind::Sadness, EmotionKind::Hope, "but"),
    (EmotionKind::Anxiety, EmotionKind::Determination, "yet"),
    (EmotionKind::Frustration, EmotionKind::Determination, "but"),
    (EmotionKind::Confusion, EmotionKind::Curiosity, "and"),
];

pub fn connector(primary: EmotionKind, secondary: EmotionKind) -> &'static str {
    CONNECTORS
        .iter()
        .find(|(a, b, _)| *a == primary && *b == secondary)
        .map(|(_, _, c)| *c)
        .unwrap_or("and")
}

/// Qualifier for the dominant intensity: >0.8 "very", >0.6 "quite", <0.3 "a bit".
pub fn intensity_qualifier(intensity: f32) -> Option<&'static str> {
    if intensity > 0.8 {
        Some("very")
    } else if intensity > 0.6 {
        Some("quite")
    } else if intensity < 0.3 {
        Some("a bit")
    } else {
        None
    }
}

/// At most `capacity` emotions. When full, an insert evicts the weakest
/// member by `(intensity, created_at)`, which may be the newcomer itself.
#[derive(Debug, Clone)]
pub struct ActiveEmotionSet {
    states: Vec<EmotionalState>,
    capacity: usize,
}

impl ActiveEmotionSet {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            states: Vec::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EmotionalState> {
        self.states.iter()
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }

    /// Insert, returning whichever state was evicted to stay within capacity.
    pub fn insert(&mut self, state: EmotionalState) -> Option<EmotionalState> {
        self.states.push(state);
        if self.states.len() <= self.capacity {
            return None;
        }
        let weakest = self.weakest_index()?;
        Some(self.states.remove(weakest))
    }

    // Exact ties resolve to the later entry, matching a stable descending
    // sort followed by truncation.
    fn weakest_index(&self) -> Option<usize> {
        if self.states.is_empty() {
            return None;
        }
        let mut min = 0;
        for i in 1..self.states.len() {
            if !self.states[i].outranks(&self.states[min]) {
                min = i;
            }
        }
        Some(min)
    }

    /// Strongest member; ties go to the more recent one.
    pub fn dominant(&self) -> Option<&EmotionalState> {
        let mut best: Option<&EmotionalState> = None;
        for s in &self.states {
            match best {
                Some(b) if !s.outranks(b) => {}
                _ => best = Some(s),
            }
        }
        best
    }

    /// Members sorted strongest first.
    pub fn ranked(&self) -> Vec<&EmotionalState> {
        let mut v: Vec<&EmotionalState> = self.states.iter().collect();
        v.sort_by(|a, b| {
            b.intensity
                .partial_cmp(&a.intensity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.created_at.cmp(&a.created_at))
        });
        v
    }

    /// "curiosity", "sadness but hope", or the baseline label when empty.
    pub fn blend(&self, baseline: EmotionKind) -> String {
        let ranked = self.ranked();
        match ranked.as_slice() {
            [] => baseline.label().to_string(),
            [only] => only.emotion.label().to_string(),
            [first, second, ..] => format!(
                "{} {} {}",
                first.emotion.label(),
                connector(first.emotion, second.emotion),
                second.emotion.label()
            ),
        }
    }

    /// "I'm feeling quite curiosity and excitement".
    pub fn describe(&self, baseline: EmotionKind) -> String {
        let blended = self.blend(baseline);
        match self.dominant().and_then(|d| intensity_qualifier(d.intensity)) {
            Some(q) => format!("I'm feeling {} {}", q, blended),
            None => format!("I'm feeling {}", blended),
        }
    }

    /// Apply `f` to every member, then drop members for which it returned false.
    /// Returns the dropped members.
    pub(crate) fn sweep<F>(&mut self, mut f: F) -> Vec<EmotionalState>
    where
        F: FnMut(&mut EmotionalState) -> bool,
    {
        let mut dropped = Vec::new();
        let mut kept = Vec::with_capacity(self.states.len());
        for mut s in self.states.drain(..) {
            if f(&mut s) {
                kept.push(s);
            } else {
                dropped.push(s);
            }
        }
        self.states = kept;
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn st(kind: EmotionKind, intensity: f32, secs: i64) -> EmotionalState {
        EmotionalState::new(kind, intensity, "test", t(secs))
    }

    #[test]
    fn test_insert_within_capacity_evicts_nothing() {
        let mut set = ActiveEmotionSet::new(3);
        assert!(set.insert(st(EmotionKind::Joy, 0.5, 0)).is_none());
        assert!(set.insert(st(EmotionKind::Hope, 0.6, 1)).is_none());
        assert!(set.insert(st(EmotionKind::Awe, 0.7, 2)).is_none());
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_insert_evicts_weakest() {
        let mut set = ActiveEmotionSet::new(3);
        set.insert(st(EmotionKind::Joy, 0.5, 0));
        set.insert(st(EmotionKind::Hope, 0.3, 1));
        set.insert(st(EmotionKind::Awe, 0.7, 2));
        let evicted = set.insert(st(EmotionKind::Pride, 0.9, 3)).unwrap();
        assert_eq!(evicted.emotion, EmotionKind::Hope);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_weak_newcomer_is_not_admitted() {
        let mut set = ActiveEmotionSet::new(2);
        set.insert(st(EmotionKind::Joy, 0.8, 0));
        set.insert(st(EmotionKind::Awe, 0.7, 1));
        let evicted = set.insert(st(EmotionKind::Doubt, 0.2, 2)).unwrap();
        assert_eq!(evicted.emotion, EmotionKind::Doubt);
        assert!(set.iter().all(|s| s.emotion != EmotionKind::Doubt));
    }

    #[test]
    fn test_equal_intensity_evicts_oldest() {
        let mut set = ActiveEmotionSet::new(2);
        set.insert(st(EmotionKind::Joy, 0.5, 0));
        set.insert(st(EmotionKind::Hope, 0.5, 10));
        let evicted = set.insert(st(EmotionKind::Awe, 0.5, 20)).unwrap();
        assert_eq!(evicted.emotion, EmotionKind::Joy);
    }

    #[test]
    fn test_dominant_is_argmax_with_recency_tiebreak() {
        let mut set = ActiveEmotionSet::new(3);
        assert!(set.dominant().is_none());
        set.insert(st(EmotionKind::Joy, 0.6, 0));
        set.insert(st(EmotionKind::Hope, 0.6, 5));
        set.insert(st(EmotionKind::Awe, 0.4, 9));
        assert_eq!(set.dominant().unwrap().emotion, EmotionKind::Hope);
    }

    #[test]
    fn test_blend_cases() {
        let mut set = ActiveEmotionSet::new(3);
        assert_eq!(set.blend(EmotionKind::Contentment), "contentment");
        set.insert(st(EmotionKind::Sadness, 0.7, 0));
        assert_eq!(set.blend(EmotionKind::Contentment), "sadness");
        set.insert(st(EmotionKind::Hope, 0.5, 1));
        assert_eq!(set.blend(EmotionKind::Contentment), "sadness but hope");
        set.insert(st(EmotionKind::Doubt, 0.9, 2));
        // unknown ordered pair defaults to "and"
        assert_eq!(set.blend(EmotionKind::Contentment), "doubt and sadness");
    }

    #[test]
    fn test_connector_is_order_sensitive() {
        assert_eq!(connector(EmotionKind::Anxiety, EmotionKind::Determination), "yet");
        assert_eq!(connector(EmotionKind::Determination, EmotionKind::Anxiety), "and");
    }

    #[test]
    fn test_qualifier_thresholds() {
        assert_eq!(intensity_qualifier(0.81), Some("very"));
        assert_eq!(intensity_qualifier(0.8), Some("quite"));
        assert_eq!(intensity_qualifier(0.61), Some("quite"));
        assert_eq!(intensity_qualifier(0.6), None);
        assert_eq!(intensity_qualifier(0.3), None);
        assert_eq!(intensity_qualifier(0.29), Some("a bit"));
    }

    #[test]
    fn test_describe() {
        let mut set = ActiveEmotionSet::new(3);
        assert_eq!(set.describe(EmotionKind::Contentment), "I'm feeling contentment");
        set.insert(st(EmotionKind::Curiosity, 0.9, 0));
        set.insert(st(EmotionKind::Excitement, 0.5, 1));
        assert_eq!(
            set.describe(EmotionKind::Contentment),
            "I'm feeling very curiosity and excitement"
        );
    }

    #[test]
    fn test_sweep_returns_dropped() {
        let mut set = ActiveEmotionSet::new(3);
        set.insert(st(EmotionKind::Joy, 0.5, 0));
        set.insert(st(EmotionKind::Hope, 0.05, 1));
        let dropped = set.sweep(|s| s.intensity >= 0.1);
        assert_eq!(dropped.len(), 1);
        assert_eq!(set.len(), 1);
    }
}
