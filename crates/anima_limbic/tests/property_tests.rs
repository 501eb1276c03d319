//! Property-based tests for the active set, decay, mood and regulation.
//!
//! These cover the invariants that must hold for any sequence of inserts
//! and ticks, independent of which emotions happen to be involved.

use anima_core::{EmotionKind, EmotionalState};
use anima_limbic::classifier::parse_classification;
use anima_limbic::{ActiveEmotionSet, ComplexityLayer, DecayScheduler, MoodTracker, RegulationStrategy};
use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

fn arb_kind() -> impl Strategy<Value = EmotionKind> {
    (0..EmotionKind::ALL.len()).prop_map(|i| EmotionKind::ALL[i])
}

fn arb_state() -> impl Strategy<Value = EmotionalState> {
    (arb_kind(), 0.0f32..=1.0, 0i64..600)
        .prop_map(|(k, i, secs)| EmotionalState::new(k, i, "prop", t0() + Duration::seconds(secs)))
}

fn arb_strategy() -> impl Strategy<Value = RegulationStrategy> {
    prop_oneof![
        Just(RegulationStrategy::CognitiveReappraisal),
        Just(RegulationStrategy::Suppression),
        Just(RegulationStrategy::Expression),
        Just(RegulationStrategy::Acceptance),
        Just(RegulationStrategy::Distraction),
    ]
}

// ============================================================================
// Active set
// ============================================================================

proptest! {
    /// The set never holds more than its capacity, whatever is inserted.
    #[test]
    fn active_set_respects_capacity(
        cap in 1usize..6,
        states in prop::collection::vec(arb_state(), 0..30),
    ) {
        let mut set = ActiveEmotionSet::new(cap);
        for s in states {
            set.insert(s);
            prop_assert!(set.len() <= cap);
        }
    }

    /// The dominant emotion has the maximum intensity in the set.
    #[test]
    fn dominant_is_argmax(states in prop::collection::vec(arb_state(), 1..10)) {
        let mut set = ActiveEmotionSet::new(10);
        for s in states {
            set.insert(s);
        }
        let dominant = set.dominant().unwrap();
        prop_assert!(set.iter().all(|s| s.intensity <= dominant.intensity));
    }

    /// An eviction never removes something stronger than every survivor.
    #[test]
    fn evicted_is_never_strongest(states in prop::collection::vec(arb_state(), 4..20)) {
        let mut set = ActiveEmotionSet::new(3);
        for s in states {
            if let Some(evicted) = set.insert(s) {
                prop_assert!(set.iter().all(|kept| kept.intensity >= evicted.intensity));
            }
        }
    }
}

// ============================================================================
// Decay
// ============================================================================

proptest! {
    /// Two ticks at the same instant leave the set unchanged.
    #[test]
    fn tick_is_idempotent(
        states in prop::collection::vec(arb_state(), 0..5),
        after_secs in 0i64..3600,
    ) {
        let scheduler = DecayScheduler::default();
        let mut set = ActiveEmotionSet::new(5);
        for s in states {
            set.insert(s);
        }
        let now = t0() + Duration::seconds(600 + after_secs);
        scheduler.tick(&mut set, now);
        let once: Vec<EmotionalState> = set.iter().cloned().collect();
        scheduler.tick(&mut set, now);
        let twice: Vec<EmotionalState> = set.iter().cloned().collect();
        prop_assert_eq!(once, twice);
    }

    /// After a tick every survivor is at or above the fade threshold.
    #[test]
    fn tick_leaves_no_faded_members(
        states in prop::collection::vec(arb_state(), 0..5),
        mins in 0i64..20,
    ) {
        let scheduler = DecayScheduler::default();
        let mut set = ActiveEmotionSet::new(5);
        for s in states {
            set.insert(s);
        }
        scheduler.tick(&mut set, t0() + Duration::minutes(10 + mins));
        prop_assert!(set.iter().all(|s| s.intensity >= scheduler.fade_threshold && s.intensity <= 1.0));
    }
}

// ============================================================================
// Mood, regulation, classification parsing
// ============================================================================

proptest! {
    #[test]
    fn mood_intensity_in_unit_range(states in prop::collection::vec(arb_state(), 1..20)) {
        let mut tracker = MoodTracker::default();
        tracker.update(states.iter(), t0() + Duration::minutes(10));
        if let Some(m) = tracker.mood() {
            prop_assert!(m.intensity >= 0.0 && m.intensity <= 1.0);
        }
    }

    #[test]
    fn regulation_never_amplifies(
        intensity in 0.0f32..=1.0,
        strategy in arb_strategy(),
    ) {
        let layer = ComplexityLayer::new();
        let out = layer.regulate("anxious", intensity, Some(strategy));
        prop_assert!(out.new_intensity <= intensity + 1e-6);
        prop_assert!(out.new_intensity >= 0.0);
    }

    #[test]
    fn parsed_intensity_is_clamped(kind in arb_kind(), raw in -10.0f64..10.0) {
        let reply = format!(r#"{{"emotion": "{}", "intensity": {}}}"#, kind.label(), raw);
        let c = parse_classification(&reply).unwrap();
        prop_assert_eq!(c.emotion, kind);
        prop_assert!(c.intensity >= 0.1 && c.intensity <= 1.0);
    }
}
