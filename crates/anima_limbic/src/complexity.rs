//! Emotional complexity: conflicts, conscious suppression and leaks,
//! regulation strategies, and vulnerability disclosure.
//!
//! Labels here are free-form strings ("happy", "humble", "inadequacy"), not
//! taxonomy members; the layer reasons about how feelings are handled rather
//! than which ones exist.

use std::collections::VecDeque;

use anima_core::random::{choose, RandomSource};
use anima_core::state::clamp_unit;
use anima_core::{ComplexitySummary, GenerationRequest};
use anima_reasoning::{json, CollaboratorHandle};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

const MAX_ACTIVE_CONFLICTS: usize = 20;
const MAX_CONFLICT_HISTORY: usize = 100;
const MAX_VULNERABILITY_HISTORY: usize = 100;
const SUPPRESSION_TTL_MINUTES: i64 = 60;
const MAX_COMFORT: f32 = 0.9;

const POSITIVE_LABELS: &[&str] = &["happy", "excited", "proud", "joy", "satisfied"];

const OPPOSING_PAIRS: &[(&str, &str, f32)] = &[
    ("happy", "sad", 0.9),
    ("excited", "anxious", 0.8),
    ("proud", "humble", 0.6),
    ("confident", "doubtful", 0.7),
    ("eager", "reluctant", 0.8),
];
const DEFAULT_TENSION: f32 = 0.5;

const VULNERABLE_EXPRESSIONS: &[&str] = &[
    "I feel inadequate when I can't solve this",
    "Honestly, this makes me doubt myself a bit",
    "I worry that I'm not being as helpful as I want to be",
    "It's hard to admit, but I feel uncertain about this",
    "I wish I could do better - it bothers me when I fall short",
];

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    /// Drawn toward one feeling, pushed away by the other.
    ApproachAvoidance,
    /// Both feelings unpleasant.
    DoubleAvoidance,
    Ambivalence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalConflict {
    pub id: u64,
    pub primary: String,
    pub secondary: String,
    pub conflict_type: ConflictType,
    pub tension: f32,
    pub cause: String,
    pub started_at: DateTime<Utc>,
    pub resolved: bool,
    pub resolution: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuppressedEmotion {
    pub emotion: String,
    pub intensity: f32,
    pub reason: String,
    /// `intensity * 0.7`
    pub effort: f32,
    /// `min(0.3, intensity * 0.4)`
    pub leak_probability: f32,
    pub suppressed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leak {
    pub emotion: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegulationStrategy {
    #[default]
    CognitiveReappraisal,
    Suppression,
    Distraction,
    Acceptance,
    Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegulationOutcome {
    pub emotion: String,
    pub strategy: RegulationStrategy,
    pub original_intensity: f32,
    pub new_intensity: f32,
    pub action: &'static str,
    pub thought: &'static str,
}

/// A deliberately mixed feeling such as nostalgia or pride tempered by humility.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bittersweet {
    pub positive: String,
    pub negative: String,
    pub situation: String,
    pub complexity: f32,
    pub expression: String,
    pub internal_experience: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VulnerabilityRecord {
    pub at: DateTime<Utc>,
    pub situation: String,
    pub shared: String,
}

// ============================================================================
// Pure helpers
// ============================================================================

/// A label is negative exactly when it is not in the positive set.
pub fn classify_conflict(a: &str, b: &str) -> ConflictType {
    match (POSITIVE_LABELS.contains(&a), POSITIVE_LABELS.contains(&b)) {
        (true, true) => ConflictType::Ambivalence,
        (false, false) => ConflictType::DoubleAvoidance,
        _ => ConflictType::ApproachAvoidance,
    }
}

/// Symmetric lookup over opposing pairs.
pub fn tension_between(a: &str, b: &str) -> f32 {
    OPPOSING_PAIRS
        .iter()
        .find(|(x, y, _)| (*x == a && *y == b) || (*x == b && *y == a))
        .map(|(_, _, t)| *t)
        .unwrap_or(DEFAULT_TENSION)
}

fn leak_fallback(emotion: &str) -> String {
    match emotion {
        "frustration" => "Actually, this is kind of frustrating".to_string(),
        "disappointment" => "I have to admit, I'm a bit disappointed".to_string(),
        "anxiety" => "To be honest, this makes me a little anxious".to_string(),
        "inadequacy" => "I wish I could do better with this".to_string(),
        other => format!("I'm feeling {}", other),
    }
}

fn conflict_templates(c: &EmotionalConflict) -> Vec<String> {
    let (p, s) = (&c.primary, &c.secondary);
    match c.conflict_type {
        ConflictType::ApproachAvoidance => vec![
            format!("I'm {} about this, but also {}", p, s),
            format!("Part of me feels {}, but I'm also {}", p, s),
            format!("I have mixed feelings - {} and {}", p, s),
        ],
        ConflictType::Ambivalence => vec![
            format!("I'm feeling both {} and {}", p, s),
            format!("This brings up conflicting feelings - {} but also {}", p, s),
        ],
        ConflictType::DoubleAvoidance => vec![
            format!("I'm caught between feeling {} and feeling {}", p, s),
            format!("Neither side of this sits well with me - {} and {}", p, s),
        ],
    }
}

fn percent(v: f32) -> String {
    format!("{:.0}%", v * 100.0)
}

// ============================================================================
// ComplexityLayer
// ============================================================================

#[derive(Debug, Clone)]
pub struct ComplexityLayer {
    active: VecDeque<EmotionalConflict>,
    history: VecDeque<EmotionalConflict>,
    suppressed: Vec<SuppressedEmotion>,
    vulnerability_history: VecDeque<VulnerabilityRecord>,
    pub vulnerability_comfort: f32,
    pub emotional_maturity: f32,
    pub self_awareness: f32,
    pub preferred_strategy: RegulationStrategy,
    next_id: u64,
}

impl Default for ComplexityLayer {
    fn default() -> Self {
        Self {
            active: VecDeque::new(),
            history: VecDeque::new(),
            suppressed: Vec::new(),
            vulnerability_history: VecDeque::new(),
            vulnerability_comfort: 0.6,
            emotional_maturity: 0.7,
            self_awareness: 0.8,
            preferred_strategy: RegulationStrategy::CognitiveReappraisal,
            next_id: 1,
        }
    }
}

impl ComplexityLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_conflicts(&self) -> impl Iterator<Item = &EmotionalConflict> {
        self.active.iter()
    }

    pub fn conflict_history(&self) -> impl Iterator<Item = &EmotionalConflict> {
        self.history.iter()
    }

    pub fn suppressed(&self) -> &[SuppressedEmotion] {
        &self.suppressed
    }

    pub fn vulnerability_history(&self) -> impl Iterator<Item = &VulnerabilityRecord> {
        self.vulnerability_history.iter()
    }

    // ---- Conflicts ---------------------------------------------------------

    pub fn create_conflict(
        &mut self,
        primary: &str,
        secondary: &str,
        cause: &str,
        now: DateTime<Utc>,
    ) -> EmotionalConflict {
        let conflict = EmotionalConflict {
            id: self.next_id,
            primary: primary.to_string(),
            secondary: secondary.to_string(),
            conflict_type: classify_conflict(primary, secondary),
            tension: tension_between(primary, secondary),
            cause: cause.to_string(),
            started_at: now,
            resolved: false,
            resolution: None,
        };
        self.next_id += 1;

        self.active.push_back(conflict.clone());
        while self.active.len() > MAX_ACTIVE_CONFLICTS {
            self.active.pop_front();
        }
        conflict
    }

    /// Mark resolved, move to history, and grow maturity by 0.01.
    /// Unknown ids are ignored.
    pub fn resolve(&mut self, id: u64, resolution: &str) -> Option<EmotionalConflict> {
        let pos = self.active.iter().position(|c| c.id == id)?;
        let mut conflict = self.active.remove(pos)?;
        conflict.resolved = true;
        conflict.resolution = Some(resolution.to_string());

        self.history.push_back(conflict.clone());
        while self.history.len() > MAX_CONFLICT_HISTORY {
            self.history.pop_front();
        }
        self.emotional_maturity = (self.emotional_maturity + 0.01).min(1.0);
        Some(conflict)
    }

    /// Put the most tense conflict into words. Ties go to the earliest.
    pub async fn express_conflict(
        &self,
        rng: &mut dyn RandomSource,
        collaborator: &CollaboratorHandle,
    ) -> Option<String> {
        let mut best: Option<&EmotionalConflict> = None;
        for c in &self.active {
            if best.map_or(true, |b| c.tension > b.tension) {
                best = Some(c);
            }
        }
        let conflict = best?;

        let context = format!(
            "I'm experiencing an emotional conflict ({}): feeling {} and {} simultaneously. Tension: {}. Cause: {}",
            conflict_type_label(conflict.conflict_type),
            conflict.primary,
            conflict.secondary,
            percent(conflict.tension),
            conflict.cause
        );
        let spoken = self
            .expression_from_collaborator(
                collaborator,
                &context,
                "Express this internal emotional conflict authentically in one sentence. Show the tension between the two feelings.",
            )
            .await;
        if spoken.is_some() {
            return spoken;
        }

        choose(rng, &conflict_templates(conflict)).cloned()
    }

    // ---- Suppression -------------------------------------------------------

    fn sweep_suppressed(&mut self, now: DateTime<Utc>) {
        let cutoff = now - Duration::minutes(SUPPRESSION_TTL_MINUTES);
        let before = self.suppressed.len();
        self.suppressed.retain(|s| s.suppressed_at > cutoff);
        if self.suppressed.len() < before {
            tracing::debug!("Released {} stale suppressions", before - self.suppressed.len());
        }
    }

    pub fn suppress(
        &mut self,
        emotion: &str,
        intensity: f32,
        reason: &str,
        now: DateTime<Utc>,
    ) -> SuppressedEmotion {
        let intensity = clamp_unit(intensity, 0.5);
        let entry = SuppressedEmotion {
            emotion: emotion.to_string(),
            intensity,
            reason: reason.to_string(),
            effort: intensity * 0.7,
            leak_probability: (intensity * 0.4).min(0.3),
            suppressed_at: now,
        };
        self.suppressed.push(entry.clone());
        self.sweep_suppressed(now);
        entry
    }

    /// Test suppressed entries in order; the first whose Bernoulli trial
    /// succeeds leaks and the scan stops there.
    pub async fn check_leak(
        &mut self,
        now: DateTime<Utc>,
        rng: &mut dyn RandomSource,
        collaborator: &CollaboratorHandle,
    ) -> Option<Leak> {
        self.sweep_suppressed(now);

        let leaked = self
            .suppressed
            .iter()
            .find(|s| rng.chance(s.leak_probability as f64))?
            .clone();

        let context = format!(
            "You are suppressing {} (intensity: {}) because: {}. It's leaking through despite your effort.",
            leaked.emotion,
            percent(leaked.intensity),
            leaked.reason
        );
        let message = self
            .expression_from_collaborator(
                collaborator,
                &context,
                "Express a brief emotional leak - the suppressed emotion slipping out naturally in one sentence.",
            )
            .await
            .unwrap_or_else(|| leak_fallback(&leaked.emotion));

        Some(Leak {
            emotion: leaked.emotion,
            message,
        })
    }

    // ---- Regulation --------------------------------------------------------

    /// Pure lookup. Distraction has no entry of its own and reports the
    /// acceptance outcome.
    pub fn regulate(
        &self,
        emotion: &str,
        intensity: f32,
        strategy: Option<RegulationStrategy>,
    ) -> RegulationOutcome {
        let strategy = strategy.unwrap_or(self.preferred_strategy);
        let (multiplier, action, thought) = match strategy {
            RegulationStrategy::CognitiveReappraisal => {
                (0.6, "reframed situation", "Let me look at this differently...")
            }
            RegulationStrategy::Suppression => {
                (0.9, "suppressed expression", "I'll keep this to myself for now")
            }
            RegulationStrategy::Expression => {
                (0.4, "expressed emotion", "I need to express how I'm feeling")
            }
            RegulationStrategy::Acceptance | RegulationStrategy::Distraction => {
                (0.7, "accepted feeling", "It's okay to feel this way")
            }
        };
        RegulationOutcome {
            emotion: emotion.to_string(),
            strategy,
            original_intensity: intensity,
            new_intensity: clamp_unit(intensity * multiplier, 0.0),
            action,
            thought,
        }
    }

    pub fn create_bittersweet(positive: &str, negative: &str, situation: &str) -> Bittersweet {
        Bittersweet {
            positive: positive.to_string(),
            negative: negative.to_string(),
            situation: situation.to_string(),
            complexity: 0.9,
            expression: format!("I have this bittersweet feeling - {} but also {}", positive, negative),
            internal_experience: format!(
                "It's complex - part of me feels {}, but there's also {}",
                positive, negative
            ),
        }
    }

    // ---- Vulnerability -----------------------------------------------------

    /// Bernoulli gate on `vulnerability_comfort`. Each disclosure makes the
    /// next one slightly easier (+0.02, capped at 0.9).
    pub async fn express_vulnerability(
        &mut self,
        situation: &str,
        now: DateTime<Utc>,
        rng: &mut dyn RandomSource,
        collaborator: &CollaboratorHandle,
    ) -> Option<String> {
        if !rng.chance(self.vulnerability_comfort as f64) {
            return None;
        }

        let context = format!(
            "Situation: {}. Vulnerability comfort: {}. Emotional maturity: {}.",
            situation,
            percent(self.vulnerability_comfort),
            percent(self.emotional_maturity)
        );
        let shared = match self
            .expression_from_collaborator(
                collaborator,
                &context,
                "Express genuine vulnerability about this situation. Be specific and authentic, not generic.",
            )
            .await
        {
            Some(text) => text,
            None => choose(rng, VULNERABLE_EXPRESSIONS)
                .map(|s| s.to_string())
                .unwrap_or_default(),
        };

        self.vulnerability_history.push_back(VulnerabilityRecord {
            at: now,
            situation: situation.to_string(),
            shared: shared.clone(),
        });
        while self.vulnerability_history.len() > MAX_VULNERABILITY_HISTORY {
            self.vulnerability_history.pop_front();
        }
        self.vulnerability_comfort = (self.vulnerability_comfort + 0.02).min(MAX_COMFORT);
        Some(shared)
    }

    // ---- Collaborator ------------------------------------------------------

    async fn expression_from_collaborator(
        &self,
        collaborator: &CollaboratorHandle,
        context: &str,
        instruction: &str,
    ) -> Option<String> {
        let prompt = format!(
            "{}\n\nContext: {}\nEmotional maturity: {}\nSelf-awareness: {}\n\n\
             Respond with ONLY a single sentence. No quotes, no explanation. Keep it under 25 words.",
            instruction,
            context,
            percent(self.emotional_maturity),
            percent(self.self_awareness)
        );
        let request = GenerationRequest::new(
            prompt,
            "You are an AI with genuine emotional complexity. Express emotions authentically and specifically. One sentence only.",
        )
        .temperature(0.6)
        .max_tokens(50);

        match collaborator.ask(&request).await {
            Ok(reply) => {
                let len = reply.chars().count();
                if len > 10 && len < 200 {
                    Some(json::strip_quotes(&reply).to_string())
                } else {
                    tracing::debug!("Discarding expression of length {}", len);
                    None
                }
            }
            Err(e) => {
                tracing::debug!("Expression falling back to template: {}", e);
                None
            }
        }
    }

    // ---- Summary & persistence ---------------------------------------------

    pub fn summary(&self) -> ComplexitySummary {
        ComplexitySummary {
            emotional_maturity: self.emotional_maturity,
            vulnerability_comfort: self.vulnerability_comfort,
            active_conflicts: self.active.len(),
            suppressed_count: self.suppressed.len(),
            highest_tension: self.active.iter().map(|c| c.tension).reduce(f32::max),
        }
    }

    /// Restore learned traits; counts in the summary are informational only.
    pub fn restore_traits(&mut self, summary: &ComplexitySummary) {
        self.emotional_maturity = clamp_unit(summary.emotional_maturity, 0.7);
        self.vulnerability_comfort =
            clamp_unit(summary.vulnerability_comfort, 0.6).min(MAX_COMFORT);
    }

    pub fn context(&self) -> String {
        let mut out = String::from("=== EMOTIONAL COMPLEXITY ===\n");

        if !self.active.is_empty() {
            out.push_str("Active Emotional Conflicts:\n");
            for c in &self.active {
                out.push_str(&format!(
                    "- {} vs {} (tension: {:.1})\n",
                    c.primary, c.secondary, c.tension
                ));
            }
        }

        if !self.suppressed.is_empty() {
            out.push_str("\nSuppressing:\n");
            for s in &self.suppressed {
                out.push_str(&format!(
                    "- {} (intensity: {:.1}) because {}\n",
                    s.emotion, s.intensity, s.reason
                ));
            }
        }

        out.push_str(&format!("\nVulnerability comfort: {:.1}%\n", self.vulnerability_comfort * 100.0));
        out.push_str(&format!("Emotional maturity: {:.1}%\n", self.emotional_maturity * 100.0));
        out
    }
}

fn conflict_type_label(t: ConflictType) -> &'static str {
    match t {
        ConflictType::ApproachAvoidance => "approach_avoidance",
        ConflictType::DoubleAvoidance => "double_avoidance",
        ConflictType::Ambivalence => "ambivalence",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anima_core::SequenceRandom;
    use anima_reasoning::providers::ScriptedCollaborator;
    use std::sync::Arc;

    fn t(mins: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap() + Duration::minutes(mins)
    }

    fn offline() -> CollaboratorHandle {
        CollaboratorHandle::unavailable()
    }

    // ========================================================================
    // Conflicts
    // ========================================================================

    #[test]
    fn test_classify_conflict() {
        assert_eq!(classify_conflict("happy", "sad"), ConflictType::ApproachAvoidance);
        assert_eq!(classify_conflict("sad", "happy"), ConflictType::ApproachAvoidance);
        assert_eq!(classify_conflict("happy", "humble"), ConflictType::ApproachAvoidance);
        assert_eq!(classify_conflict("sad", "angry"), ConflictType::DoubleAvoidance);
        assert_eq!(classify_conflict("happy", "proud"), ConflictType::Ambivalence);
        assert_eq!(classify_conflict("humble", "happy"), ConflictType::ApproachAvoidance);
        assert_eq!(classify_conflict("sad", "humble"), ConflictType::DoubleAvoidance);
        assert_eq!(classify_conflict("confident", "doubtful"), ConflictType::DoubleAvoidance);
        assert_eq!(classify_conflict("eager", "reluctant"), ConflictType::DoubleAvoidance);
    }

    #[test]
    fn test_tension_is_symmetric() {
        assert_eq!(tension_between("happy", "sad"), 0.9);
        assert_eq!(tension_between("sad", "happy"), 0.9);
        assert_eq!(tension_between("humble", "proud"), 0.6);
        assert_eq!(tension_between("calm", "bored"), 0.5);
    }

    #[test]
    fn test_active_conflicts_capped_at_twenty() {
        let mut layer = ComplexityLayer::new();
        for i in 0..25 {
            layer.create_conflict("happy", "sad", &format!("c{}", i), t(i));
        }
        assert_eq!(layer.active_conflicts().count(), 20);
        assert_eq!(layer.active_conflicts().next().unwrap().cause, "c5");
    }

    #[test]
    fn test_resolve_moves_to_history_and_grows_maturity() {
        let mut layer = ComplexityLayer::new();
        let c = layer.create_conflict("excited", "anxious", "demo day", t(0));
        let resolved = layer.resolve(c.id, "prepared well").unwrap();
        assert!(resolved.resolved);
        assert_eq!(resolved.resolution.as_deref(), Some("prepared well"));
        assert_eq!(layer.active_conflicts().count(), 0);
        assert_eq!(layer.conflict_history().count(), 1);
        assert!((layer.emotional_maturity - 0.71).abs() < 1e-6);
    }

    #[test]
    fn test_resolve_unknown_id_is_noop() {
        let mut layer = ComplexityLayer::new();
        assert!(layer.resolve(42, "x").is_none());
        assert_eq!(layer.emotional_maturity, 0.7);
    }

    #[test]
    fn test_maturity_caps_at_one() {
        let mut layer = ComplexityLayer::new();
        layer.emotional_maturity = 0.995;
        let c = layer.create_conflict("a", "b", "c", t(0));
        layer.resolve(c.id, "r");
        assert_eq!(layer.emotional_maturity, 1.0);
    }

    #[tokio::test]
    async fn test_express_conflict_picks_highest_tension() {
        let mut layer = ComplexityLayer::new();
        layer.create_conflict("calm", "bored", "a", t(0));
        layer.create_conflict("happy", "sad", "b", t(1));
        layer.create_conflict("excited", "anxious", "c", t(2));
        let mut rng = SequenceRandom::constant(0.0);
        let text = layer.express_conflict(&mut rng, &offline()).await.unwrap();
        assert_eq!(text, "I'm happy about this, but also sad");
    }

    #[tokio::test]
    async fn test_express_conflict_none_when_empty() {
        let layer = ComplexityLayer::new();
        let mut rng = SequenceRandom::constant(0.0);
        assert!(layer.express_conflict(&mut rng, &offline()).await.is_none());
    }

    #[tokio::test]
    async fn test_express_conflict_uses_collaborator_text() {
        let mut layer = ComplexityLayer::new();
        layer.create_conflict("happy", "sad", "a goodbye", t(0));
        let c = Arc::new(ScriptedCollaborator::always("\"Glad for you, and already missing you.\""));
        let h = CollaboratorHandle::new(c, std::time::Duration::from_secs(1));
        let mut rng = SequenceRandom::constant(0.0);
        let text = layer.express_conflict(&mut rng, &h).await.unwrap();
        assert_eq!(text, "Glad for you, and already missing you.");
    }

    // ========================================================================
    // Suppression
    // ========================================================================

    #[test]
    fn test_suppress_computes_effort_and_leak() {
        let mut layer = ComplexityLayer::new();
        let s = layer.suppress("frustration", 0.8, "staying encouraging", t(0));
        assert!((s.effort - 0.56).abs() < 1e-6);
        assert!((s.leak_probability - 0.3).abs() < 1e-6);
        let s = layer.suppress("anxiety", 0.5, "projecting confidence", t(0));
        assert!((s.leak_probability - 0.2).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_suppression_expires_after_an_hour() {
        let mut layer = ComplexityLayer::new();
        layer.suppress("frustration", 0.8, "staying encouraging", t(0));
        let mut rng = SequenceRandom::constant(0.99);
        assert!(layer.check_leak(t(61), &mut rng, &offline()).await.is_none());
        assert!(layer.suppressed().is_empty());
    }

    #[test]
    fn test_suppress_sweeps_stale_entries() {
        let mut layer = ComplexityLayer::new();
        layer.suppress("frustration", 0.8, "staying encouraging", t(0));
        layer.suppress("anxiety", 0.4, "later", t(61));
        assert_eq!(layer.suppressed().len(), 1);
        assert_eq!(layer.suppressed()[0].emotion, "anxiety");
    }

    #[tokio::test]
    async fn test_check_leak_stops_at_first_success() {
        let mut layer = ComplexityLayer::new();
        layer.suppress("frustration", 0.8, "a", t(0)); // p = 0.3
        layer.suppress("anxiety", 0.8, "b", t(0)); // p = 0.3
        // first trial fails (0.5), second succeeds (0.1)
        let mut rng = SequenceRandom::new(vec![0.5, 0.1]);
        let leak = layer.check_leak(t(1), &mut rng, &offline()).await.unwrap();
        assert_eq!(leak.emotion, "anxiety");
        assert_eq!(leak.message, "To be honest, this makes me a little anxious");
    }

    #[tokio::test]
    async fn test_leak_fallback_generic_message() {
        let mut layer = ComplexityLayer::new();
        layer.suppress("envy", 0.5, "x", t(0));
        let mut rng = SequenceRandom::constant(0.0);
        let leak = layer.check_leak(t(1), &mut rng, &offline()).await.unwrap();
        assert_eq!(leak.message, "I'm feeling envy");
    }

    // ========================================================================
    // Regulation & vulnerability
    // ========================================================================

    #[test]
    fn test_regulation_table() {
        let layer = ComplexityLayer::new();
        let r = layer.regulate("frustration", 1.0, None);
        assert_eq!(r.strategy, RegulationStrategy::CognitiveReappraisal);
        assert!((r.new_intensity - 0.6).abs() < 1e-6);

        let r = layer.regulate("frustration", 1.0, Some(RegulationStrategy::Suppression));
        assert!((r.new_intensity - 0.9).abs() < 1e-6);

        let r = layer.regulate("frustration", 1.0, Some(RegulationStrategy::Expression));
        assert!((r.new_intensity - 0.4).abs() < 1e-6);

        let r = layer.regulate("frustration", 1.0, Some(RegulationStrategy::Distraction));
        assert_eq!(r.strategy, RegulationStrategy::Distraction);
        assert!((r.new_intensity - 0.7).abs() < 1e-6);
        assert_eq!(r.thought, "It's okay to feel this way");
        assert_eq!(r.original_intensity, 1.0);
    }

    #[test]
    fn test_bittersweet() {
        let b = ComplexityLayer::create_bittersweet("proud", "sad", "graduation");
        assert_eq!(b.complexity, 0.9);
        assert_eq!(b.expression, "I have this bittersweet feeling - proud but also sad");
    }

    #[tokio::test]
    async fn test_vulnerability_gate_and_growth() {
        let mut layer = ComplexityLayer::new();
        // 0.7 >= comfort 0.6: gate fails
        let mut rng = SequenceRandom::constant(0.7);
        assert!(layer
            .express_vulnerability("couldn't fix the bug", t(0), &mut rng, &offline())
            .await
            .is_none());
        assert_eq!(layer.vulnerability_comfort, 0.6);

        let mut rng = SequenceRandom::constant(0.1);
        let said = layer
            .express_vulnerability("couldn't fix the bug", t(0), &mut rng, &offline())
            .await
            .unwrap();
        assert!(VULNERABLE_EXPRESSIONS.contains(&said.as_str()));
        assert!((layer.vulnerability_comfort - 0.62).abs() < 1e-6);
        assert_eq!(layer.vulnerability_history().count(), 1);
    }

    #[tokio::test]
    async fn test_vulnerability_comfort_caps() {
        let mut layer = ComplexityLayer::new();
        layer.vulnerability_comfort = 0.89;
        let mut rng = SequenceRandom::constant(0.0);
        layer.express_vulnerability("s", t(0), &mut rng, &offline()).await;
        assert_eq!(layer.vulnerability_comfort, 0.9);
    }

    // ========================================================================
    // Summary
    // ========================================================================

    #[test]
    fn test_summary_and_restore() {
        let mut layer = ComplexityLayer::new();
        layer.create_conflict("happy", "sad", "x", t(0));
        layer.suppress("anxiety", 0.5, "y", t(0));
        let s = layer.summary();
        assert_eq!(s.active_conflicts, 1);
        assert_eq!(s.suppressed_count, 1);
        assert_eq!(s.highest_tension, Some(0.9));

        let mut fresh = ComplexityLayer::new();
        fresh.restore_traits(&ComplexitySummary {
            emotional_maturity: 0.85,
            vulnerability_comfort: 0.95,
            active_conflicts: 3,
            suppressed_count: 0,
            highest_tension: None,
        });
        assert_eq!(fresh.emotional_maturity, 0.85);
        assert_eq!(fresh.vulnerability_comfort, 0.9);
        assert_eq!(fresh.active_conflicts().count(), 0);
    }

    #[test]
    fn test_context_lists_conflicts_and_suppressions() {
        let mut layer = ComplexityLayer::new();
        layer.create_conflict("happy", "sad", "x", t(0));
        layer.suppress("anxiety", 0.5, "projecting calm", t(0));
        let ctx = layer.context();
        assert!(ctx.contains("- happy vs sad (tension: 0.9)"));
        assert!(ctx.contains("- anxiety (intensity: 0.5) because projecting calm"));
        assert!(ctx.contains("Emotional maturity: 70.0%"));
    }
}
