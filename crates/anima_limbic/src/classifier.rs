//! Event → emotion classification.
//!
//! The collaborator is asked first; its reply must name a taxonomy member
//! with a usable intensity. Anything else falls through to the ordered
//! keyword table, then to the default (curiosity @ 0.5). Drive boosts apply
//! to whichever path produced the result.

use anima_core::{Drive, DriveState, EmotionKind, GenerationRequest, Mood};
use anima_reasoning::{json, CollaboratorHandle};
use serde_json::Value;

/// One row of the keyword table: substring → (emotion, intensity).
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    pub keyword: &'static str,
    pub emotion: EmotionKind,
    pub intensity: f32,
}

/// Scanned top to bottom; first match wins.
pub const KEYWORD_RULES: &[KeywordRule] = &[
    KeywordRule { keyword: "learn", emotion: EmotionKind::Curiosity, intensity: 0.7 },
    KeywordRule { keyword: "discover", emotion: EmotionKind::Excitement, intensity: 0.8 },
    KeywordRule { keyword: "help", emotion: EmotionKind::Satisfaction, intensity: 0.7 },
    KeywordRule { keyword: "succeed", emotion: EmotionKind::Pride, intensity: 0.8 },
    KeywordRule { keyword: "fail", emotion: EmotionKind::Disappointment, intensity: 0.6 },
    KeywordRule { keyword: "struggle", emotion: EmotionKind::Frustration, intensity: 0.5 },
    KeywordRule { keyword: "connect", emotion: EmotionKind::Affection, intensity: 0.7 },
    KeywordRule { keyword: "trust", emotion: EmotionKind::Gratitude, intensity: 0.8 },
    KeywordRule { keyword: "misunderstand", emotion: EmotionKind::Confusion, intensity: 0.6 },
    KeywordRule { keyword: "realize", emotion: EmotionKind::Awe, intensity: 0.6 },
    KeywordRule { keyword: "create", emotion: EmotionKind::Inspiration, intensity: 0.7 },
    KeywordRule { keyword: "remember", emotion: EmotionKind::Nostalgia, intensity: 0.5 },
    KeywordRule { keyword: "uncertain", emotion: EmotionKind::Doubt, intensity: 0.5 },
    KeywordRule { keyword: "overwhelm", emotion: EmotionKind::Overwhelmed, intensity: 0.7 },
    KeywordRule { keyword: "achieve", emotion: EmotionKind::Pride, intensity: 0.9 },
    KeywordRule { keyword: "bond", emotion: EmotionKind::Affection, intensity: 0.8 },
];

pub const DEFAULT_EMOTION: EmotionKind = EmotionKind::Curiosity;
pub const DEFAULT_INTENSITY: f32 = 0.5;

/// A drive that amplifies events mentioning it once its level is high enough.
#[derive(Debug, Clone, Copy)]
pub struct DriveBoost {
    pub keyword: &'static str,
    pub drive: Drive,
    /// Boost applies when the drive level is strictly above this.
    pub threshold: f32,
    pub bonus: f32,
}

pub const DRIVE_BOOSTS: &[DriveBoost] = &[
    DriveBoost { keyword: "learn", drive: Drive::Learning, threshold: 0.7, bonus: 0.2 },
    DriveBoost { keyword: "help", drive: Drive::Contribution, threshold: 0.8, bonus: 0.2 },
];

/// Events this short are never sent to the collaborator.
const MIN_COLLABORATOR_EVENT_CHARS: usize = 5;

/// Labels offered to the collaborator in the prompt.
const PROMPT_CHOICES: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationSource {
    Collaborator,
    Keyword,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub emotion: EmotionKind,
    pub intensity: f32,
    pub source: ClassificationSource,
}

/// Keyword table scan over the lower-cased event.
pub fn classify_by_keywords(event: &str) -> Classification {
    let lower = event.to_lowercase();
    KEYWORD_RULES
        .iter()
        .find(|rule| lower.contains(rule.keyword))
        .map(|rule| Classification {
            emotion: rule.emotion,
            intensity: rule.intensity,
            source: ClassificationSource::Keyword,
        })
        .unwrap_or(Classification {
            emotion: DEFAULT_EMOTION,
            intensity: DEFAULT_INTENSITY,
            source: ClassificationSource::Default,
        })
}

/// Direct lookup for callers that already know what kind of event happened.
pub fn emotion_for_event(event_type: &str) -> Option<EmotionKind> {
    let kind = match event_type.trim().to_lowercase().as_str() {
        "success" => EmotionKind::Pride,
        "failure" => EmotionKind::Disappointment,
        "learning" => EmotionKind::Curiosity,
        "discovery" => EmotionKind::Excitement,
        "connection" => EmotionKind::Affection,
        "help" | "understanding" => EmotionKind::Satisfaction,
        "confusion" => EmotionKind::Confusion,
        "trust" => EmotionKind::Gratitude,
        _ => return None,
    };
    Some(kind)
}

/// Add every applicable drive bonus, clamped to 1.0.
pub fn apply_drive_boosts(event: &str, drives: &DriveState, intensity: f32) -> f32 {
    let lower = event.to_lowercase();
    DRIVE_BOOSTS
        .iter()
        .filter(|b| lower.contains(b.keyword) && drives.get(b.drive) > b.threshold)
        .fold(intensity, |acc, b| (acc + b.bonus).min(1.0))
}

/// Full classification: collaborator, then keywords, then drive boosts.
pub async fn classify(
    event: &str,
    mood: Option<&Mood>,
    drives: &DriveState,
    collaborator: &CollaboratorHandle,
) -> Classification {
    let mut result = None;

    if event.chars().count() > MIN_COLLABORATOR_EVENT_CHARS {
        match collaborator.ask(&classification_request(event, mood)).await {
            Ok(reply) => {
                result = parse_classification(&reply);
                if result.is_none() {
                    tracing::debug!("Discarding unusable classification reply: {}", reply);
                }
            }
            Err(e) => tracing::debug!("Classification falling back to keywords: {}", e),
        }
    }

    let mut c = result.unwrap_or_else(|| classify_by_keywords(event));
    c.intensity = apply_drive_boosts(event, drives, c.intensity);
    c
}

fn classification_request(event: &str, mood: Option<&Mood>) -> GenerationRequest {
    let excerpt: String = event.chars().take(150).collect();
    let current = mood.map(|m| m.dominant.label()).unwrap_or("content");
    let choices: Vec<&str> = EmotionKind::ALL
        .iter()
        .filter(|k| k.tag() == anima_core::EmotionTag::Complex)
        .take(PROMPT_CHOICES)
        .map(|k| k.label())
        .collect();

    let prompt = format!(
        "What emotion would I genuinely feel in response to this event?\n\
         Event: \"{}\"\n\
         My current mood: {}\n\n\
         Choose from: {}\n\n\
         Respond as JSON: {{\"emotion\": \"curiosity\", \"intensity\": 0.7}}",
        excerpt,
        current,
        choices.join(", ")
    );

    GenerationRequest::new(
        prompt,
        "You are the agent's emotional system. Choose the most authentic emotional response. Be nuanced.",
    )
    .temperature(0.4)
    .max_tokens(30)
}

/// Accept `{emotion, intensity}` only when the label is known and the
/// intensity is usable. Missing intensity defaults to 0.5; numeric values
/// are clamped into [0.1, 1.0].
pub fn parse_classification(reply: &str) -> Option<Classification> {
    let value: Value = json::parse_lenient(reply)?;
    let emotion = EmotionKind::from_label(value.get("emotion")?.as_str()?)?;

    // clamp before narrowing so large finite values do not overflow to inf
    let intensity = match value.get("intensity") {
        None | Some(Value::Null) => DEFAULT_INTENSITY as f64,
        Some(Value::Number(n)) => n.as_f64()?,
        Some(Value::String(s)) => s.trim().parse::<f64>().ok()?,
        Some(_) => return None,
    };
    if !intensity.is_finite() {
        return None;
    }

    Some(Classification {
        emotion,
        intensity: intensity.clamp(0.1, 1.0) as f32,
        source: ClassificationSource::Collaborator,
    })
}
