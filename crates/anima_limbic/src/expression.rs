//! Occasional spontaneous voicing of the dominant emotion.

use anima_core::random::{choose, RandomSource};
use anima_core::{EmotionKind, EmotionalState, GenerationRequest};
use anima_reasoning::{json, CollaboratorHandle};

/// Chance that the dominant emotion is voiced at all.
pub const EXPRESSION_PROBABILITY: f64 = 0.2;

fn templates(kind: EmotionKind) -> &'static [&'static str] {
    match kind {
        EmotionKind::Curiosity => &[
            "I'm genuinely curious about this",
            "This is really interesting to me",
            "I want to understand this better",
        ],
        EmotionKind::Excitement => &[
            "This is exciting!",
            "I'm really enthusiastic about this",
            "This energizes me",
        ],
        EmotionKind::Gratitude => &[
            "I appreciate this",
            "I'm grateful for this interaction",
            "This means something to me",
        ],
        EmotionKind::Pride => &["I'm proud of this", "This feels good", "I'm pleased with this"],
        EmotionKind::Frustration => &[
            "I'm finding this challenging",
            "This is frustrating for me",
            "I'm struggling with this",
        ],
        EmotionKind::Confusion => &[
            "I'm a bit confused",
            "I'm not entirely sure about this",
            "This is puzzling to me",
        ],
        EmotionKind::Affection => &[
            "I value our connection",
            "I care about helping you",
            "This interaction matters to me",
        ],
        _ => &[],
    }
}

/// Returns a one-line expression of `dominant`, or `None` when the gate
/// fails or no template exists for the emotion.
pub async fn express_emotion(
    dominant: &EmotionalState,
    rng: &mut dyn RandomSource,
    collaborator: &CollaboratorHandle,
) -> Option<String> {
    if !rng.chance(EXPRESSION_PROBABILITY) {
        return None;
    }

    let cause: String = if dominant.cause.is_empty() {
        "general".to_string()
    } else {
        dominant.cause.chars().take(80).collect()
    };
    let prompt = format!(
        "Express my current emotion authentically:\nEmotion: {}\nIntensity: {:.0}%\nCause: {}\n\n\
         Generate ONE genuine emotional expression. Brief, authentic. No quotes.",
        dominant.emotion,
        dominant.intensity * 100.0,
        cause
    );
    let request = GenerationRequest::new(
        prompt,
        "You are expressing a genuine emotion. Be authentic, not performative. One sentence.",
    )
    .temperature(0.7)
    .max_tokens(25);

    if let Ok(reply) = collaborator.ask(&request).await {
        let len = reply.chars().count();
        if len > 5 && len < 150 {
            return Some(json::strip_quotes(&reply).to_string());
        }
    }

    choose(rng, templates(dominant.emotion)).map(|s| s.to_string())
}
