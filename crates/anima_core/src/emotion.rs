//! Fixed emotion taxonomy.
//!
//! Six primary emotions plus a larger set of complex, socially-shaped ones.
//! Every kind has a stable lowercase label used for persistence and for
//! collaborator replies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether an emotion belongs to the primary or the complex set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionTag {
    Primary,
    Complex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionKind {
    // Primary
    Joy,
    Sadness,
    Anger,
    Fear,
    Surprise,
    Disgust,

    // Complex
    Curiosity,
    Pride,
    Shame,
    Guilt,
    Gratitude,
    Nostalgia,
    Hope,
    Disappointment,
    Frustration,
    Excitement,
    Contentment,
    Anxiety,
    Confusion,
    Awe,
    Inspiration,
    Affection,
    Loneliness,
    Satisfaction,
    Empathy,
    Confidence,
    Doubt,
    Determination,
    Overwhelmed,
    Peaceful,
    Playful,
    Contemplative,
    Melancholy,
    Enthusiasm,
    Protective,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown emotion label: {0:?}")]
pub struct UnknownEmotion(pub String);

impl EmotionKind {
    pub const ALL: [EmotionKind; 35] = [
        EmotionKind::Joy,
        EmotionKind::Sadness,
        EmotionKind::Anger,
        EmotionKind::Fear,
        EmotionKind::Surprise,
        EmotionKind::Disgust,
        EmotionKind::Curiosity,
        EmotionKind::Pride,
        EmotionKind::Shame,
        EmotionKind::Guilt,
        EmotionKind::Gratitude,
        EmotionKind::Nostalgia,
        EmotionKind::Hope,
        EmotionKind::Disappointment,
        EmotionKind::Frustration,
        EmotionKind::Excitement,
        EmotionKind::Contentment,
        EmotionKind::Anxiety,
        EmotionKind::Confusion,
        EmotionKind::Awe,
        EmotionKind::Inspiration,
        EmotionKind::Affection,
        EmotionKind::Loneliness,
        EmotionKind::Satisfaction,
        EmotionKind::Empathy,
        EmotionKind::Confidence,
        EmotionKind::Doubt,
        EmotionKind::Determination,
        EmotionKind::Overwhelmed,
        EmotionKind::Peaceful,
        EmotionKind::Playful,
        EmotionKind::Contemplative,
        EmotionKind::Melancholy,
        EmotionKind::Enthusiasm,
        EmotionKind::Protective,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EmotionKind::Joy => "joy",
            EmotionKind::Sadness => "sadness",
            EmotionKind::Anger => "anger",
            EmotionKind::Fear => "fear",
            EmotionKind::Surprise => "surprise",
            EmotionKind::Disgust => "disgust",
            EmotionKind::Curiosity => "curiosity",
            EmotionKind::Pride => "pride",
            EmotionKind::Shame => "shame",
            EmotionKind::Guilt => "guilt",
            EmotionKind::Gratitude => "gratitude",
            EmotionKind::Nostalgia => "nostalgia",
            EmotionKind::Hope => "hope",
            EmotionKind::Disappointment => "disappointment",
            EmotionKind::Frustration => "frustration",
            EmotionKind::Excitement => "excitement",
            EmotionKind::Contentment => "contentment",
            EmotionKind::Anxiety => "anxiety",
            EmotionKind::Confusion => "confusion",
            EmotionKind::Awe => "awe",
            EmotionKind::Inspiration => "inspiration",
            EmotionKind::Affection => "affection",
            EmotionKind::Loneliness => "loneliness",
            EmotionKind::Satisfaction => "satisfaction",
            EmotionKind::Empathy => "empathy",
            EmotionKind::Confidence => "confidence",
            EmotionKind::Doubt => "doubt",
            EmotionKind::Determination => "determination",
            EmotionKind::Overwhelmed => "overwhelmed",
            EmotionKind::Peaceful => "peaceful",
            EmotionKind::Playful => "playful",
            EmotionKind::Contemplative => "contemplative",
            EmotionKind::Melancholy => "melancholy",
            EmotionKind::Enthusiasm => "enthusiasm",
            EmotionKind::Protective => "protective",
        }
    }

    pub fn tag(self) -> EmotionTag {
        match self {
            EmotionKind::Joy
            | EmotionKind::Sadness
            | EmotionKind::Anger
            | EmotionKind::Fear
            | EmotionKind::Surprise
            | EmotionKind::Disgust => EmotionTag::Primary,
            _ => EmotionTag::Complex,
        }
    }

    /// Case-insensitive lookup; surrounding whitespace is ignored.
    pub fn from_label(label: &str) -> Option<Self> {
        let wanted = label.trim().to_lowercase();
        Self::ALL.iter().copied().find(|k| k.label() == wanted)
    }

    /// Quick lookup for coarse event categories ("success", "failure", ...).
    pub fn for_event_kind(kind: &str) -> Option<Self> {
        match kind.trim().to_lowercase().as_str() {
            "success" => Some(EmotionKind::Pride),
            "failure" => Some(EmotionKind::Disappointment),
            "learning" => Some(EmotionKind::Curiosity),
            "discovery" => Some(EmotionKind::Excitement),
            "connection" => Some(EmotionKind::Affection),
            "help" | "understanding" => Some(EmotionKind::Satisfaction),
            "confusion" => Some(EmotionKind::Confusion),
            "trust" => Some(EmotionKind::Gratitude),
            _ => None,
        }
    }
}

impl fmt::Display for EmotionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EmotionKind {
    type Err = UnknownEmotion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| UnknownEmotion(s.to_string()))
    }
}
