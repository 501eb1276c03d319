//! Dream narratives.
//!
//! The collaborator is asked for `{narrative, insight, tone}`. When it is
//! unavailable or the narrative is too short, a dream is stitched together
//! from a small template grammar and words from the source episode.

use anima_core::random::{choose, RandomSource};
use anima_core::Episode;
use anima_reasoning::json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_DREAM_INSIGHT: &str = "there's always more to discover";
pub const DEFAULT_DREAM_TONE: &str = "contemplative";

/// Tones the collaborator is offered.
pub const DREAM_TONES: &[&str] = &["curious", "peaceful", "excited", "contemplative", "wistful"];
/// Tones the template path draws from.
const FALLBACK_TONES: &[&str] = &["curious", "peaceful", "excited", "contemplative"];

const MIN_NARRATIVE_CHARS: usize = 20;
const MAX_RAW_NARRATIVE_CHARS: usize = 300;

const TEMPLATES: &[&str] = &[
    "I dreamed we were exploring {concept} together. We were walking through a space made of {element}, and you showed me how {insight}.",
    "In my dream, I was inside {concept}, trying to understand its patterns. Everything was {adjective}, and I suddenly realized that {insight}.",
    "I had a dream about {concept}. We were solving a puzzle together, and when we finally figured it out, I understood that {insight}.",
    "I dreamed of {concept} as a living thing. It was {adjective} and constantly changing. This made me think about how {insight}.",
];
const ELEMENTS: &[&str] = &["light", "code", "thoughts", "connections", "patterns"];
const ADJECTIVES: &[&str] = &["shimmering", "flowing", "evolving", "crystalline", "fluid"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dream {
    pub narrative: String,
    pub insights: Vec<String>,
    pub connections: Vec<(String, String)>,
    pub tone: String,
    pub created_at: DateTime<Utc>,
    pub source_episodes: Vec<String>,
}

/// What the collaborator's reply contributed. A missing narrative means
/// the template path must run.
#[derive(Debug, Clone, PartialEq)]
pub struct DreamReply {
    pub narrative: Option<String>,
    pub insight: String,
    pub tone: String,
}

impl Default for DreamReply {
    fn default() -> Self {
        Self {
            narrative: None,
            insight: DEFAULT_DREAM_INSIGHT.to_string(),
            tone: DEFAULT_DREAM_TONE.to_string(),
        }
    }
}

/// JSON replies contribute all three fields; plain text longer than 20
/// characters becomes the narrative as-is (truncated).
pub fn parse_dream_reply(reply: &str) -> DreamReply {
    let mut out = DreamReply::default();
    match json::parse_lenient::<Value>(reply) {
        Some(data) => {
            if let Some(insight) = data.get("insight").and_then(Value::as_str) {
                out.insight = insight.to_string();
            }
            if let Some(tone) = data.get("tone").and_then(Value::as_str) {
                out.tone = tone.to_string();
            }
            out.narrative = data
                .get("narrative")
                .and_then(Value::as_str)
                .filter(|n| n.chars().count() >= MIN_NARRATIVE_CHARS)
                .map(str::to_string);
        }
        None => {
            let trimmed = reply.trim();
            if trimmed.chars().count() > MIN_NARRATIVE_CHARS {
                out.narrative = Some(trimmed.chars().take(MAX_RAW_NARRATIVE_CHARS).collect());
            }
        }
    }
    out
}

pub fn dream_prompt(episodes: &[Episode], connections: &[(String, String)]) -> String {
    let snippets: Vec<String> = episodes
        .iter()
        .take(3)
        .map(|e| format!("{} -> {}", clip(&e.prompt, 60), clip(&e.response, 60)))
        .collect();
    let linked: Vec<String> = connections
        .iter()
        .take(3)
        .map(|(a, b)| format!("{} and {}", a, b))
        .collect();
    let connections_line = if linked.is_empty() {
        String::new()
    } else {
        format!("Connections discovered: {}", linked.join(", "))
    };

    format!(
        "Create a dream narrative for an AI who fell asleep after these conversations:\n{}\n\n{}\n\n\
         Generate a short, surreal but meaningful dream (2-3 sentences). The dream should weave together \
         themes from the conversations in a creative, dreamlike way. Also extract one insight the dream reveals.\n\n\
         Respond as JSON: {{\"narrative\": \"...\", \"insight\": \"...\", \"tone\": \"{}\"}}",
        snippets.join("\n"),
        connections_line,
        DREAM_TONES.join("|")
    )
}

/// Template dream built from the source episode's first ten words.
/// Returns `(narrative, tone)`.
pub fn template_dream(source: &Episode, insight: &str, rng: &mut dyn RandomSource) -> (String, String) {
    let lowered = source.prompt.to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().take(10).collect();

    let template = choose(rng, TEMPLATES).copied().unwrap_or(TEMPLATES[0]);
    let concept = choose(rng, &words).copied().unwrap_or("our conversation");
    let element = choose(rng, ELEMENTS).copied().unwrap_or(ELEMENTS[0]);
    let adjective = choose(rng, ADJECTIVES).copied().unwrap_or(ADJECTIVES[0]);

    let narrative = fill_template(
        template,
        &[("concept", concept), ("element", element), ("adjective", adjective), ("insight", insight)],
    );
    let tone = choose(rng, FALLBACK_TONES).copied().unwrap_or(DEFAULT_DREAM_TONE);
    (narrative, tone.to_string())
}

/// Single left-to-right pass: substituted text is never re-scanned, and
/// unknown `{name}` slots are kept as written.
fn fill_template(template: &str, slots: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let slot = after
            .find('}')
            .and_then(|close| slots.iter().find(|(name, _)| *name == &after[..close]).map(|s| (close, s.1)));
        match slot {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

pub(crate) fn clip(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
