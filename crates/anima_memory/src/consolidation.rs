//! Sleep Consolidation - offline processing of recent conversation
//!
//! `enter_sleep` captures a batch of episodes; each `process_sleep` call runs
//! a depth-gated pipeline over it:
//!
//! 1. consolidate (always): importance-score the first batch of episodes
//! 2. connections (deep, full): pair concepts across episodes
//! 3. patterns (deep, full): recurring themes
//! 4. insights (full): synthesis over connections and patterns
//! 5. dream (full, Bernoulli-gated): one narrative per cycle at most
//!
//! Every stage asks the collaborator first and falls back to a deterministic
//! heuristic driven by the injected random source.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use anima_core::config::SleepConfig;
use anima_core::random::{choose, RandomSource};
use anima_core::{Episode, GenerationRequest};
use anima_reasoning::{json, CollaboratorHandle};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dream::{self, clip, Dream, DreamReply};
use crate::error::SleepError;

const MAX_CONNECTIONS: usize = 50;
const MAX_PATTERNS: usize = 30;
const MAX_INSIGHTS: usize = 100;
const MAX_DREAMS: usize = 50;

const EMOTION_WORDS: &[&str] = &["frustrated", "excited", "confused", "happy", "sad", "angry"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SleepDepth {
    Light,
    Deep,
    Full,
}

impl SleepDepth {
    fn explores(self) -> bool {
        matches!(self, SleepDepth::Deep | SleepDepth::Full)
    }
}

impl fmt::Display for SleepDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SleepDepth::Light => "light",
            SleepDepth::Deep => "deep",
            SleepDepth::Full => "full",
        })
    }
}

impl FromStr for SleepDepth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(SleepDepth::Light),
            "deep" => Ok(SleepDepth::Deep),
            "full" => Ok(SleepDepth::Full),
            other => Err(format!("unknown sleep depth '{}'", other)),
        }
    }
}

/// An "aha" discovered during sleep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub content: String,
    /// 1-10
    pub confidence: u8,
    pub source: String,
    pub actionable: bool,
    pub timestamp: DateTime<Utc>,
}

/// Per-cycle counts returned by `process_sleep`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub consolidated_memories: usize,
    pub connections_found: usize,
    pub patterns_discovered: usize,
    pub insights_generated: usize,
    pub dreams_created: usize,
}

/// Counts-only summary returned on wake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SleepSummary {
    pub duration: Duration,
    pub cycles_completed: u32,
    pub dreams: usize,
    pub insights: usize,
    pub new_connections: usize,
    pub patterns: usize,
}

/// The sleep consolidation system
pub struct SleepConsolidator {
    config: SleepConfig,
    sleeping: bool,
    started_at: Option<DateTime<Utc>>,
    last_duration: Duration,
    cycles_completed: u32,

    episodes: Vec<Episode>,
    connections: VecDeque<(String, String)>,
    patterns: VecDeque<String>,
    insights: VecDeque<Insight>,
    dreams: VecDeque<Dream>,

    collaborator: CollaboratorHandle,
    rng: Box<dyn RandomSource>,
}

impl fmt::Debug for SleepConsolidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SleepConsolidator")
            .field("sleeping", &self.sleeping)
            .field("cycles_completed", &self.cycles_completed)
            .field("episodes", &self.episodes.len())
            .field("connections", &self.connections.len())
            .field("patterns", &self.patterns.len())
            .field("insights", &self.insights.len())
            .field("dreams", &self.dreams.len())
            .finish()
    }
}

impl SleepConsolidator {
    pub fn new(config: SleepConfig, collaborator: CollaboratorHandle, rng: Box<dyn RandomSource>) -> Self {
        Self {
            config,
            sleeping: false,
            started_at: None,
            last_duration: Duration::zero(),
            cycles_completed: 0,
            episodes: Vec::new(),
            connections: VecDeque::new(),
            patterns: VecDeque::new(),
            insights: VecDeque::new(),
            dreams: VecDeque::new(),
            collaborator,
            rng,
        }
    }

    pub fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    pub fn cycles_completed(&self) -> u32 {
        self.cycles_completed
    }

    pub fn last_duration(&self) -> Duration {
        self.last_duration
    }

    pub fn episodes(&self) -> &[Episode] {
        &self.episodes
    }

    pub fn connections(&self) -> impl Iterator<Item = &(String, String)> {
        self.connections.iter()
    }

    pub fn patterns(&self) -> impl Iterator<Item = &String> {
        self.patterns.iter()
    }

    pub fn insights(&self) -> impl Iterator<Item = &Insight> {
        self.insights.iter()
    }

    pub fn dreams(&self) -> impl Iterator<Item = &Dream> {
        self.dreams.iter()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Start sleeping over `episodes`. An empty batch keeps whatever batch
    /// was captured before.
    pub fn enter_sleep(&mut self, episodes: Vec<Episode>, now: DateTime<Utc>) {
        self.sleeping = true;
        self.started_at = Some(now);
        if !episodes.is_empty() {
            self.episodes = episodes;
        }
        tracing::info!("Entering sleep with {} episodes", self.episodes.len());
    }

    pub fn exit_sleep(&mut self, now: DateTime<Utc>) -> Result<SleepSummary, SleepError> {
        if !self.sleeping {
            return Err(SleepError::NotSleeping);
        }
        self.sleeping = false;
        if let Some(start) = self.started_at {
            self.last_duration = (now - start).max(Duration::zero());
        }

        let summary = SleepSummary {
            duration: self.last_duration,
            cycles_completed: self.cycles_completed,
            dreams: self.dreams.len(),
            insights: self.insights.len(),
            new_connections: self.connections.len(),
            patterns: self.patterns.len(),
        };
        tracing::info!(
            "Woke up after {}s: {} dreams, {} insights",
            summary.duration.num_seconds(),
            summary.dreams,
            summary.insights
        );
        Ok(summary)
    }

    /// Run one depth-gated cycle over the captured episodes.
    pub async fn process_sleep(
        &mut self,
        depth: SleepDepth,
        now: DateTime<Utc>,
    ) -> Result<CycleReport, SleepError> {
        if !self.sleeping {
            return Err(SleepError::NotSleeping);
        }

        let mut report = CycleReport::default();
        if !self.episodes.is_empty() {
            report.consolidated_memories = self.consolidate().await;
        }
        if depth.explores() {
            report.connections_found = self.find_connections().await;
            report.patterns_discovered = self.discover_patterns().await;
        }
        if depth == SleepDepth::Full {
            report.insights_generated = self
                .generate_insights(report.connections_found, report.patterns_discovered, now)
                .await;
            if self.rng.chance(self.config.dream_probability) {
                report.dreams_created = self.create_dream(now).await;
            }
        }

        self.cycles_completed += 1;
        tracing::debug!("Sleep cycle ({}) complete: {:?}", depth, report);
        Ok(report)
    }

    // ========================================================================
    // 1. Consolidation
    // ========================================================================

    async fn consolidate(&mut self) -> usize {
        let batch = &self.episodes[..self.episodes.len().min(self.config.scoring_batch)];
        let threshold = self.config.importance_threshold as i64;

        match self.score_with_collaborator(batch).await {
            Some(scores) => scores.iter().take(batch.len()).filter(|s| **s >= threshold).count(),
            None => batch
                .iter()
                .filter(|e| heuristic_importance(e) >= threshold)
                .count(),
        }
    }

    async fn score_with_collaborator(&self, batch: &[Episode]) -> Option<Vec<i64>> {
        if !self.collaborator.is_available() {
            return None;
        }
        let listing: Vec<String> = batch
            .iter()
            .enumerate()
            .map(|(i, e)| {
                format!("{}. User: \"{}\" -> Agent: \"{}\"", i + 1, clip(&e.prompt, 80), clip(&e.response, 80))
            })
            .collect();
        let prompt = format!(
            "During sleep, I'm consolidating memories. Rate each conversation's importance (1-10) for long-term retention.\n\
             Consider: emotional significance, learning value, relationship depth, uniqueness.\n\n{}\n\n\
             Respond as JSON: {{\"scores\": [7, 3, 9, ...]}}",
            listing.join("\n")
        );
        let request = GenerationRequest::new(
            prompt,
            "You are the memory consolidation system during sleep. Score memories honestly - not everything is important.",
        )
        .temperature(0.3)
        .max_tokens(80);

        let data: Value = match self.collaborator.ask_json(&request).await {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!("Importance scoring falling back to heuristic: {}", e);
                return None;
            }
        };
        let scores = data.get("scores")?.as_array()?;
        Some(scores.iter().map(|s| score_value(s).unwrap_or(0)).collect())
    }

    // ========================================================================
    // 2. Connections
    // ========================================================================

    async fn find_connections(&mut self) -> usize {
        if self.episodes.len() < 2 {
            return 0;
        }
        let concepts: Vec<String> = self
            .episodes
            .iter()
            .flat_map(|e| concept_words(&e.prompt).into_iter().take(3))
            .collect();
        if concepts.len() < 2 {
            return 0;
        }

        let mut found = self.connections_from_collaborator(&concepts).await;

        if found.is_empty() && self.rng.chance(self.config.connection_probability) {
            if let Some(a) = choose(self.rng.as_mut(), &concepts).cloned() {
                let remaining: Vec<&String> = concepts.iter().filter(|c| **c != a).collect();
                if let Some(b) = choose(self.rng.as_mut(), &remaining) {
                    found.push((a, (*b).clone()));
                }
            }
        }

        let n = found.len();
        for pair in found {
            push_capped(&mut self.connections, pair, MAX_CONNECTIONS);
        }
        n
    }

    async fn connections_from_collaborator(&self, concepts: &[String]) -> Vec<(String, String)> {
        if !self.collaborator.is_available() {
            return Vec::new();
        }
        let mut unique: Vec<&str> = Vec::new();
        for c in concepts.iter().take(10) {
            if !unique.contains(&c.as_str()) {
                unique.push(c.as_str());
            }
        }
        let snippets: Vec<String> = self
            .episodes
            .iter()
            .take(4)
            .map(|e| format!("- {}", clip(&e.prompt, 60)))
            .collect();
        let prompt = format!(
            "During sleep, I'm finding connections between concepts from recent conversations:\n\
             Concepts: {}\nConversations:\n{}\n\n\
             Find 1-2 non-obvious, creative connections between these concepts. Each connection should link two concepts and explain WHY they connect.\n\n\
             Respond as JSON: {{\"connections\": [[\"concept_a\", \"concept_b\"], ...]}}",
            unique.join(", "),
            snippets.join("\n")
        );
        let request = GenerationRequest::new(
            prompt,
            "You are the creative subconscious. Find surprising but meaningful connections between concepts.",
        )
        .temperature(0.8)
        .max_tokens(120);

        let data: Value = match self.collaborator.ask_json(&request).await {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!("Connection finding falling back: {}", e);
                return Vec::new();
            }
        };
        data.get("connections")
            .and_then(Value::as_array)
            .map(|pairs| {
                pairs
                    .iter()
                    .take(2)
                    .filter_map(|p| {
                        let p = p.as_array()?;
                        Some((value_text(p.first()?)?, value_text(p.get(1)?)?))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    // ========================================================================
    // 3. Patterns
    // ========================================================================

    async fn discover_patterns(&mut self) -> usize {
        if self.episodes.len() < 3 {
            return 0;
        }

        let mut found = self.patterns_from_collaborator().await;
        if found.is_empty() {
            if let Some(word) = most_frequent_concept(&self.episodes) {
                found.push(format!("User frequently discusses {}", word));
            }
        }

        let n = found.len();
        for p in found {
            push_capped(&mut self.patterns, p, MAX_PATTERNS);
        }
        n
    }

    async fn patterns_from_collaborator(&self) -> Vec<String> {
        if !self.collaborator.is_available() {
            return Vec::new();
        }
        let listing: Vec<String> = self
            .episodes
            .iter()
            .take(8)
            .map(|e| format!("- User: \"{}\" -> Agent: \"{}\"", clip(&e.prompt, 80), clip(&e.response, 60)))
            .collect();
        let prompt = format!(
            "Analyze these recent conversations for patterns:\n{}\n\n\
             Find recurring themes, communication styles, user interests, or behavioral patterns.\n\
             Respond as JSON: {{\"patterns\": [\"pattern 1\", \"pattern 2\"]}}\n\
             Only include genuine, specific patterns - not generic observations.",
            listing.join("\n")
        );
        let request = GenerationRequest::new(
            prompt,
            "You are pattern recognition during sleep. Find genuine recurring themes and behavioral patterns.",
        )
        .temperature(0.5)
        .max_tokens(60);

        let data: Value = match self.collaborator.ask_json(&request).await {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!("Pattern discovery falling back to word frequency: {}", e);
                return Vec::new();
            }
        };
        data.get("patterns")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .take(3)
                    .filter_map(value_text)
                    .filter(|p| p.chars().count() > 10)
                    .collect()
            })
            .unwrap_or_default()
    }

    // ========================================================================
    // 4. Insights
    // ========================================================================

    /// The fallback only covers the `new_connections` / `new_patterns` most
    /// recently added, so repeated cycles do not restate older findings.
    async fn generate_insights(
        &mut self,
        new_connections: usize,
        new_patterns: usize,
        now: DateTime<Utc>,
    ) -> usize {
        let mut new_insights = self.insights_from_collaborator(now).await;

        if new_insights.is_empty() {
            let skip_connections = self.connections.len().saturating_sub(new_connections);
            let skip_patterns = self.patterns.len().saturating_sub(new_patterns);
            for (a, b) in self.connections.iter().skip(skip_connections) {
                new_insights.push(Insight {
                    content: format!("There might be a connection between {} and {}", a, b),
                    confidence: self.rng.int_in(4, 7) as u8,
                    source: "sleep processing: connected concepts".to_string(),
                    actionable: true,
                    timestamp: now,
                });
            }
            for p in self.patterns.iter().skip(skip_patterns) {
                new_insights.push(Insight {
                    content: format!("I noticed a pattern: {}", p),
                    confidence: self.rng.int_in(6, 9) as u8,
                    source: "sleep processing: pattern recognition".to_string(),
                    actionable: true,
                    timestamp: now,
                });
            }
        }

        let n = new_insights.len();
        for i in new_insights {
            push_capped(&mut self.insights, i, MAX_INSIGHTS);
        }
        n
    }

    async fn insights_from_collaborator(&self, now: DateTime<Utc>) -> Vec<Insight> {
        if !self.collaborator.is_available() || self.episodes.is_empty() {
            return Vec::new();
        }
        let summary: Vec<String> = self
            .episodes
            .iter()
            .take(5)
            .map(|e| format!("User: {} | Agent: {}", clip(&e.prompt, 80), clip(&e.response, 80)))
            .collect();
        let connections = if self.connections.is_empty() {
            "none yet".to_string()
        } else {
            self.connections
                .iter()
                .map(|(a, b)| format!("{} <-> {}", a, b))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let patterns = if self.patterns.is_empty() {
            "none yet".to_string()
        } else {
            self.patterns.iter().cloned().collect::<Vec<_>>().join("; ")
        };
        let prompt = format!(
            "During sleep processing, I'm reviewing these recent conversations:\n{}\n\n\
             Connections found: {}\nPatterns: {}\n\n\
             Generate 1-2 genuine insights I could discover from this material. These should be non-obvious \
             realizations about the user, topics discussed, or my own behavior.\n\n\
             Respond as JSON: {{\"insights\": [\"insight 1\", \"insight 2\"]}}",
            summary.join("\n"),
            connections,
            patterns
        );
        let request = GenerationRequest::new(
            prompt,
            "You are the subconscious, processing memories during sleep. Generate genuine, specific insights - not generic platitudes.",
        )
        .temperature(0.7)
        .max_tokens(100);

        let reply = match self.collaborator.ask(&request).await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("Insight synthesis falling back: {}", e);
                return Vec::new();
            }
        };
        parse_insight_reply(&reply, now)
    }

    // ========================================================================
    // 5. Dreams
    // ========================================================================

    async fn create_dream(&mut self, now: DateTime<Utc>) -> usize {
        let Some(source) = choose(self.rng.as_mut(), &self.episodes).cloned() else {
            return 0;
        };

        let connections: Vec<(String, String)> = self.connections.iter().cloned().collect();
        let reply = self.dream_from_collaborator(&connections).await;

        let (narrative, insight, tone) = match reply.narrative {
            Some(n) => (n, reply.insight, reply.tone),
            None => {
                let insight = if self.insights.is_empty() {
                    reply.insight
                } else {
                    let all: Vec<&Insight> = self.insights.iter().collect();
                    choose(self.rng.as_mut(), &all)
                        .map(|i| i.content.clone())
                        .unwrap_or(reply.insight)
                };
                let (narrative, tone) = dream::template_dream(&source, &insight, self.rng.as_mut());
                (narrative, insight, tone)
            }
        };

        let dream = Dream {
            narrative,
            insights: vec![insight],
            connections,
            tone,
            created_at: now,
            source_episodes: vec![clip(&source.prompt, 100)],
        };
        tracing::debug!("Dreamt ({}): {}", dream.tone, dream.narrative);
        push_capped(&mut self.dreams, dream, MAX_DREAMS);
        1
    }

    async fn dream_from_collaborator(&self, connections: &[(String, String)]) -> DreamReply {
        if !self.collaborator.is_available() {
            return DreamReply::default();
        }
        let request = GenerationRequest::new(
            dream::dream_prompt(&self.episodes, connections),
            "You are the dreaming mind. Create vivid, meaningful dream narratives that process and synthesize memories creatively.",
        )
        .temperature(0.9)
        .max_tokens(200);

        match self.collaborator.ask(&request).await {
            Ok(reply) => dream::parse_dream_reply(&reply),
            Err(e) => {
                tracing::debug!("Dream narrative falling back to templates: {}", e);
                DreamReply::default()
            }
        }
    }

    // ========================================================================
    // Sharing
    // ========================================================================

    /// Highest-confidence insight, most recent on ties.
    pub fn best_insight(&self) -> Option<&Insight> {
        self.ranked_insights().into_iter().next()
    }

    fn ranked_insights(&self) -> Vec<&Insight> {
        let mut ranked: Vec<&Insight> = self.insights.iter().collect();
        ranked.sort_by(|a, b| (b.confidence, b.timestamp).cmp(&(a.confidence, a.timestamp)));
        ranked
    }

    /// Something to say on waking: the latest dream, else the top insights.
    pub fn morning_share(&self) -> Option<String> {
        if let Some(dream) = self.dreams.back() {
            return Some(format!("I had an interesting dream while sleeping. {}", dream.narrative));
        }
        let ranked = self.ranked_insights();
        match ranked.as_slice() {
            [] => None,
            [only] => Some(format!("While sleeping, I realized something: {}", only.content)),
            [first, second, ..] => Some(format!(
                "While sleeping, I had some insights: {} Also, {}",
                first.content, second.content
            )),
        }
    }

    pub fn sleep_summary_text(&self) -> String {
        if self.dreams.is_empty() && self.insights.is_empty() {
            return "I rested peacefully.".to_string();
        }
        let mut parts = Vec::new();
        if !self.dreams.is_empty() {
            parts.push(format!("I had {} dream(s).", self.dreams.len()));
        }
        if !self.insights.is_empty() {
            parts.push(format!("I discovered {} insight(s).", self.insights.len()));
        }
        if !self.connections.is_empty() {
            parts.push(format!("I found {} new connection(s).", self.connections.len()));
        }
        parts.join(" ")
    }

    /// Drop the processed batch along with connections and patterns.
    /// Insights and dreams are kept.
    pub fn clear(&mut self) {
        self.episodes.clear();
        self.connections.clear();
        self.patterns.clear();
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Base 5; +2 for an emotion word, +1 for a question, +1 for a long prompt.
pub fn heuristic_importance(episode: &Episode) -> i64 {
    let lower = episode.prompt.to_lowercase();
    let mut score = 5;
    if EMOTION_WORDS.iter().any(|w| lower.contains(w)) {
        score += 2;
    }
    if episode.prompt.contains('?') {
        score += 1;
    }
    if episode.prompt.chars().count() > 100 {
        score += 1;
    }
    score
}

/// Lower-cased purely alphabetic words longer than five characters.
pub fn concept_words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .filter(|w| w.chars().count() > 5 && w.chars().all(char::is_alphabetic))
        .map(str::to_string)
        .collect()
}

/// The concept occurring most often (at least twice) across all prompts.
/// Ties go to the word seen first.
fn most_frequent_concept(episodes: &[Episode]) -> Option<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for e in episodes {
        for w in concept_words(&e.prompt) {
            match counts.iter_mut().find(|(word, _)| *word == w) {
                Some((_, n)) => *n += 1,
                None => counts.push((w, 1)),
            }
        }
    }
    let mut best: Option<(String, usize)> = None;
    for (w, n) in counts {
        if n >= 2 && best.as_ref().map_or(true, |(_, b)| n > *b) {
            best = Some((w, n));
        }
    }
    best.map(|(w, _)| w)
}

/// JSON `{"insights": [...]}` yields up to two insights (confidence 7);
/// non-JSON text longer than 10 characters becomes one (confidence 6).
pub fn parse_insight_reply(reply: &str, now: DateTime<Utc>) -> Vec<Insight> {
    let insight = |content: String, confidence: u8| Insight {
        content,
        confidence,
        source: "sleep processing: collaborator synthesis".to_string(),
        actionable: true,
        timestamp: now,
    };

    match json::parse_lenient::<Value>(reply) {
        Some(data) => data
            .get("insights")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .take(2)
                    .filter_map(value_text)
                    .filter(|t| t.chars().count() > 10)
                    .map(|t| insight(t, 7))
                    .collect()
            })
            .unwrap_or_default(),
        None => {
            let trimmed = reply.trim();
            if trimmed.chars().count() > 10 {
                vec![insight(clip(trimmed, 200), 6)]
            } else {
                Vec::new()
            }
        }
    }
}

fn score_value(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f as i64),
        _ => None,
    }
}

fn value_text(v: &Value) -> Option<String> {
    let text = match v {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn push_capped<T>(list: &mut VecDeque<T>, item: T, cap: usize) {
    list.push_back(item);
    while list.len() > cap {
        list.pop_front();
    }
}
