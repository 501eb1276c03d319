use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnimaConfig {
    pub llm: LlmConfig,
    pub affect: AffectConfig,
    pub sleep: SleepConfig,
    pub persistence: PersistenceConfig,
    /// Seed for every random source; entropy-seeded when absent.
    pub seed: Option<u64>,
}

impl AnimaConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: AnimaConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if file doesn't exist, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    /// Apply environment variable overrides on top of file-based config.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("LLM_PROVIDER") {
            self.llm.provider = v;
        }
        if let Ok(v) = std::env::var("LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("OLLAMA_BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Ok(v) = std::env::var("LLM_TIMEOUT_MS") {
            if let Ok(n) = v.parse() {
                self.llm.timeout_ms = n;
            }
        }
        if let Ok(v) = std::env::var("ANIMA_DB_PATH") {
            self.persistence.db_path = v;
        }
        if let Ok(v) = std::env::var("ANIMA_SEED") {
            if let Ok(n) = v.parse() {
                self.seed = Some(n);
            }
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// "ollama" or "none"
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    /// Hard bound on every collaborator call.
    pub timeout_ms: u64,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "none".to_string(),
            model: "llama3.2".to_string(),
            base_url: None,
            timeout_ms: 8_000,
            max_tokens: 200,
            temperature: 0.7,
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AffectConfig {
    /// Maximum concurrently active emotions.
    pub capacity: usize,
    /// Linear intensity loss per minute of age.
    pub decay_per_minute: f32,
    /// Emotions below this intensity are evicted on tick.
    pub fade_threshold: f32,
    pub mood_window_secs: u64,
    /// Occurrences a challenger needs in the window before the mood switches.
    pub mood_switch_count: usize,
    pub history_cap: usize,
    pub trigger_cap: usize,
    pub baseline_mood: String,
    pub baseline_intensity: f32,
}

impl Default for AffectConfig {
    fn default() -> Self {
        Self {
            capacity: 3,
            decay_per_minute: 0.1,
            fade_threshold: 0.1,
            mood_window_secs: 3600,
            mood_switch_count: 3,
            history_cap: 100,
            trigger_cap: 50,
            baseline_mood: "contentment".to_string(),
            baseline_intensity: 0.6,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SleepConfig {
    /// Bernoulli gate for dream creation during full-depth sleep.
    pub dream_probability: f64,
    /// Bernoulli gate for the random fallback connection.
    pub connection_probability: f64,
    /// Score at or above which an episode counts as consolidated.
    pub importance_threshold: u8,
    /// Episodes scored per sleep cycle.
    pub scoring_batch: usize,
}

impl Default for SleepConfig {
    fn default() -> Self {
        Self {
            dream_probability: 0.7,
            connection_probability: 0.4,
            importance_threshold: 7,
            scoring_batch: 8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub db_path: String,
    pub timeline_cap: i64,
    pub tick_interval_secs: u64,
    pub snapshot_interval_secs: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            db_path: "anima.db".to_string(),
            timeline_cap: 500,
            tick_interval_secs: 60,
            snapshot_interval_secs: 300,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
