//! # Anima Core
//!
//! Shared vocabulary for the affective engine: the emotion taxonomy, state
//! primitives, persisted snapshot shapes, configuration, the injected random
//! source and the collaborator contract.

pub mod collaborator;
pub mod config;
pub mod emotion;
pub mod random;
pub mod snapshot;
pub mod state;

pub use collaborator::{Collaborator, GenerationRequest};
pub use config::AnimaConfig;
pub use emotion::{EmotionKind, EmotionTag, UnknownEmotion};
pub use random::{RandomSource, SequenceRandom};
pub use snapshot::{ComplexitySummary, PersistedEmotion, PersistedMood, PersistedSnapshot};
pub use state::{Drive, DriveState, EmotionalState, Mood};

use serde::{Deserialize, Serialize};

/// One recorded conversational turn consumed by the sleep pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub prompt: String,
    pub response: String,
}

impl Episode {
    pub fn new(prompt: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response: response.into(),
        }
    }

    /// Prompt and response joined for keyword scans.
    pub fn text(&self) -> String {
        format!("{} {}", self.prompt, self.response)
    }
}
