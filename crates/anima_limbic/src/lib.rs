//! # Anima Limbic
//!
//! The fast, in-memory half of the affective state engine:
//!
//! - **classifier**: event text → emotion + intensity (collaborator, keywords, default)
//! - **active**: the bounded set of concurrently felt emotions and how they blend
//! - **decay**: linear fading of active emotions over wall-clock minutes
//! - **mood**: the slower background state derived from recent history
//! - **complexity**: conflicts, suppression and leaks, regulation, vulnerability
//!
//! [`AffectiveEngine`] ties these together and is the only writer of the state.
//! Persistence and sleep live in `anima_memory`.

pub mod active;
pub mod classifier;
pub mod complexity;
pub mod decay;
pub mod expression;
pub mod mood;
mod system;

pub use active::ActiveEmotionSet;
pub use classifier::{emotion_for_event, Classification, ClassificationSource};
pub use complexity::{
    Bittersweet, ComplexityLayer, ConflictType, EmotionalConflict, Leak, RegulationOutcome,
    RegulationStrategy, SuppressedEmotion,
};
pub use decay::DecayScheduler;
pub use mood::{MoodTracker, MoodUpdate};
pub use system::{AffectiveEngine, RestoredState};
