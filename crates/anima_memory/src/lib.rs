pub mod codec;
pub mod consolidation;
pub mod coordinator;
pub mod dream;
pub mod error;
pub mod sqlite;

pub use consolidation::{CycleReport, Insight, SleepConsolidator, SleepDepth, SleepSummary};
pub use coordinator::{spawn_maintenance, AffectCoordinator, LifecycleState};
pub use dream::Dream;
pub use error::{PersistenceError, SleepError};
pub use sqlite::{Baselines, EmotionStore, TimelineEntry};
