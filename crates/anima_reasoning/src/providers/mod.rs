pub mod mock;
pub mod ollama;

pub use mock::{ScriptedCollaborator, SilentCollaborator};
pub use ollama::OllamaClient;
