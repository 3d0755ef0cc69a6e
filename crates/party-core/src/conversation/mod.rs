//! Proximity and conversation handling.

pub mod content;
pub mod engine;
pub mod status;

pub use content::compose_turn;
pub use engine::{Completion, ConversationEngine, ConversationPair, EngineStats};
pub use status::display_status;
