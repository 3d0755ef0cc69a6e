//! Party simulation core: a rigid-body world of catalog entities, ambient
//! behavior forcing, a position bridge for presentation, and a proximity
//! driven conversation engine, all stepped on one cooperative tokio task.

pub mod bridge;
pub mod components;
pub mod config;
pub mod conversation;
pub mod error;
pub mod interaction;
pub mod runtime;
pub mod systems;
pub mod world;

pub use bridge::{PositionBridge, PositionFeed};
pub use components::{Arena, Body, Persona, SimRng};
pub use config::{ConfigError, PartyConfig};
pub use conversation::{Completion, ConversationEngine, ConversationPair, EngineStats};
pub use error::PartyError;
pub use interaction::PointerOutcome;
pub use runtime::{Command, PartyRuntime, RunSummary, RuntimeHandle};
pub use world::PhysicsWorld;
