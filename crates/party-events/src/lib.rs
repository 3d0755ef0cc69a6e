//! Shared data types for the party simulation.
//!
//! This crate contains pure data structures with no simulation logic.
//! It is a dependency for the simulation core and any presentation layer.

pub mod conversation;
pub mod entity;
pub mod snapshot;

#[cfg(feature = "test-fixtures")]
pub mod fixtures;

// Re-export catalog types
pub use entity::{Catalog, CatalogError, Entity, EntityId, Location};

// Re-export conversation types
pub use conversation::{ConversationState, ConversationView, PairKey, Turn};

// Re-export snapshot types
pub use snapshot::{DisplayStatus, EntityView, PartySnapshot, PositionSample};

pub use glam::Vec2;
