//! Snapshot Types
//!
//! Serialization structs for what the presentation layer reads: per-entity
//! position samples and periodic party snapshots.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{ConversationView, EntityId, PairKey};

/// Latest bridged position of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PositionSample {
    pub position: Vec2,
    pub pinned: bool,
    /// Physics tick that produced this sample
    pub tick: u64,
}

impl PositionSample {
    pub fn new(position: Vec2, pinned: bool, tick: u64) -> Self {
        Self {
            position,
            pinned,
            tick,
        }
    }

    pub fn distance(&self, other: &PositionSample) -> f32 {
        self.position.distance(other.position)
    }
}

/// Derived per-entity label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStatus {
    #[default]
    Idle,
    Chatting,
}

impl DisplayStatus {
    /// Badge shown on an avatar.
    pub fn emoji(self) -> &'static str {
        match self {
            DisplayStatus::Idle => "😊",
            DisplayStatus::Chatting => "💬",
        }
    }
}

/// Entity as seen by presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    pub id: EntityId,
    pub short_name: String,
    pub x: f32,
    pub y: f32,
    pub pinned: bool,
    pub status: DisplayStatus,
}

/// Full presentation state at one poll.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartySnapshot {
    pub tick: u64,
    pub elapsed_ms: u64,
    pub entities: Vec<EntityView>,
    pub conversations: Vec<ConversationView>,
}

impl PartySnapshot {
    /// Number of conversations with at least one turn.
    pub fn active_count(&self) -> usize {
        self.conversations
            .iter()
            .filter(|c| c.state == crate::ConversationState::Active)
            .count()
    }

    pub fn entity(&self, id: &EntityId) -> Option<&EntityView> {
        self.entities.iter().find(|e| &e.id == id)
    }

    pub fn conversation(&self, key: &PairKey) -> Option<&ConversationView> {
        self.conversations.iter().find(|c| &c.key == key)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
