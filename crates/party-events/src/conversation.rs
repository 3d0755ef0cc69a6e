//! Conversation Types
//!
//! Data structures describing pairwise conversations. These carry no timing or
//! generation logic; the engine in `party-core` owns that.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::EntityId;

/// Unordered pair of entity ids in canonical (sorted) order.
///
/// `PairKey::new(a, b)` and `PairKey::new(b, a)` are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairKey {
    first: EntityId,
    second: EntityId,
}

impl PairKey {
    pub fn new(a: EntityId, b: EntityId) -> Self {
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    pub fn first(&self) -> &EntityId {
        &self.first
    }

    pub fn second(&self) -> &EntityId {
        &self.second
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        &self.first == id || &self.second == id
    }

    /// Returns the participant that is not `id`, if `id` is part of the pair.
    pub fn other(&self, id: &EntityId) -> Option<&EntityId> {
        if &self.first == id {
            Some(&self.second)
        } else if &self.second == id {
            Some(&self.first)
        } else {
            None
        }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.second)
    }
}

/// Lifecycle of a live pair. Absence from the registry is the `none` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    /// Opening turn is being generated
    Pending,
    /// At least one turn has been produced
    Active,
}

/// One produced utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub text: String,
    pub speaker_id: EntityId,
    /// Milliseconds since the engine started
    pub produced_at_ms: u64,
}

/// Presentation view of one live conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationView {
    pub id: Uuid,
    pub key: PairKey,
    pub state: ConversationState,
    pub turn_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_turn: Option<Turn>,
}

impl ConversationView {
    pub fn participants(&self) -> (&EntityId, &EntityId) {
        (self.key.first(), self.key.second())
    }

    pub fn last_text(&self) -> Option<&str> {
        self.last_turn.as_ref().map(|t| t.text.as_str())
    }
}
