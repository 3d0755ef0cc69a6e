//! Body Components
//!
//! Per-entity physical state and the catalog attributes the forcing layer
//! needs to decide affinity.

use bevy_ecs::prelude::*;
use glam::Vec2;
use party_events::{Entity as CatalogEntity, EntityId};

/// Physical state of one party guest
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Body {
    pub position: Vec2,
    /// Units per second
    pub velocity: Vec2,
    pub radius: f32,
    pub mass: f32,
    /// Pinned bodies are static: no forces, no integration, infinite mass
    pub pinned: bool,
}

impl Body {
    pub fn new(position: Vec2, velocity: Vec2, radius: f32, mass: f32) -> Self {
        Self {
            position,
            velocity,
            radius,
            mass,
            pinned: false,
        }
    }

    /// Inverse mass for contact resolution; zero when pinned.
    pub fn inv_mass(&self) -> f32 {
        if self.pinned || self.mass <= 0.0 {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    /// Adds `impulse / mass` to the velocity. Pinned bodies ignore impulses.
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        if self.pinned {
            return;
        }
        self.velocity += impulse * self.inv_mass();
    }

    pub fn set_pinned(&mut self, pinned: bool) {
        self.pinned = pinned;
        if pinned {
            self.velocity = Vec2::ZERO;
        }
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    pub fn contains(&self, point: Vec2) -> bool {
        self.position.distance_squared(point) <= self.radius * self.radius
    }
}

/// Catalog attributes copied onto the body at spawn
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    pub id: EntityId,
    pub rank: u32,
    pub country: String,
}

impl Persona {
    pub fn from_entity(entity: &CatalogEntity) -> Self {
        Self {
            id: entity.id.clone(),
            rank: entity.rank,
            country: entity.location.country.clone(),
        }
    }

    /// Same country, or rank strictly within `rank_delta`.
    pub fn is_similar(&self, other: &Persona, rank_delta: u32) -> bool {
        self.country == other.country || self.rank.abs_diff(other.rank) < rank_delta
    }
}
