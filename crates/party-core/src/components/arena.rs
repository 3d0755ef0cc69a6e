//! Arena Resources
//!
//! World-wide resources: arena bounds, the seeded RNG, the tick counter and
//! the optional pointer drag constraint.

use bevy_ecs::prelude::*;
use glam::Vec2;
use rand::rngs::SmallRng;

/// Walled rectangle from (0, 0) to (width, height)
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Arena {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Projects a body center back inside the walls.
    pub fn clamp_center(&self, position: Vec2, radius: f32) -> Vec2 {
        let max_x = (self.width - radius).max(radius);
        let max_y = (self.height - radius).max(radius);
        Vec2::new(position.x.clamp(radius, max_x), position.y.clamp(radius, max_y))
    }

    pub fn contains(&self, position: Vec2, radius: f32) -> bool {
        position.x >= -radius
            && position.y >= -radius
            && position.x <= self.width + radius
            && position.y <= self.height + radius
    }
}

/// Seeded random number generator resource
#[derive(Resource)]
pub struct SimRng(pub SmallRng);

/// Fixed-step bookkeeping
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct StepClock {
    pub tick: u64,
    /// Seconds per step
    pub dt: f32,
}

impl StepClock {
    pub fn new(dt: f32) -> Self {
        Self { tick: 0, dt }
    }
}

/// Pointer spring attached to one body while dragging
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct DragConstraint {
    pub body: Entity,
    pub target: Vec2,
}
