//! Bridge System
//!
//! Final system of each tick: copies body positions into the position bridge.

use bevy_ecs::prelude::*;
use party_events::PositionSample;

use crate::bridge::PositionBridge;
use crate::components::{Body, Persona, StepClock};

/// System: publish every body's position for this tick
pub fn publish_positions(
    bridge: Res<PositionBridge>,
    clock: Res<StepClock>,
    bodies: Query<(&Persona, &Body)>,
) {
    for (persona, body) in bodies.iter() {
        bridge.publish(
            &persona.id,
            PositionSample::new(body.position, body.pinned, clock.tick),
        );
    }
}
