//! ECS Systems
//!
//! Per-tick systems for behavior forcing, physics, and position publishing.

pub mod forcing;
pub mod physics;
pub mod publish;

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;

pub use forcing::{affinity_pull, apply_affinity, apply_wander, chance, random_direction};
pub use physics::{
    advance_clock, apply_drag, clamp_speed, contain_body, integrate, resolve_body_contacts,
    resolve_contact, resolve_walls,
};
pub use publish::publish_positions;

/// Builds the per-tick schedule.
///
/// Forcing runs first, then integration and contact resolution; the speed cap
/// comes after every velocity change and publishing sees the final state.
pub fn build_step_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems(
        (
            apply_wander,
            apply_affinity,
            apply_drag,
            integrate,
            resolve_body_contacts,
            resolve_walls,
            clamp_speed,
            advance_clock,
            publish_positions,
        )
            .chain(),
    );
    schedule
}
