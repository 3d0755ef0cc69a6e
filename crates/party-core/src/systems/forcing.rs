//! Behavior Forcing Systems
//!
//! Stochastic ambience applied before integration each tick: random wander
//! kicks, and weak pulls between similar guests. Neither is goal-directed.

use bevy_ecs::prelude::*;
use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

use crate::components::{Body, Persona, SimRng};
use crate::config::BehaviorTuning;

/// Unit vector in a uniformly random direction.
pub fn random_direction<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    Vec2::from_angle(rng.gen_range(0.0..TAU))
}

/// Probability usable by `gen_bool`: NaN counts as never, the rest is clamped
/// to [0, 1].
pub fn chance(probability: f64) -> f64 {
    if probability.is_nan() {
        0.0
    } else {
        probability.clamp(0.0, 1.0)
    }
}

/// System: occasionally kick each free body in a random direction
pub fn apply_wander(
    tuning: Res<BehaviorTuning>,
    mut rng: ResMut<SimRng>,
    mut bodies: Query<&mut Body>,
) {
    let probability = chance(tuning.wander_probability);
    for mut body in bodies.iter_mut() {
        if body.pinned {
            continue;
        }
        if rng.0.gen_bool(probability) {
            let impulse = random_direction(&mut rng.0) * tuning.wander_impulse;
            body.apply_impulse(impulse);
        }
    }
}

/// Pull strength for a similar pair at `distance`, or `None` outside the band.
pub fn affinity_pull(tuning: &BehaviorTuning, distance: f32) -> Option<f32> {
    if distance > tuning.affinity_min_distance && distance < tuning.affinity_max_distance {
        Some(tuning.affinity_impulse)
    } else {
        None
    }
}

/// System: nudge similar free pairs in the mid-distance band toward each other
pub fn apply_affinity(
    tuning: Res<BehaviorTuning>,
    mut rng: ResMut<SimRng>,
    mut bodies: Query<(&Persona, &mut Body)>,
) {
    let probability = chance(tuning.affinity_probability);
    let mut combos = bodies.iter_combinations_mut();
    while let Some([(persona_a, mut body_a), (persona_b, mut body_b)]) = combos.fetch_next() {
        if body_a.pinned || body_b.pinned {
            continue;
        }
        if !persona_a.is_similar(persona_b, tuning.affinity_rank_delta) {
            continue;
        }

        let delta = body_b.position - body_a.position;
        let Some(strength) = affinity_pull(&tuning, delta.length()) else {
            continue;
        };
        if !rng.0.gen_bool(probability) {
            continue;
        }

        let direction = delta.normalize_or_zero();
        body_a.apply_impulse(direction * strength);
        body_b.apply_impulse(-direction * strength);
    }
}
