//! Physics Systems
//!
//! Fixed-step integration and contact resolution for circular bodies in a
//! walled arena. Runs after the forcing systems each tick:
//! drag, integrate, body contacts, walls, speed cap.

use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::components::{Arena, Body, DragConstraint, StepClock};
use crate::config::{InteractionTuning, WorldTuning};

/// Centers closer than this are treated as coincident
const COINCIDENT_EPSILON: f32 = 1e-4;

/// System: move a dragged body part of the way toward the pointer
pub fn apply_drag(
    drag: Option<Res<DragConstraint>>,
    tuning: Res<InteractionTuning>,
    mut bodies: Query<&mut Body>,
) {
    let Some(drag) = drag else {
        return;
    };
    let Ok(mut body) = bodies.get_mut(drag.body) else {
        return;
    };
    if body.pinned {
        return;
    }
    let step = (drag.target - body.position) * tuning.drag_stiffness;
    body.position += step;
}

/// System: advance positions by one step and apply air friction
pub fn integrate(clock: Res<StepClock>, tuning: Res<WorldTuning>, mut bodies: Query<&mut Body>) {
    let damping = 1.0 - tuning.air_friction;
    for mut body in bodies.iter_mut() {
        if body.pinned {
            body.velocity = Vec2::ZERO;
            continue;
        }
        body.velocity *= damping;
        let velocity = body.velocity;
        body.position += velocity * clock.dt;
    }
}

/// Separates and bounces two overlapping circles.
///
/// Returns true when a contact was resolved.
pub fn resolve_contact(a: &mut Body, b: &mut Body, restitution: f32, friction: f32) -> bool {
    let inv_a = a.inv_mass();
    let inv_b = b.inv_mass();
    let total_inv = inv_a + inv_b;
    if total_inv <= 0.0 {
        return false;
    }

    let delta = b.position - a.position;
    let min_dist = a.radius + b.radius;
    let dist_sq = delta.length_squared();
    if dist_sq >= min_dist * min_dist {
        return false;
    }

    let dist = dist_sq.sqrt();
    let normal = if dist < COINCIDENT_EPSILON {
        Vec2::X
    } else {
        delta / dist
    };

    // Positional correction, split by inverse mass
    let overlap = min_dist - dist;
    a.position -= normal * overlap * (inv_a / total_inv);
    b.position += normal * overlap * (inv_b / total_inv);

    let relative = b.velocity - a.velocity;
    let closing = relative.dot(normal);
    if closing > 0.0 {
        return true;
    }

    let j = -(1.0 + restitution) * closing / total_inv;
    let impulse = normal * j;
    a.velocity -= impulse * inv_a;
    b.velocity += impulse * inv_b;

    // Coulomb-style tangential friction bounded by the normal impulse
    let tangent_velocity = relative - normal * closing;
    let tangent_speed = tangent_velocity.length();
    if tangent_speed > COINCIDENT_EPSILON {
        let tangent = tangent_velocity / tangent_speed;
        let jt = (tangent_speed / total_inv).min(friction * j.abs());
        a.velocity += tangent * jt * inv_a;
        b.velocity -= tangent * jt * inv_b;
    }
    true
}

/// System: resolve every overlapping body pair
pub fn resolve_body_contacts(tuning: Res<WorldTuning>, mut bodies: Query<&mut Body>) {
    let mut combos = bodies.iter_combinations_mut();
    while let Some([mut a, mut b]) = combos.fetch_next() {
        resolve_contact(&mut a, &mut b, tuning.restitution, tuning.friction);
    }
}

/// Keeps a body inside the arena, reflecting the velocity component that
/// points into the wall.
pub fn contain_body(body: &mut Body, arena: &Arena, restitution: f32) {
    let clamped = arena.clamp_center(body.position, body.radius);
    if clamped.x != body.position.x {
        let into_wall = (clamped.x > body.position.x && body.velocity.x < 0.0)
            || (clamped.x < body.position.x && body.velocity.x > 0.0);
        if into_wall {
            body.velocity.x = -body.velocity.x * restitution;
        }
    }
    if clamped.y != body.position.y {
        let into_wall = (clamped.y > body.position.y && body.velocity.y < 0.0)
            || (clamped.y < body.position.y && body.velocity.y > 0.0);
        if into_wall {
            body.velocity.y = -body.velocity.y * restitution;
        }
    }
    body.position = clamped;
}

/// System: wall containment
pub fn resolve_walls(arena: Res<Arena>, tuning: Res<WorldTuning>, mut bodies: Query<&mut Body>) {
    for mut body in bodies.iter_mut() {
        if body.pinned {
            continue;
        }
        contain_body(&mut body, &arena, tuning.restitution);
    }
}

/// System: cap speed of every body
pub fn clamp_speed(tuning: Res<WorldTuning>, mut bodies: Query<&mut Body>) {
    for mut body in bodies.iter_mut() {
        if body.pinned {
            continue;
        }
        if body.speed() > tuning.max_speed {
            let capped = body.velocity.clamp_length_max(tuning.max_speed);
            body.velocity = capped;
        }
    }
}

/// System: count the completed step
pub fn advance_clock(mut clock: ResMut<StepClock>) {
    clock.tick += 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_at(x: f32, y: f32) -> Body {
        Body::new(Vec2::new(x, y), Vec2::ZERO, 40.0, 1.0)
    }

    #[test]
    fn test_contact_separates_overlap() {
        let mut a = body_at(100.0, 100.0);
        let mut b = body_at(150.0, 100.0);
        a.velocity = Vec2::new(30.0, 0.0);
        b.velocity = Vec2::new(-30.0, 0.0);

        assert!(resolve_contact(&mut a, &mut b, 0.3, 0.1));
        let gap = a.position.distance(b.position);
        assert!((gap - 80.0).abs() < 1e-3);
        // Approaching velocities reversed and damped by restitution
        assert!(a.velocity.x < 0.0);
        assert!(b.velocity.x > 0.0);
        assert!((b.velocity.x - 9.0).abs() < 1e-3);
    }

    #[test]
    fn test_contact_ignores_separated_bodies() {
        let mut a = body_at(100.0, 100.0);
        let mut b = body_at(200.0, 100.0);
        assert!(!resolve_contact(&mut a, &mut b, 0.3, 0.1));
        assert_eq!(a.position, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_pinned_body_is_immovable_in_contact() {
        let mut a = body_at(100.0, 100.0);
        a.set_pinned(true);
        let mut b = body_at(150.0, 100.0);
        b.velocity = Vec2::new(-50.0, 0.0);

        resolve_contact(&mut a, &mut b, 0.3, 0.1);
        assert_eq!(a.position, Vec2::new(100.0, 100.0));
        assert_eq!(a.velocity, Vec2::ZERO);
        assert!((b.position.x - 180.0).abs() < 1e-3);
        assert!(b.velocity.x > 0.0);
    }

    #[test]
    fn test_coincident_centers_are_split() {
        let mut a = body_at(100.0, 100.0);
        let mut b = body_at(100.0, 100.0);
        resolve_contact(&mut a, &mut b, 0.3, 0.1);
        assert!((a.position.distance(b.position) - 80.0).abs() < 1e-3);
    }

    #[test]
    fn test_wall_reflects_velocity() {
        let arena = Arena::new(800.0, 600.0);
        let mut body = body_at(10.0, 300.0);
        body.velocity = Vec2::new(-100.0, 5.0);

        contain_body(&mut body, &arena, 0.5);
        assert_eq!(body.position, Vec2::new(40.0, 300.0));
        assert_eq!(body.velocity, Vec2::new(50.0, 5.0));
    }

    #[test]
    fn test_clamp_speed_system() {
        let mut world = World::new();
        world.insert_resource(WorldTuning::default());
        let mut fast = body_at(100.0, 100.0);
        fast.velocity = Vec2::new(1000.0, 1000.0);
        let id = world.spawn(fast).id();

        let mut schedule = Schedule::default();
        schedule.add_systems(clamp_speed);
        schedule.run(&mut world);

        let speed = world.get::<Body>(id).unwrap().speed();
        assert!(speed <= WorldTuning::default().max_speed + 1e-3);
    }
}
