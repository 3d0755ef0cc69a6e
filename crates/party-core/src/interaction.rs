//! Pointer Interaction
//!
//! Pointer-down toggles the pin of the body under the pointer. Unpinning also
//! grabs the body, so the same press can drag it until pointer-up. Pointer
//! events that hit nothing, or arrive after the body is gone, do nothing.

use glam::Vec2;
use party_events::EntityId;

use crate::world::PhysicsWorld;

/// What a pointer-down did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerOutcome {
    Missed,
    /// Body became static
    Pinned(EntityId),
    /// Body became dynamic and is now held by the pointer
    Grabbed(EntityId),
}

pub fn pointer_down(world: &mut PhysicsWorld, point: Vec2) -> PointerOutcome {
    let Some(id) = world.query_at(point) else {
        return PointerOutcome::Missed;
    };
    match world.toggle_pinned(&id) {
        Some(true) => {
            tracing::debug!("Pinned {}", id);
            PointerOutcome::Pinned(id)
        }
        Some(false) => {
            world.begin_drag(&id, point);
            tracing::debug!("Unpinned and grabbed {}", id);
            PointerOutcome::Grabbed(id)
        }
        None => PointerOutcome::Missed,
    }
}

/// Moves the drag target. Returns false when nothing is held.
pub fn pointer_drag(world: &mut PhysicsWorld, point: Vec2) -> bool {
    world.drag_to(point)
}

pub fn pointer_up(world: &mut PhysicsWorld) {
    world.end_drag();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Arena;
    use crate::config::PartyConfig;
    use party_events::Entity;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn world() -> (PhysicsWorld, EntityId) {
        let entities = vec![Entity::new("solo", 1, "Solo", "Paris", "France")];
        let mut world = PhysicsWorld::with_rng(
            &entities,
            Arena::new(1000.0, 800.0),
            &PartyConfig::default(),
            SmallRng::seed_from_u64(5),
        );
        let id = EntityId::from("solo");
        world.set_position(&id, Vec2::new(500.0, 400.0));
        (world, id)
    }

    #[test]
    fn test_click_toggles_pin() {
        let (mut world, id) = world();
        let point = Vec2::new(510.0, 400.0);

        assert_eq!(pointer_down(&mut world, point), PointerOutcome::Pinned(id.clone()));
        assert_eq!(world.is_pinned(&id), Some(true));
        assert_eq!(world.body(&id).unwrap().velocity, Vec2::ZERO);
        pointer_up(&mut world);

        assert_eq!(pointer_down(&mut world, point), PointerOutcome::Grabbed(id.clone()));
        assert_eq!(world.is_pinned(&id), Some(false));
        assert_eq!(world.dragging(), Some(id));
    }

    #[test]
    fn test_miss_does_nothing() {
        let (mut world, id) = world();
        assert_eq!(pointer_down(&mut world, Vec2::new(10.0, 10.0)), PointerOutcome::Missed);
        assert_eq!(world.is_pinned(&id), Some(false));
        assert!(!pointer_drag(&mut world, Vec2::new(20.0, 20.0)));
    }

    #[test]
    fn test_drag_after_grab_moves_body() {
        let (mut world, id) = world();
        let point = Vec2::new(500.0, 400.0);
        pointer_down(&mut world, point);
        pointer_down(&mut world, point);

        let target = Vec2::new(700.0, 400.0);
        assert!(pointer_drag(&mut world, target));
        for _ in 0..20 {
            world.step();
        }
        assert!(world.position(&id).unwrap().x > 600.0);

        pointer_up(&mut world);
        assert_eq!(world.dragging(), None);
    }
}
