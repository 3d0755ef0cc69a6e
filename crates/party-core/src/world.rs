//! Rigid-Body World
//!
//! Owns the ECS world holding one [`Body`] per catalog entity, the per-tick
//! schedule, and the lookup between catalog ids and ECS entities. ECS entity
//! handles never leave this module; callers address bodies by [`EntityId`].
//!
//! Every operation naming an unknown id is a no-op that reports `false` or
//! `None`, so late pointer events after teardown are harmless.

use bevy_ecs::prelude::*;
use glam::Vec2;
use party_events::{Entity as CatalogEntity, EntityId, PositionSample};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

use crate::bridge::{PositionBridge, PositionFeed};
use crate::components::{Arena, Body, DragConstraint, Persona, SimRng, StepClock};
use crate::config::PartyConfig;
use crate::systems::build_step_schedule;

/// Bidirectional id lookup, in spawn order
#[derive(Debug, Default)]
struct BodyRegistry {
    by_id: HashMap<EntityId, Entity>,
    by_body: HashMap<Entity, EntityId>,
    order: Vec<Entity>,
}

impl BodyRegistry {
    fn insert(&mut self, id: EntityId, body: Entity) {
        self.by_id.insert(id.clone(), body);
        self.by_body.insert(body, id);
        self.order.push(body);
    }

    fn body(&self, id: &EntityId) -> Option<Entity> {
        self.by_id.get(id).copied()
    }

    fn id(&self, body: Entity) -> Option<&EntityId> {
        self.by_body.get(&body)
    }
}

/// The simulated arena and its bodies.
pub struct PhysicsWorld {
    world: World,
    schedule: Schedule,
    registry: BodyRegistry,
}

impl PhysicsWorld {
    /// Creates one body per entity at a random spot inside the margin-inset
    /// region, with a small random starting velocity.
    ///
    /// Uses `config.schedule.seed` when set; otherwise seeds from entropy.
    ///
    /// `config` is expected to have passed [`PartyConfig::validate`];
    /// `PartyRuntime::new` checks it. Out-of-range forcing probabilities are
    /// clamped rather than rejected here.
    pub fn new(entities: &[CatalogEntity], arena: Arena, config: &PartyConfig) -> Self {
        let rng = match config.schedule.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self::with_rng(entities, arena, config, rng)
    }

    /// Same as [`PhysicsWorld::new`] with an explicit random stream.
    pub fn with_rng(
        entities: &[CatalogEntity],
        arena: Arena,
        config: &PartyConfig,
        mut rng: SmallRng,
    ) -> Self {
        let tuning = &config.world;
        let mut world = World::new();
        let mut registry = BodyRegistry::default();

        let bridge = PositionBridge::new(entities.iter().map(|e| e.id.clone()));

        for entity in entities {
            if registry.body(&entity.id).is_some() {
                tracing::warn!("Duplicate entity id {} ignored", entity.id);
                continue;
            }
            let position = spawn_point(&mut rng, &arena, tuning.arena_margin, tuning.body_radius);
            let velocity = Vec2::new(
                rng.gen_range(-1.0f32..=1.0) * tuning.initial_speed,
                rng.gen_range(-1.0f32..=1.0) * tuning.initial_speed,
            );
            let body = Body::new(position, velocity, tuning.body_radius, tuning.body_mass);
            bridge.publish(&entity.id, PositionSample::new(position, false, 0));

            let handle = world
                .spawn((body, Persona::from_entity(entity)))
                .id();
            registry.insert(entity.id.clone(), handle);
        }

        world.insert_resource(arena);
        world.insert_resource(StepClock::new(config.schedule.dt()));
        world.insert_resource(SimRng(rng));
        world.insert_resource(config.world.clone());
        world.insert_resource(config.behavior.clone());
        world.insert_resource(config.interaction.clone());
        world.insert_resource(bridge);

        tracing::debug!(
            "Created world {}x{} with {} bodies",
            arena.width,
            arena.height,
            registry.order.len()
        );

        Self {
            world,
            schedule: build_step_schedule(),
            registry,
        }
    }

    /// Advances the simulation by one fixed step.
    pub fn step(&mut self) {
        self.schedule.run(&mut self.world);
    }

    /// Number of completed steps.
    pub fn tick(&self) -> u64 {
        self.world.resource::<StepClock>().tick
    }

    pub fn arena(&self) -> Arena {
        *self.world.resource::<Arena>()
    }

    /// Read side of the position bridge.
    pub fn feed(&self) -> PositionFeed {
        self.world.resource::<PositionBridge>().feed()
    }

    pub fn len(&self) -> usize {
        self.registry.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.order.is_empty()
    }

    /// Entity ids in spawn order.
    pub fn ids(&self) -> Vec<EntityId> {
        self.registry
            .order
            .iter()
            .filter_map(|body| self.registry.id(*body).cloned())
            .collect()
    }

    /// Copy of the body for `id`.
    pub fn body(&self, id: &EntityId) -> Option<Body> {
        let handle = self.registry.body(id)?;
        self.world.get::<Body>(handle).cloned()
    }

    pub fn position(&self, id: &EntityId) -> Option<Vec2> {
        self.body(id).map(|b| b.position)
    }

    pub fn is_pinned(&self, id: &EntityId) -> Option<bool> {
        self.body(id).map(|b| b.pinned)
    }

    fn body_mut(&mut self, id: &EntityId) -> Option<Mut<'_, Body>> {
        let handle = self.registry.body(id)?;
        self.world.get_mut::<Body>(handle)
    }

    /// Switches a body between dynamic and static. Pinning zeroes velocity
    /// and releases any drag on it.
    pub fn set_pinned(&mut self, id: &EntityId, pinned: bool) -> bool {
        let Some(handle) = self.registry.body(id) else {
            tracing::debug!("set_pinned ignored for unknown id {}", id);
            return false;
        };
        match self.world.get_mut::<Body>(handle) {
            Some(mut body) => body.set_pinned(pinned),
            None => return false,
        }
        if pinned && self.dragged_body() == Some(handle) {
            self.world.remove_resource::<DragConstraint>();
        }
        true
    }

    /// Flips the pinned flag; returns the new value.
    pub fn toggle_pinned(&mut self, id: &EntityId) -> Option<bool> {
        let pinned = !self.is_pinned(id)?;
        self.set_pinned(id, pinned);
        Some(pinned)
    }

    /// Adds `impulse` to the body's momentum. Pinned bodies are unaffected.
    pub fn apply_impulse(&mut self, id: &EntityId, impulse: Vec2) -> bool {
        match self.body_mut(id) {
            Some(mut body) => {
                body.apply_impulse(impulse);
                true
            }
            None => {
                tracing::debug!("apply_impulse ignored for unknown id {}", id);
                false
            }
        }
    }

    /// Overrides a body's position, projected back inside the arena.
    pub fn set_position(&mut self, id: &EntityId, position: Vec2) -> bool {
        let arena = self.arena();
        match self.body_mut(id) {
            Some(mut body) => {
                let radius = body.radius;
                body.position = arena.clamp_center(position, radius);
                true
            }
            None => false,
        }
    }

    /// Topmost body containing `point`.
    pub fn query_at(&self, point: Vec2) -> Option<EntityId> {
        self.registry.order.iter().rev().find_map(|handle| {
            let body = self.world.get::<Body>(*handle)?;
            if body.contains(point) {
                self.registry.id(*handle).cloned()
            } else {
                None
            }
        })
    }

    /// Attaches the pointer spring to a free body.
    pub fn begin_drag(&mut self, id: &EntityId, target: Vec2) -> bool {
        let Some(handle) = self.registry.body(id) else {
            return false;
        };
        match self.world.get::<Body>(handle) {
            Some(body) if !body.pinned => {
                self.world.insert_resource(DragConstraint {
                    body: handle,
                    target,
                });
                true
            }
            _ => false,
        }
    }

    /// Moves the pointer target of the active drag.
    pub fn drag_to(&mut self, target: Vec2) -> bool {
        match self.world.get_resource_mut::<DragConstraint>() {
            Some(mut drag) => {
                drag.target = target;
                true
            }
            None => false,
        }
    }

    pub fn end_drag(&mut self) {
        self.world.remove_resource::<DragConstraint>();
    }

    /// Entity currently being dragged.
    pub fn dragging(&self) -> Option<EntityId> {
        self.dragged_body()
            .and_then(|handle| self.registry.id(handle).cloned())
    }

    fn dragged_body(&self) -> Option<Entity> {
        self.world.get_resource::<DragConstraint>().map(|d| d.body)
    }
}

/// Random point inside the margin-inset region; falls back to the whole arena
/// when the margin leaves no room.
fn spawn_point(rng: &mut SmallRng, arena: &Arena, margin: f32, radius: f32) -> Vec2 {
    let pick = |rng: &mut SmallRng, extent: f32| {
        let (lo, hi) = if extent - 2.0 * margin > 0.0 {
            (margin, extent - margin)
        } else {
            (radius.min(extent / 2.0), (extent - radius).max(extent / 2.0))
        };
        if hi > lo {
            rng.gen_range(lo..hi)
        } else {
            lo
        }
    };
    let x = pick(&mut *rng, arena.width);
    let y = pick(&mut *rng, arena.height);
    Vec2::new(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entities() -> Vec<CatalogEntity> {
        vec![
            CatalogEntity::new("a", 1, "A", "Boston", "USA"),
            CatalogEntity::new("b", 2, "B", "London", "UK"),
            CatalogEntity::new("c", 30, "C", "Tokyo", "Japan"),
        ]
    }

    fn world() -> PhysicsWorld {
        let config = PartyConfig::default();
        PhysicsWorld::with_rng(
            &entities(),
            Arena::new(1000.0, 800.0),
            &config,
            SmallRng::seed_from_u64(3),
        )
    }

    #[test]
    fn test_spawn_inside_margin() {
        let world = world();
        assert_eq!(world.len(), 3);
        for id in world.ids() {
            let p = world.position(&id).unwrap();
            assert!(p.x >= 150.0 && p.x <= 850.0, "x out of margin: {}", p.x);
            assert!(p.y >= 150.0 && p.y <= 650.0, "y out of margin: {}", p.y);
        }
    }

    #[test]
    fn test_configured_seed_is_reproducible() {
        let mut config = PartyConfig::default();
        config.schedule.seed = Some(21);
        let arena = Arena::new(1000.0, 800.0);
        let a = PhysicsWorld::new(&entities(), arena, &config);
        let b = PhysicsWorld::new(&entities(), arena, &config);

        for id in a.ids() {
            assert_eq!(a.body(&id), b.body(&id));
        }
    }

    #[test]
    fn test_unvalidated_probability_does_not_panic() {
        let mut config = PartyConfig::default();
        config.behavior.wander_probability = 1.5;
        assert!(config.validate().is_err());

        let mut world = PhysicsWorld::with_rng(
            &entities(),
            Arena::new(1000.0, 800.0),
            &config,
            SmallRng::seed_from_u64(8),
        );
        for _ in 0..10 {
            world.step();
        }
        assert_eq!(world.tick(), 10);
    }

    #[test]
    fn test_initial_positions_are_bridged() {
        let world = world();
        let feed = world.feed();
        for id in world.ids() {
            assert_eq!(feed.get(&id).unwrap().position, world.position(&id).unwrap());
        }
    }

    #[test]
    fn test_unknown_ids_are_noops() {
        let mut world = world();
        let ghost = EntityId::from("ghost");
        assert!(!world.set_pinned(&ghost, true));
        assert!(!world.apply_impulse(&ghost, Vec2::X));
        assert!(!world.set_position(&ghost, Vec2::ZERO));
        assert!(!world.begin_drag(&ghost, Vec2::ZERO));
        assert_eq!(world.toggle_pinned(&ghost), None);
        world.step();
        assert_eq!(world.tick(), 1);
    }

    #[test]
    fn test_query_at_prefers_topmost() {
        let mut world = world();
        let a = EntityId::from("a");
        let c = EntityId::from("c");
        world.set_position(&EntityId::from("b"), Vec2::new(100.0, 100.0));
        world.set_position(&a, Vec2::new(500.0, 400.0));
        world.set_position(&c, Vec2::new(520.0, 400.0));

        assert_eq!(world.query_at(Vec2::new(510.0, 400.0)), Some(c));
        assert_eq!(world.query_at(Vec2::new(465.0, 400.0)), Some(a));
        assert_eq!(world.query_at(Vec2::new(5.0, 5.0)), None);
    }

    #[test]
    fn test_pinning_releases_drag() {
        let mut world = world();
        let a = EntityId::from("a");
        assert!(world.begin_drag(&a, Vec2::new(100.0, 100.0)));
        assert_eq!(world.dragging(), Some(a.clone()));

        world.set_pinned(&a, true);
        assert_eq!(world.dragging(), None);
        assert!(!world.begin_drag(&a, Vec2::new(100.0, 100.0)));
        assert!(!world.drag_to(Vec2::ZERO));
    }

    #[test]
    fn test_drag_pulls_body_toward_pointer() {
        let mut world = world();
        let a = EntityId::from("a");
        world.set_position(&a, Vec2::new(200.0, 200.0));
        let target = Vec2::new(800.0, 600.0);
        assert!(world.begin_drag(&a, target));

        let before = world.position(&a).unwrap().distance(target);
        for _ in 0..30 {
            world.step();
        }
        let after = world.position(&a).unwrap().distance(target);
        assert!(after < before / 2.0, "drag made no progress: {} -> {}", before, after);

        world.end_drag();
        assert_eq!(world.dragging(), None);
    }
}
