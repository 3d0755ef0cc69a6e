//! Party Runtime
//!
//! Cooperative single-task loop tying the pieces together. One `select!`
//! multiplexes the physics tick, the slower proximity poll, generation
//! completions, and pointer commands, so every mutation happens on the same
//! task and nothing needs a lock.
//!
//! After every poll and every applied turn a [`PartySnapshot`] is published
//! on a `watch` channel. Snapshot and turn times share the engine's origin.
//! The loop ends on [`Command::Stop`] or once every [`RuntimeHandle`] is
//! dropped.

use glam::Vec2;
use party_events::{Catalog, EntityView, PartySnapshot};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

use crate::bridge::PositionFeed;
use crate::components::Arena;
use crate::config::PartyConfig;
use crate::conversation::{Completion, ConversationEngine};
use crate::error::PartyError;
use crate::interaction::{self, PointerOutcome};
use crate::world::PhysicsWorld;

/// Offset applied to the configured seed for the conversation layer, so it
/// does not replay the physics stream
const ENGINE_SEED_OFFSET: u64 = 0x5eed;

/// Input accepted by a running party.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    PointerDown(Vec2),
    PointerDrag(Vec2),
    PointerUp,
    Stop,
}

/// Totals for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub polls: u64,
    pub conversations_started: u64,
    pub conversations_ended: u64,
    pub turns_produced: u64,
    pub stale_completions: u64,
}

/// Cloneable control surface for a running party.
#[derive(Debug, Clone)]
pub struct RuntimeHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<PartySnapshot>,
    positions: PositionFeed,
}

impl RuntimeHandle {
    /// Queues a command. Returns false once the runtime has stopped.
    pub fn send(&self, command: Command) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn pointer_down(&self, x: f32, y: f32) -> bool {
        self.send(Command::PointerDown(Vec2::new(x, y)))
    }

    pub fn pointer_drag(&self, x: f32, y: f32) -> bool {
        self.send(Command::PointerDrag(Vec2::new(x, y)))
    }

    pub fn pointer_up(&self) -> bool {
        self.send(Command::PointerUp)
    }

    pub fn stop(&self) -> bool {
        self.send(Command::Stop)
    }

    /// Receiver of the per-poll snapshots.
    pub fn snapshots(&self) -> watch::Receiver<PartySnapshot> {
        self.snapshots.clone()
    }

    pub fn latest_snapshot(&self) -> PartySnapshot {
        self.snapshots.borrow().clone()
    }

    /// Per-entity live positions.
    pub fn positions(&self) -> PositionFeed {
        self.positions.clone()
    }
}

pub struct PartyRuntime {
    config: PartyConfig,
    catalog: Catalog,
    world: PhysicsWorld,
    feed: PositionFeed,
    engine: ConversationEngine,
    completions: mpsc::UnboundedReceiver<Completion>,
    commands: mpsc::UnboundedReceiver<Command>,
    snapshots: watch::Sender<PartySnapshot>,
    polls: u64,
}

impl PartyRuntime {
    /// Builds the world, bridge and engine for `catalog`.
    pub fn new(config: PartyConfig, catalog: Catalog) -> Result<(Self, RuntimeHandle), PartyError> {
        config.validate()?;

        let arena = Arena::new(config.world.arena_width, config.world.arena_height);
        let (world_rng, engine_rng) = match config.schedule.seed {
            Some(seed) => (
                SmallRng::seed_from_u64(seed),
                SmallRng::seed_from_u64(seed.wrapping_add(ENGINE_SEED_OFFSET)),
            ),
            None => (SmallRng::from_entropy(), SmallRng::from_entropy()),
        };
        let world = PhysicsWorld::with_rng(catalog.entities(), arena, &config, world_rng);
        let feed = world.feed();

        let (completion_tx, completions) = mpsc::unbounded_channel();
        let engine = ConversationEngine::new(
            config.conversation.clone(),
            catalog.clone(),
            completion_tx,
            engine_rng,
        );

        let (command_tx, commands) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(PartySnapshot::default());

        let runtime = Self {
            config,
            catalog,
            world,
            feed: feed.clone(),
            engine,
            completions,
            commands,
            snapshots: snapshot_tx,
            polls: 0,
        };
        runtime.publish_snapshot();

        let handle = RuntimeHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            positions: feed,
        };
        Ok((runtime, handle))
    }

    /// Runs until stopped, then tears everything down.
    pub async fn run(mut self) -> RunSummary {
        tracing::info!(
            "Party started with {} guests at {} Hz",
            self.catalog.len(),
            self.config.schedule.tick_hz
        );

        let mut tick = tokio::time::interval(self.config.schedule.tick_interval());
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut poll = tokio::time::interval(self.config.schedule.poll_interval());
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    self.world.step();
                }
                _ = poll.tick() => {
                    self.poll();
                }
                Some(completion) = self.completions.recv() => {
                    if self.engine.apply_completion(completion) {
                        self.publish_snapshot();
                    }
                }
                command = self.commands.recv() => match command {
                    Some(Command::Stop) => {
                        tracing::info!("Stop requested");
                        break;
                    }
                    Some(command) => self.handle_command(command),
                    None => {
                        tracing::info!("All handles dropped, stopping");
                        break;
                    }
                },
            }
        }

        self.shutdown()
    }

    fn poll(&mut self) {
        self.engine.poll(&self.feed);
        self.polls += 1;
        self.publish_snapshot();
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::PointerDown(point) => {
                if let PointerOutcome::Missed = interaction::pointer_down(&mut self.world, point) {
                    tracing::trace!("Pointer down at {} hit nothing", point);
                }
            }
            Command::PointerDrag(point) => {
                interaction::pointer_drag(&mut self.world, point);
            }
            Command::PointerUp => interaction::pointer_up(&mut self.world),
            Command::Stop => {}
        }
    }

    /// Current presentation state, read through the position bridge.
    pub fn snapshot(&self) -> PartySnapshot {
        let entities = self
            .catalog
            .iter()
            .filter_map(|entity| {
                let sample = self.feed.get(&entity.id)?;
                Some(EntityView {
                    id: entity.id.clone(),
                    short_name: entity.label().to_string(),
                    x: sample.position.x,
                    y: sample.position.y,
                    pinned: sample.pinned,
                    status: self.engine.display_status(&entity.id),
                })
            })
            .collect();

        PartySnapshot {
            tick: self.world.tick(),
            elapsed_ms: self.engine.started_at().elapsed().as_millis() as u64,
            entities,
            conversations: self.engine.conversations(),
        }
    }

    fn publish_snapshot(&self) {
        self.snapshots.send_replace(self.snapshot());
    }

    fn summary(&self) -> RunSummary {
        let stats = self.engine.stats();
        RunSummary {
            ticks: self.world.tick(),
            polls: self.polls,
            conversations_started: stats.started,
            conversations_ended: stats.ended,
            turns_produced: stats.turns,
            stale_completions: stats.stale,
        }
    }

    /// Publishes the final state, then cancels all generation.
    fn shutdown(mut self) -> RunSummary {
        self.publish_snapshot();
        self.engine.teardown();
        let summary = self.summary();
        tracing::info!(
            "Party stopped after {} ticks: {} conversations, {} turns",
            summary.ticks,
            summary.conversations_started,
            summary.turns_produced
        );
        summary
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn engine(&self) -> &ConversationEngine {
        &self.engine
    }
}
