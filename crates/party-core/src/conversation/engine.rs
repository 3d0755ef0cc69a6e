//! Conversation Engine
//!
//! Polls bridged positions on its own timer and drives the per-pair state
//! machine: absent, `Pending` while the opening turn is generated, `Active`
//! once a turn exists, and absent again after disconnect.
//!
//! Generation runs as a spawned task that sleeps for a simulated latency and
//! then posts a [`Completion`] on a channel owned by the caller. The caller
//! feeds completions back through [`ConversationEngine::apply_completion`].
//! Completions that outlive their pair (disconnect, teardown) are recognised
//! by pair id and epoch and dropped.

use party_events::{
    Catalog, ConversationState, ConversationView, DisplayStatus, EntityId, PairKey, Turn,
};
use rand::rngs::SmallRng;
use rand::Rng;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use uuid::Uuid;

use super::content::compose_turn;
use super::status::display_status;
use crate::bridge::PositionFeed;
use crate::config::ConversationTuning;

/// A finished generation, posted back to the engine's owner.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub key: PairKey,
    pub pair_id: Uuid,
    pub epoch: u64,
    pub speaker: EntityId,
    pub text: String,
}

/// One live pair and its history.
#[derive(Debug, Clone)]
pub struct ConversationPair {
    pub id: Uuid,
    pub key: PairKey,
    pub state: ConversationState,
    pub turns: Vec<Turn>,
    /// Time the latest turn landed
    pub last_active: Option<Instant>,
}

impl ConversationPair {
    fn new(key: PairKey) -> Self {
        Self {
            id: Uuid::new_v4(),
            key,
            state: ConversationState::Pending,
            turns: Vec::new(),
            last_active: None,
        }
    }

    pub fn view(&self) -> ConversationView {
        ConversationView {
            id: self.id,
            key: self.key.clone(),
            state: self.state,
            turn_count: self.turns.len(),
            last_turn: self.turns.last().cloned(),
        }
    }
}

/// Running counters, reported when the runtime stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub started: u64,
    pub ended: u64,
    pub turns: u64,
    pub stale: u64,
}

pub struct ConversationEngine {
    tuning: ConversationTuning,
    catalog: Catalog,
    pairs: BTreeMap<PairKey, ConversationPair>,
    /// Pending markers: at most one generation per pair
    in_flight: HashMap<PairKey, AbortHandle>,
    epoch: u64,
    completions: mpsc::UnboundedSender<Completion>,
    rng: SmallRng,
    started_at: Instant,
    stats: EngineStats,
}

impl ConversationEngine {
    pub fn new(
        tuning: ConversationTuning,
        catalog: Catalog,
        completions: mpsc::UnboundedSender<Completion>,
        rng: SmallRng,
    ) -> Self {
        Self {
            tuning,
            catalog,
            pairs: BTreeMap::new(),
            in_flight: HashMap::new(),
            epoch: 0,
            completions,
            rng,
            started_at: Instant::now(),
            stats: EngineStats::default(),
        }
    }

    /// One proximity pass over every unordered pair in the feed.
    ///
    /// Must be called from inside a tokio runtime: new generations are
    /// spawned as tasks.
    pub fn poll(&mut self, feed: &PositionFeed) {
        let now = Instant::now();
        let samples: Vec<_> = feed
            .latest()
            .into_iter()
            .filter(|(id, _)| self.catalog.get(id).is_some())
            .collect();

        // Pairs whose participant left the feed cannot be measured
        let orphaned: Vec<PairKey> = self
            .pairs
            .keys()
            .filter(|key| feed.get(key.first()).is_none() || feed.get(key.second()).is_none())
            .cloned()
            .collect();
        for key in orphaned {
            self.disconnect(&key);
        }

        for (i, (a, sample_a)) in samples.iter().enumerate() {
            for (b, sample_b) in &samples[i + 1..] {
                let key = PairKey::new(a.clone(), b.clone());
                self.evaluate(key, sample_a.distance(sample_b), now);
            }
        }
    }

    fn evaluate(&mut self, key: PairKey, distance: f32, now: Instant) {
        let Some(pair) = self.pairs.get(&key) else {
            if distance < self.tuning.connect_threshold && !self.in_flight.contains_key(&key) {
                self.connect(key);
            }
            return;
        };

        if distance >= self.tuning.disconnect_threshold {
            self.disconnect(&key);
            return;
        }

        let cooled = pair
            .last_active
            .map_or(true, |at| now.duration_since(at) >= self.tuning.follow_up_cooldown());
        if pair.state == ConversationState::Active && cooled && !self.in_flight.contains_key(&key)
        {
            self.request_turn(&key);
        }
    }

    fn connect(&mut self, key: PairKey) {
        let pair = ConversationPair::new(key.clone());
        tracing::info!("Conversation {} started between {}", pair.id, key);
        self.pairs.insert(key.clone(), pair);
        self.stats.started += 1;
        self.request_turn(&key);
    }

    fn disconnect(&mut self, key: &PairKey) {
        if let Some(handle) = self.in_flight.remove(key) {
            handle.abort();
        }
        if let Some(pair) = self.pairs.remove(key) {
            tracing::info!(
                "Conversation {} between {} ended after {} turns",
                pair.id,
                key,
                pair.turns.len()
            );
            self.stats.ended += 1;
        }
    }

    /// Composes the next turn now and delivers it after the simulated latency.
    fn request_turn(&mut self, key: &PairKey) {
        let Some(pair) = self.pairs.get(key) else {
            return;
        };

        let speaker_id = match pair.turns.last() {
            Some(last) => key.other(&last.speaker_id).unwrap_or(key.first()).clone(),
            None if self.rng.gen_bool(0.5) => key.first().clone(),
            None => key.second().clone(),
        };
        let Some(listener_id) = key.other(&speaker_id) else {
            return;
        };
        let (Some(speaker), Some(listener)) =
            (self.catalog.get(&speaker_id), self.catalog.get(listener_id))
        else {
            tracing::debug!("Pair {} references an unknown entity", key);
            return;
        };

        let text = compose_turn(speaker, listener, &pair.turns, &mut self.rng);
        let completion = Completion {
            key: key.clone(),
            pair_id: pair.id,
            epoch: self.epoch,
            speaker: speaker_id,
            text,
        };

        let latency = self.latency();
        let tx = self.completions.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(latency).await;
            if tx.send(completion).is_err() {
                tracing::trace!("Completion receiver closed");
            }
        });
        self.in_flight.insert(key.clone(), task.abort_handle());
    }

    fn latency(&mut self) -> Duration {
        let lo = self.tuning.latency_min_ms;
        let hi = self.tuning.latency_max_ms.max(lo);
        Duration::from_millis(self.rng.gen_range(lo..=hi))
    }

    /// Applies a finished generation. Returns false when it was stale.
    pub fn apply_completion(&mut self, completion: Completion) -> bool {
        if completion.epoch != self.epoch {
            tracing::trace!(
                "Dropped completion for {} from epoch {}",
                completion.key,
                completion.epoch
            );
            self.stats.stale += 1;
            return false;
        }
        let pair = match self.pairs.get_mut(&completion.key) {
            Some(pair) if pair.id == completion.pair_id => pair,
            _ => {
                tracing::trace!("Dropped completion for departed pair {}", completion.key);
                self.stats.stale += 1;
                return false;
            }
        };

        let now = Instant::now();
        let produced_at_ms = now.duration_since(self.started_at).as_millis() as u64;
        tracing::debug!(
            "{} [{}]: {}",
            completion.speaker,
            completion.key,
            completion.text
        );
        pair.turns.push(Turn {
            text: completion.text,
            speaker_id: completion.speaker,
            produced_at_ms,
        });
        pair.state = ConversationState::Active;
        pair.last_active = Some(now);
        self.in_flight.remove(&completion.key);
        self.stats.turns += 1;
        true
    }

    /// Cancels every generation and forgets every pair. Completions already
    /// queued carry the old epoch and will be dropped.
    pub fn teardown(&mut self) {
        for (_, handle) in self.in_flight.drain() {
            handle.abort();
        }
        self.epoch += 1;
        let dropped = self.pairs.len();
        self.pairs.clear();
        tracing::info!("Conversation engine torn down, {} pairs dropped", dropped);
    }

    /// Live pairs in key order.
    pub fn conversations(&self) -> Vec<ConversationView> {
        self.pairs.values().map(ConversationPair::view).collect()
    }

    pub fn pair(&self, key: &PairKey) -> Option<&ConversationPair> {
        self.pairs.get(key)
    }

    pub fn state_of(&self, key: &PairKey) -> Option<ConversationState> {
        self.pairs.get(key).map(|p| p.state)
    }

    pub fn is_pending(&self, key: &PairKey) -> bool {
        self.in_flight.contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Origin of `Turn::produced_at_ms`.
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn display_status(&self, id: &EntityId) -> DisplayStatus {
        display_status(id, self.pairs.iter().map(|(key, pair)| (key, pair.state)))
    }
}

impl Drop for ConversationEngine {
    fn drop(&mut self) {
        for (_, handle) in self.in_flight.drain() {
            handle.abort();
        }
    }
}
