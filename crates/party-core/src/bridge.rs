//! Position Bridge
//!
//! Carries each body's position out of the physics step into a per-entity
//! `watch` channel. Writes are a single `send_replace` per entity per tick and
//! never wait on readers. Consumers either sample the latest value through a
//! [`PositionFeed`] or subscribe to one entity and react only to its updates.

use bevy_ecs::prelude::*;
use party_events::{EntityId, PositionSample};
use std::collections::HashMap;
use tokio::sync::watch;

/// Write side, owned by the physics world
#[derive(Resource, Debug)]
pub struct PositionBridge {
    order: Vec<EntityId>,
    senders: HashMap<EntityId, watch::Sender<PositionSample>>,
}

impl PositionBridge {
    /// Creates one channel per id, each starting at the default sample.
    pub fn new<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = EntityId>,
    {
        let mut order = Vec::new();
        let mut senders = HashMap::new();
        for id in ids {
            if senders.contains_key(&id) {
                continue;
            }
            let (tx, _rx) = watch::channel(PositionSample::default());
            senders.insert(id.clone(), tx);
            order.push(id);
        }
        Self { order, senders }
    }

    /// Stores the latest sample for `id`. Unknown ids are ignored.
    pub fn publish(&self, id: &EntityId, sample: PositionSample) -> bool {
        match self.senders.get(id) {
            Some(tx) => {
                tx.send_replace(sample);
                true
            }
            None => false,
        }
    }

    /// Read side over every channel, in catalog order.
    pub fn feed(&self) -> PositionFeed {
        let receivers = self
            .order
            .iter()
            .filter_map(|id| self.senders.get(id).map(|tx| (id.clone(), tx.subscribe())))
            .collect();
        PositionFeed { receivers }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Read side of the bridge; cheap to clone and safe to hold across teardown
#[derive(Debug, Clone)]
pub struct PositionFeed {
    receivers: Vec<(EntityId, watch::Receiver<PositionSample>)>,
}

impl PositionFeed {
    /// Latest sample for `id`.
    pub fn get(&self, id: &EntityId) -> Option<PositionSample> {
        self.receivers
            .iter()
            .find(|(rid, _)| rid == id)
            .map(|(_, rx)| *rx.borrow())
    }

    /// A dedicated receiver for one entity, for consumers that await changes.
    pub fn subscribe(&self, id: &EntityId) -> Option<watch::Receiver<PositionSample>> {
        self.receivers
            .iter()
            .find(|(rid, _)| rid == id)
            .map(|(_, rx)| rx.clone())
    }

    /// Latest sample of every entity, in catalog order.
    pub fn latest(&self) -> Vec<(EntityId, PositionSample)> {
        self.receivers
            .iter()
            .map(|(id, rx)| (id.clone(), *rx.borrow()))
            .collect()
    }

    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.receivers.iter().map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.receivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn ids() -> Vec<EntityId> {
        vec!["a".into(), "b".into(), "a".into()]
    }

    #[test]
    fn test_bridge_dedupes_ids() {
        let bridge = PositionBridge::new(ids());
        assert_eq!(bridge.len(), 2);
    }

    #[test]
    fn test_publish_is_visible_to_feed() {
        let bridge = PositionBridge::new(ids());
        let feed = bridge.feed();

        assert!(bridge.publish(&"a".into(), PositionSample::new(Vec2::new(1.0, 2.0), false, 3)));
        assert!(!bridge.publish(&"zzz".into(), PositionSample::default()));

        let sample = feed.get(&"a".into()).unwrap();
        assert_eq!(sample.position, Vec2::new(1.0, 2.0));
        assert_eq!(sample.tick, 3);
        assert_eq!(feed.get(&"b".into()), Some(PositionSample::default()));
        assert_eq!(feed.get(&"zzz".into()), None);

        let latest = feed.latest();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].0.as_str(), "a");
    }

    #[tokio::test]
    async fn test_subscriber_sees_only_its_entity() {
        let bridge = PositionBridge::new(ids());
        let mut rx_b = bridge.feed().subscribe(&"b".into()).unwrap();

        bridge.publish(&"a".into(), PositionSample::new(Vec2::new(9.0, 9.0), false, 1));
        assert!(!rx_b.has_changed().unwrap());

        bridge.publish(&"b".into(), PositionSample::new(Vec2::new(4.0, 4.0), true, 1));
        rx_b.changed().await.unwrap();
        let sample = *rx_b.borrow_and_update();
        assert!(sample.pinned);
        assert_eq!(sample.position, Vec2::new(4.0, 4.0));
    }
}
