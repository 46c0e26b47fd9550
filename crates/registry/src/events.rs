//! Event sinks receiving registry state changes.

use crate::config::RegistryConfig;
use certchain_types::RegistryEvent;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Receiver of committed registry events.
///
/// `publish` is called while the registry still holds its write guard, so
/// implementations must not call back into the registry.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &RegistryEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn publish(&self, _event: &RegistryEvent) {}
}

/// Records events in memory, in commit order.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventSink {
    events: Arc<RwLock<Vec<RegistryEvent>>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RegistryEvent> {
        self.events.read().clone()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    pub fn clear(&self) {
        self.events.write().clear();
    }
}

impl EventSink for MemoryEventSink {
    fn publish(&self, event: &RegistryEvent) {
        self.events.write().push(event.clone());
    }
}

/// Fans events out to any number of tokio subscribers.
///
/// Slow subscribers lag and lose the oldest events once `capacity` is
/// exceeded; publishing never blocks.
#[derive(Debug, Clone)]
pub struct BroadcastEventSink {
    sender: broadcast::Sender<RegistryEvent>,
}

impl BroadcastEventSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn for_config(config: &RegistryConfig) -> Self {
        Self::new(config.event_capacity)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventSink for BroadcastEventSink {
    fn publish(&self, event: &RegistryEvent) {
        // No subscribers is not an error.
        let _ = self.sender.send(event.clone());
    }
}
