//! Event bus for mileage using tokio::broadcast
//!
//! Push side of stale-while-revalidate: the recompute job announces each
//! statistic as it lands in the cache, so a presentation layer can redraw
//! instead of polling.

use crate::job::JobStatus;
use crate::models::VehicleId;
use tokio::sync::broadcast;

/// Events emitted by the statistics core
#[derive(Debug, Clone, PartialEq)]
pub enum StatsEvent {
    /// Every row of a vehicle was marked invalid
    CacheInvalidated(VehicleId),
    /// A statistic was written to the cache
    StatisticUpdated { vehicle_id: VehicleId, key: String },
    /// A recompute job began evaluating statistics
    JobStarted(VehicleId),
    /// A recompute job reached a terminal state
    JobFinished {
        vehicle_id: VehicleId,
        status: JobStatus,
    },
}

/// Event bus for broadcasting statistics events
///
/// Uses tokio::broadcast for multi-consumer support; a lagging receiver
/// loses old events, which is fine since the cache is the source of truth.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StatsEvent>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create with default capacity (256 events)
    pub fn default_capacity() -> Self {
        Self::new(256)
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: StatsEvent) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to receive events
    pub fn subscribe(&self) -> broadcast::Receiver<StatsEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::default_capacity()
    }
}
