// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event bus for broadcasting accessory events.

use tokio::sync::broadcast;

use super::{AccessoryEvent, AccessorySink};
use crate::state::{Characteristic, CharacteristicValue};
use crate::types::NodeId;

/// Default channel capacity for the event bus.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Accessory sink broadcasting [`AccessoryEvent`]s to any number of subscribers.
///
/// A subscriber that falls more than the channel capacity behind loses the
/// oldest events and receives `RecvError::Lagged`.
///
/// # Examples
///
/// ```
/// use zway_pump_bridge::event::{AccessoryEvent, AccessorySink, EventBus};
/// use zway_pump_bridge::types::NodeId;
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.create_accessory(NodeId::new(7), "Cistern");
/// assert_eq!(
///     rx.try_recv().unwrap(),
///     AccessoryEvent::created(NodeId::new(7), "Cistern")
/// );
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AccessoryEvent>,
}

impl EventBus {
    /// Creates a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a new event bus with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to accessory events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AccessoryEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes an event to all subscribers.
    ///
    /// Without subscribers the event is discarded.
    pub fn publish(&self, event: AccessoryEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("No subscriber for accessory event");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessorySink for EventBus {
    fn create_accessory(&self, node_id: NodeId, name: &str) {
        self.publish(AccessoryEvent::created(node_id, name));
    }

    fn destroy_accessory(&self, node_id: NodeId) {
        self.publish(AccessoryEvent::destroyed(node_id));
    }

    fn update_characteristic(
        &self,
        node_id: NodeId,
        characteristic: Characteristic,
        value: CharacteristicValue,
    ) {
        self.publish(AccessoryEvent::characteristic_updated(
            node_id,
            characteristic,
            value,
        ));
    }
}
