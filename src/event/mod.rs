// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Accessory side of the bridge.
//!
//! The bridge does not know the accessory framework it feeds. It drives an
//! [`AccessorySink`], which receives accessory creation, destruction and
//! characteristic updates. [`EventBus`] is a sink that rebroadcasts those
//! calls as [`AccessoryEvent`]s over a tokio broadcast channel.
//!
//! Inbound set events travel the other way, through
//! [`BridgeHandle`](crate::manager::BridgeHandle).

mod accessory_event;
mod event_bus;

pub use accessory_event::AccessoryEvent;
pub use event_bus::EventBus;

use crate::state::{Characteristic, CharacteristicValue};
use crate::types::NodeId;

/// Receiver of accessory lifecycle and characteristic updates.
pub trait AccessorySink {
    /// Registers a new accessory.
    fn create_accessory(&self, node_id: NodeId, name: &str);

    /// Unregisters an accessory.
    fn destroy_accessory(&self, node_id: NodeId);

    /// Publishes a new characteristic value.
    fn update_characteristic(
        &self,
        node_id: NodeId,
        characteristic: Characteristic,
        value: CharacteristicValue,
    );
}
