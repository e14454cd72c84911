// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Accessory event types.

use crate::state::{Characteristic, CharacteristicValue};
use crate::types::NodeId;

/// Events emitted by the bridge towards the accessory framework.
///
/// # Examples
///
/// ```
/// use zway_pump_bridge::event::AccessoryEvent;
/// use zway_pump_bridge::state::{Characteristic, CharacteristicValue};
/// use zway_pump_bridge::types::NodeId;
///
/// let event = AccessoryEvent::characteristic_updated(
///     NodeId::new(7),
///     Characteristic::LeakDetected,
///     CharacteristicValue::Bool(true),
/// );
/// assert_eq!(event.node_id(), NodeId::new(7));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum AccessoryEvent {
    /// An accessory was created for a newly discovered outlet.
    Created {
        /// The node of the outlet.
        node_id: NodeId,
        /// Display name of the accessory.
        name: String,
    },

    /// An accessory was destroyed.
    Destroyed {
        /// The node of the outlet.
        node_id: NodeId,
    },

    /// A characteristic took a new value.
    CharacteristicUpdated {
        /// The node of the outlet.
        node_id: NodeId,
        /// The characteristic that changed.
        characteristic: Characteristic,
        /// Its new value.
        value: CharacteristicValue,
    },
}

impl AccessoryEvent {
    /// Returns the node associated with this event.
    #[must_use]
    pub fn node_id(&self) -> NodeId {
        match self {
            Self::Created { node_id, .. }
            | Self::Destroyed { node_id }
            | Self::CharacteristicUpdated { node_id, .. } => *node_id,
        }
    }

    /// Creates a new `Created` event.
    #[must_use]
    pub fn created(node_id: NodeId, name: impl Into<String>) -> Self {
        Self::Created {
            node_id,
            name: name.into(),
        }
    }

    /// Creates a new `Destroyed` event.
    #[must_use]
    pub fn destroyed(node_id: NodeId) -> Self {
        Self::Destroyed { node_id }
    }

    /// Creates a new `CharacteristicUpdated` event.
    #[must_use]
    pub fn characteristic_updated(
        node_id: NodeId,
        characteristic: Characteristic,
        value: CharacteristicValue,
    ) -> Self {
        Self::CharacteristicUpdated {
            node_id,
            characteristic,
            value,
        }
    }
}
