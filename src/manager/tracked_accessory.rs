// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! An accessory tracked by the bridge.

use serde::{Deserialize, Serialize};

use crate::state::AccessoryState;
use crate::types::NodeId;

/// One outlet accessory and its state.
///
/// This is also the form in which the host persists accessories between
/// runs and hands them back through
/// [`Bridge::restore_accessory`](super::Bridge::restore_accessory).
///
/// # Examples
///
/// ```
/// use zway_pump_bridge::manager::TrackedAccessory;
///
/// let cached: TrackedAccessory = serde_json::from_str(
///     r#"{"nodeId": 7, "name": "Cistern", "isOn": true, "isEmpty": false}"#,
/// ).unwrap();
/// assert!(cached.state().is_on());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedAccessory {
    node_id: NodeId,
    name: String,
    #[serde(flatten)]
    state: AccessoryState,
}

impl TrackedAccessory {
    /// Creates a freshly discovered accessory.
    #[must_use]
    pub fn new(node_id: NodeId, name: impl Into<String>) -> Self {
        Self::with_state(node_id, name, AccessoryState::new())
    }

    /// Creates an accessory with a known state.
    #[must_use]
    pub fn with_state(node_id: NodeId, name: impl Into<String>, state: AccessoryState) -> Self {
        Self {
            node_id,
            name: name.into(),
            state,
        }
    }

    /// Returns the node of the outlet.
    #[must_use]
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the accessory state.
    #[must_use]
    pub fn state(&self) -> &AccessoryState {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut AccessoryState {
        &mut self.state
    }
}
