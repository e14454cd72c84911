// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Z-Wave node identifier.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Stable numeric identifier of one physical Z-Wave device on the controller.
///
/// The controller keys its device map by the decimal string form of the id,
/// so `NodeId` parses from and formats to that representation.
///
/// # Examples
///
/// ```
/// use zway_pump_bridge::types::NodeId;
///
/// let id: NodeId = "7".parse().unwrap();
/// assert_eq!(id.value(), 7);
/// assert_eq!(id.to_string(), "#7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u16);

impl NodeId {
    /// Creates a node id from its numeric value.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u16>()
            .map(Self)
            .map_err(|e| ParseError::InvalidValue {
                field: "node id".to_string(),
                message: format!("{s:?}: {e}"),
            })
    }
}

impl From<u16> for NodeId {
    fn from(value: u16) -> Self {
        Self(value)
    }
}
