// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Z-Wave command class identifiers.

use std::fmt;

/// Identifier of a Z-Wave command class.
///
/// Only the classes needed to drive a pump outlet are named; everything else
/// is carried as [`CommandClassId::Other`] so snapshots stay lossless.
///
/// # Examples
///
/// ```
/// use zway_pump_bridge::types::CommandClassId;
///
/// assert_eq!(CommandClassId::from(37), CommandClassId::SwitchBinary);
/// assert_eq!(CommandClassId::Meter.value(), 50);
/// assert_eq!(CommandClassId::from(112), CommandClassId::Other(112));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommandClassId {
    /// Binary switch (`0x25`).
    SwitchBinary,
    /// Meter (`0x32`).
    Meter,
    /// Any other command class.
    Other(u8),
}

impl CommandClassId {
    /// Returns the numeric command class id.
    #[must_use]
    pub const fn value(&self) -> u8 {
        match self {
            Self::SwitchBinary => 37,
            Self::Meter => 50,
            Self::Other(id) => *id,
        }
    }
}

impl From<u8> for CommandClassId {
    fn from(value: u8) -> Self {
        match value {
            37 => Self::SwitchBinary,
            50 => Self::Meter,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for CommandClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}
