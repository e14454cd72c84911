// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State change representation.
//!
//! A [`StateChange`] is one characteristic that took a new value while
//! applying derived telemetry to an [`AccessoryState`](super::AccessoryState).
//! The bridge forwards each change to the accessory sink.

use super::{Characteristic, CharacteristicValue};

/// Represents a change of one published characteristic.
///
/// # Examples
///
/// ```
/// use zway_pump_bridge::state::{Characteristic, CharacteristicValue, StateChange};
///
/// let change = StateChange::LeakDetected(true);
/// assert_eq!(change.characteristic(), Characteristic::LeakDetected);
/// assert_eq!(change.value(), CharacteristicValue::Bool(true));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    /// The outlet was switched on or off.
    Active(bool),
    /// The valve started or stopped being in use.
    InUse(bool),
    /// The empty condition was raised or cleared.
    LeakDetected(bool),
}

impl StateChange {
    /// Returns the characteristic that changed.
    #[must_use]
    pub const fn characteristic(&self) -> Characteristic {
        match self {
            Self::Active(_) => Characteristic::Active,
            Self::InUse(_) => Characteristic::InUse,
            Self::LeakDetected(_) => Characteristic::LeakDetected,
        }
    }

    /// Returns the new value.
    #[must_use]
    pub const fn value(&self) -> CharacteristicValue {
        match self {
            Self::Active(v) | Self::InUse(v) | Self::LeakDetected(v) => CharacteristicValue::Bool(*v),
        }
    }
}
