// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Accessory characteristics exposed for a pump outlet.

use std::fmt;

/// A characteristic of the valve or leak sensor service of an outlet accessory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Characteristic {
    /// Valve active (writable): the outlet is switched on.
    Active,
    /// Valve in use: mirrors [`Characteristic::Active`].
    InUse,
    /// Valve type, always generic.
    ValveType,
    /// Leak sensor: the tank is empty.
    LeakDetected,
}

impl Characteristic {
    /// Returns the characteristic name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::InUse => "InUse",
            Self::ValveType => "ValveType",
            Self::LeakDetected => "LeakDetected",
        }
    }

    /// Returns `true` if the characteristic accepts set events.
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value carried by a characteristic update or set event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacteristicValue {
    /// Boolean value.
    Bool(bool),
    /// Small integer value (enumerations, 0/1 flags).
    UInt(u8),
}

impl CharacteristicValue {
    /// Generic valve type.
    pub const VALVE_TYPE_GENERIC: Self = Self::UInt(0);

    /// Interprets the value as a flag; any non-zero integer is `true`.
    #[must_use]
    pub const fn as_bool(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::UInt(n) => *n != 0,
        }
    }
}

impl From<bool> for CharacteristicValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl fmt::Display for CharacteristicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::UInt(n) => write!(f, "{n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_active_is_writable() {
        assert!(Characteristic::Active.is_writable());
        assert!(!Characteristic::InUse.is_writable());
        assert!(!Characteristic::ValveType.is_writable());
        assert!(!Characteristic::LeakDetected.is_writable());
    }

    #[test]
    fn integer_values_act_as_flags() {
        assert!(CharacteristicValue::UInt(1).as_bool());
        assert!(!CharacteristicValue::UInt(0).as_bool());
        assert!(CharacteristicValue::from(true).as_bool());
    }
}
