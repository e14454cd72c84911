// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Binary switch level.

use std::fmt;

/// Level reported or commanded through the binary switch command class.
///
/// Z-Wave uses `0` for off and `255` for on; some firmwares report other
/// non-zero values, which also count as on.
///
/// # Examples
///
/// ```
/// use zway_pump_bridge::types::SwitchLevel;
///
/// assert!(SwitchLevel::ON.is_on());
/// assert!(!SwitchLevel::OFF.is_on());
/// assert_eq!(SwitchLevel::from(true), SwitchLevel::ON);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SwitchLevel(u16);

impl SwitchLevel {
    /// Switch is off.
    pub const OFF: Self = Self(0);
    /// Switch is on.
    pub const ON: Self = Self(255);

    /// Creates a level from its raw value.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn value(&self) -> u16 {
        self.0
    }

    /// Returns `true` for any non-zero level.
    #[must_use]
    pub const fn is_on(&self) -> bool {
        self.0 != 0
    }
}

impl From<bool> for SwitchLevel {
    fn from(on: bool) -> Self {
        if on { Self::ON } else { Self::OFF }
    }
}

impl fmt::Display for SwitchLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
