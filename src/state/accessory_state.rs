// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tracked state of one outlet accessory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Characteristic, CharacteristicValue, StateChange};
use crate::telemetry::Interpretation;

/// The bridge's durable view of one outlet.
///
/// `last_power_change` is `None` until the bridge commands a power change,
/// which means the debounce window is considered elapsed.
///
/// # Examples
///
/// ```
/// use zway_pump_bridge::state::{AccessoryState, StateChange};
/// use zway_pump_bridge::telemetry::Interpretation;
///
/// let mut state = AccessoryState::new();
/// let changes = state.apply(&Interpretation {
///     is_on: true,
///     is_empty: false,
///     shutoff_required: false,
/// });
///
/// assert_eq!(changes, vec![StateChange::Active(true), StateChange::InUse(true)]);
/// assert!(state.is_on());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessoryState {
    is_on: bool,
    is_empty: bool,
    #[serde(default)]
    last_power_change: Option<DateTime<Utc>>,
}

impl AccessoryState {
    /// Creates the state of a freshly created accessory: off, not empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a previously persisted state.
    #[must_use]
    pub fn restored(
        is_on: bool,
        is_empty: bool,
        last_power_change: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            is_on,
            is_empty,
            last_power_change,
        }
    }

    /// Returns `true` if the outlet is switched on.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.is_on
    }

    /// Returns `true` if the tank was inferred to be empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.is_empty
    }

    /// Returns when the bridge last commanded a power change.
    #[must_use]
    pub fn last_power_change(&self) -> Option<DateTime<Utc>> {
        self.last_power_change
    }

    /// Records a commanded power change, re-arming the debounce window.
    pub fn record_power_change(&mut self, at: DateTime<Utc>) {
        self.last_power_change = Some(at);
    }

    /// Returns the current value of a characteristic.
    #[must_use]
    pub fn characteristic(&self, characteristic: Characteristic) -> CharacteristicValue {
        match characteristic {
            Characteristic::Active | Characteristic::InUse => self.is_on.into(),
            Characteristic::LeakDetected => self.is_empty.into(),
            Characteristic::ValveType => CharacteristicValue::VALVE_TYPE_GENERIC,
        }
    }

    /// Applies derived telemetry and returns the characteristics that changed.
    pub fn apply(&mut self, interpretation: &Interpretation) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if self.is_on != interpretation.is_on {
            self.is_on = interpretation.is_on;
            changes.push(StateChange::Active(self.is_on));
            changes.push(StateChange::InUse(self.is_on));
        }

        if self.is_empty != interpretation.is_empty {
            self.is_empty = interpretation.is_empty;
            changes.push(StateChange::LeakDetected(self.is_empty));
        }

        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interpretation(is_on: bool, is_empty: bool) -> Interpretation {
        Interpretation {
            is_on,
            is_empty,
            shutoff_required: is_on && is_empty,
        }
    }

    #[test]
    fn apply_same_values_reports_nothing() {
        let mut state = AccessoryState::new();
        assert!(state.apply(&interpretation(false, false)).is_empty());
    }

    #[test]
    fn apply_reports_leak_change() {
        let mut state = AccessoryState::restored(true, false, None);
        let changes = state.apply(&interpretation(true, true));
        assert_eq!(changes, vec![StateChange::LeakDetected(true)]);
        assert!(state.is_empty());
    }

    #[test]
    fn switching_off_clears_both() {
        let mut state = AccessoryState::restored(true, true, None);
        let changes = state.apply(&interpretation(false, false));
        assert_eq!(
            changes,
            vec![
                StateChange::Active(false),
                StateChange::InUse(false),
                StateChange::LeakDetected(false),
            ]
        );
    }

    #[test]
    fn characteristic_values() {
        let state = AccessoryState::restored(true, false, None);
        assert_eq!(
            state.characteristic(Characteristic::InUse),
            CharacteristicValue::Bool(true)
        );
        assert_eq!(
            state.characteristic(Characteristic::ValveType),
            CharacteristicValue::UInt(0)
        );
    }

    #[test]
    fn persisted_form_uses_camel_case() {
        let state = AccessoryState::restored(true, false, None);
        let json = serde_json::to_value(state).unwrap();
        assert_eq!(json["isOn"], true);
        assert_eq!(json["isEmpty"], false);
        let back: AccessoryState =
            serde_json::from_str(r#"{"isOn": false, "isEmpty": true}"#).unwrap();
        assert!(back.is_empty());
        assert_eq!(back.last_power_change(), None);
    }
}
