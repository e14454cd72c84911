// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Derivation of the visible outlet state from raw command class readings.

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::DeviceSnapshot;
use crate::command::WATTS_SCALE;
use crate::error::ParseError;
use crate::state::AccessoryState;

/// Time after a commanded power change during which the meter is not trusted.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_secs(30);

/// Instance carrying the switch and meter of a pump outlet.
pub const OUTLET_INSTANCE: u8 = 0;

/// Externally visible state derived from one device snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interpretation {
    /// The switch level is non-zero.
    pub is_on: bool,
    /// The outlet is on, settled, and draws less than the threshold.
    pub is_empty: bool,
    /// The outlet must be switched off to protect the pump.
    pub shutoff_required: bool,
}

/// Derives the outlet state from a snapshot.
///
/// An outlet that is off is never empty. An outlet that is on is empty only
/// once [`DEBOUNCE_WINDOW`] has elapsed since the last commanded power change
/// and its wattage is below `threshold_watts`. An accessory that never had a
/// commanded power change is considered settled.
///
/// # Errors
///
/// Returns [`ParseError::MissingField`] if the snapshot has no switch level,
/// or has no wattage reading when one is needed to decide.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use zway_pump_bridge::state::AccessoryState;
/// use zway_pump_bridge::telemetry::{
///     interpret, CommandClassData, DeviceSnapshot, MeterData, MeterReading, SwitchBinaryData,
/// };
/// use zway_pump_bridge::types::{NodeId, SwitchLevel};
///
/// let mut meter = MeterData::default();
/// meter.readings.insert(2, MeterReading { value: 2.0, update_time: None });
/// let device = DeviceSnapshot::new(NodeId::new(7), "Cistern", "", "")
///     .with_command_class(0, CommandClassData::SwitchBinary(SwitchBinaryData {
///         level: Some(SwitchLevel::ON),
///         update_time: None,
///     }))
///     .with_command_class(0, CommandClassData::Meter(meter));
///
/// let now = Utc::now();
/// let state = AccessoryState::restored(true, false, Some(now - Duration::seconds(40)));
/// let derived = interpret(&state, &device, 5.0, now).unwrap();
/// assert!(derived.is_empty);
/// assert!(derived.shutoff_required);
/// ```
pub fn interpret(
    accessory: &AccessoryState,
    device: &DeviceSnapshot,
    threshold_watts: f64,
    now: DateTime<Utc>,
) -> Result<Interpretation, ParseError> {
    let level = device
        .switch_level(OUTLET_INSTANCE)
        .ok_or_else(|| ParseError::MissingField("switch level".to_string()))?;
    let is_on = level.is_on();

    let is_empty = if is_on && debounce_elapsed(accessory, now) {
        let watts = device
            .meter_reading(OUTLET_INSTANCE, WATTS_SCALE)
            .ok_or_else(|| ParseError::MissingField("meter wattage".to_string()))?;
        watts.value < threshold_watts
    } else {
        false
    };

    Ok(Interpretation {
        is_on,
        is_empty,
        shutoff_required: is_on && is_empty,
    })
}

fn debounce_elapsed(accessory: &AccessoryState, now: DateTime<Utc>) -> bool {
    match accessory.last_power_change() {
        None => true,
        // A change recorded in the future is still inside the window.
        Some(changed) => (now - changed)
            .to_std()
            .is_ok_and(|since| since >= DEBOUNCE_WINDOW),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::telemetry::{CommandClassData, MeterData, MeterReading, SwitchBinaryData};
    use crate::types::{NodeId, SwitchLevel};

    fn outlet(level: Option<SwitchLevel>, watts: Option<f64>) -> DeviceSnapshot {
        let mut device = DeviceSnapshot::new(
            NodeId::new(7),
            "Cistern",
            "Elexa Consumer Products Inc.",
            "Binary Power Switch",
        )
        .with_command_class(
            0,
            CommandClassData::SwitchBinary(SwitchBinaryData {
                level,
                update_time: Some(1_700_000_000),
            }),
        );
        if let Some(value) = watts {
            let mut meter = MeterData::default();
            meter.readings.insert(
                WATTS_SCALE,
                MeterReading {
                    value,
                    update_time: Some(1_700_000_000),
                },
            );
            device = device.with_command_class(0, CommandClassData::Meter(meter));
        }
        device
    }

    fn changed_ago(now: DateTime<Utc>, secs: i64) -> AccessoryState {
        AccessoryState::restored(true, false, Some(now - Duration::seconds(secs)))
    }

    #[test]
    fn off_is_never_empty() {
        let now = Utc::now();
        for watts in [0.0, 2.0, 500.0] {
            let derived = interpret(
                &changed_ago(now, 3600),
                &outlet(Some(SwitchLevel::OFF), Some(watts)),
                5.0,
                now,
            )
            .unwrap();
            assert!(!derived.is_on);
            assert!(!derived.is_empty);
            assert!(!derived.shutoff_required);
        }
    }

    #[test]
    fn off_without_meter_is_fine() {
        let now = Utc::now();
        let derived = interpret(
            &AccessoryState::new(),
            &outlet(Some(SwitchLevel::OFF), None),
            5.0,
            now,
        )
        .unwrap();
        assert!(!derived.is_on);
    }

    #[test]
    fn debounce_suppresses_empty() {
        let now = Utc::now();
        let derived = interpret(
            &changed_ago(now, 10),
            &outlet(Some(SwitchLevel::ON), Some(0.0)),
            5.0,
            now,
        )
        .unwrap();
        assert!(derived.is_on);
        assert!(!derived.is_empty);
        assert!(!derived.shutoff_required);
    }

    #[test]
    fn settled_low_draw_requires_shutoff() {
        let now = Utc::now();
        let derived = interpret(
            &changed_ago(now, 40),
            &outlet(Some(SwitchLevel::ON), Some(2.0)),
            5.0,
            now,
        )
        .unwrap();
        assert_eq!(
            derived,
            Interpretation {
                is_on: true,
                is_empty: true,
                shutoff_required: true,
            }
        );
    }

    #[test]
    fn settled_normal_draw_is_running() {
        let now = Utc::now();
        let derived = interpret(
            &changed_ago(now, 40),
            &outlet(Some(SwitchLevel::new(99)), Some(350.0)),
            5.0,
            now,
        )
        .unwrap();
        assert!(derived.is_on);
        assert!(!derived.is_empty);
    }

    #[test]
    fn window_boundary_is_elapsed() {
        let now = Utc::now();
        let derived = interpret(
            &changed_ago(now, 30),
            &outlet(Some(SwitchLevel::ON), Some(1.0)),
            5.0,
            now,
        )
        .unwrap();
        assert!(derived.is_empty);
    }

    #[test]
    fn never_changed_counts_as_settled() {
        let now = Utc::now();
        let derived = interpret(
            &AccessoryState::new(),
            &outlet(Some(SwitchLevel::ON), Some(2.0)),
            5.0,
            now,
        )
        .unwrap();
        assert!(derived.shutoff_required);
    }

    #[test]
    fn missing_level_is_malformed() {
        let now = Utc::now();
        let err = interpret(&AccessoryState::new(), &outlet(None, Some(2.0)), 5.0, now).unwrap_err();
        assert!(matches!(err, ParseError::MissingField(_)));
    }

    #[test]
    fn missing_meter_when_needed_is_malformed() {
        let now = Utc::now();
        let err = interpret(
            &AccessoryState::new(),
            &outlet(Some(SwitchLevel::ON), None),
            5.0,
            now,
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::MissingField(_)));
    }
}
