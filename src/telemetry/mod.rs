// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Controller telemetry: snapshot parsing and state derivation.
//!
//! The controller exposes its whole device tree through `ZWaveAPI/Data/0`.
//! [`SnapshotSet::from_json`] turns that body into typed [`DeviceSnapshot`]s
//! keyed by node id, and [`interpret`] derives the outlet state (on, empty,
//! shutoff required) of one device.
//!
//! # Examples
//!
//! ```
//! use zway_pump_bridge::telemetry::SnapshotSet;
//!
//! let snapshot = SnapshotSet::from_json(r#"{"updateTime": 12, "devices": {}}"#).unwrap();
//! assert_eq!(snapshot.update_time(), 12);
//! assert_eq!(snapshot.devices().count(), 0);
//! ```

mod interpreter;
mod snapshot_parser;

pub use interpreter::{DEBOUNCE_WINDOW, Interpretation, OUTLET_INSTANCE, interpret};
pub use snapshot_parser::{
    CommandClassData, DeviceSnapshot, MeterData, MeterReading, SnapshotSet, SwitchBinaryData,
};
