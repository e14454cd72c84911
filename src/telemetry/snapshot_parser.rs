// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parser for the controller's full data snapshot (`ZWaveAPI/Data/0`).

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::command::WATTS_SCALE;
use crate::error::ParseError;
use crate::types::{CommandClassId, NodeId, SwitchLevel};

/// A full point-in-time read of every device known to the controller.
///
/// Devices whose data could not be understood are kept aside in
/// [`rejected`](Self::rejected) so a single misbehaving device does not
/// prevent the others from being updated.
///
/// # Examples
///
/// ```
/// use zway_pump_bridge::telemetry::SnapshotSet;
/// use zway_pump_bridge::types::NodeId;
///
/// let json = r#"{
///     "updateTime": 1700000000,
///     "devices": {
///         "7": {
///             "data": {
///                 "givenName": {"value": "Cistern"},
///                 "vendorString": {"value": "Elexa Consumer Products Inc."},
///                 "deviceTypeString": {"value": "Binary Power Switch"}
///             },
///             "instances": {
///                 "0": {"commandClasses": {"37": {"data": {"level": {"value": 255}}}}}
///             }
///         }
///     }
/// }"#;
///
/// let snapshot = SnapshotSet::from_json(json).unwrap();
/// let device = snapshot.device(NodeId::new(7)).unwrap();
/// assert_eq!(device.given_name(), "Cistern");
/// assert!(device.switch_level(0).unwrap().is_on());
/// ```
#[derive(Debug, Default)]
pub struct SnapshotSet {
    update_time: i64,
    controller_vendor: Option<String>,
    devices: BTreeMap<NodeId, DeviceSnapshot>,
    rejected: Vec<(String, ParseError)>,
}

impl SnapshotSet {
    /// Parses a `Data/0` response body.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the body is not JSON, or lacks the `devices` map
    /// or the `updateTime` stamp. Problems local to one device are collected in
    /// [`rejected`](Self::rejected) instead.
    pub fn from_json(body: &str) -> Result<Self, ParseError> {
        let raw: RawDataResponse = serde_json::from_str(body)?;

        let update_time = raw
            .update_time
            .ok_or_else(|| ParseError::MissingField("updateTime".to_string()))?;
        let raw_devices = raw
            .devices
            .ok_or_else(|| ParseError::MissingField("devices".to_string()))?;

        let controller_vendor = raw
            .controller
            .and_then(|c| c.data.vendor)
            .and_then(|field| field.as_string());

        let mut devices = BTreeMap::new();
        let mut rejected = Vec::new();

        for (key, value) in raw_devices {
            match parse_device(&key, value) {
                Ok(device) => {
                    devices.insert(device.node_id, device);
                }
                Err(e) => rejected.push((key, e)),
            }
        }

        Ok(Self {
            update_time,
            controller_vendor,
            devices,
            rejected,
        })
    }

    /// Returns the controller's clock at the time of the snapshot (epoch seconds).
    #[must_use]
    pub fn update_time(&self) -> i64 {
        self.update_time
    }

    /// Returns the controller vendor, if reported.
    #[must_use]
    pub fn controller_vendor(&self) -> Option<&str> {
        self.controller_vendor.as_deref()
    }

    /// Returns the snapshot of one device.
    #[must_use]
    pub fn device(&self, node_id: NodeId) -> Option<&DeviceSnapshot> {
        self.devices.get(&node_id)
    }

    /// Iterates over all parsed devices in node id order.
    pub fn devices(&self) -> impl Iterator<Item = &DeviceSnapshot> {
        self.devices.values()
    }

    /// Returns the devices that could not be parsed, keyed by their raw id.
    #[must_use]
    pub fn rejected(&self) -> &[(String, ParseError)] {
        &self.rejected
    }

}

/// Immutable record of one device at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSnapshot {
    node_id: NodeId,
    given_name: String,
    vendor: String,
    device_type: String,
    instances: BTreeMap<u8, BTreeMap<CommandClassId, CommandClassData>>,
}

impl DeviceSnapshot {
    /// Creates a snapshot without any command class data.
    #[must_use]
    pub fn new(
        node_id: NodeId,
        given_name: impl Into<String>,
        vendor: impl Into<String>,
        device_type: impl Into<String>,
    ) -> Self {
        Self {
            node_id,
            given_name: given_name.into(),
            vendor: vendor.into(),
            device_type: device_type.into(),
            instances: BTreeMap::new(),
        }
    }

    /// Adds command class data for an instance.
    #[must_use]
    pub fn with_command_class(mut self, instance: u8, data: CommandClassData) -> Self {
        self.instances
            .entry(instance)
            .or_default()
            .insert(data.command_class(), data);
        self
    }

    /// Returns the node id.
    #[must_use]
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Returns the user-assigned name, possibly empty.
    #[must_use]
    pub fn given_name(&self) -> &str {
        &self.given_name
    }

    /// Returns the manufacturer string.
    #[must_use]
    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    /// Returns the device type string.
    #[must_use]
    pub fn device_type(&self) -> &str {
        &self.device_type
    }

    /// Returns the data of one command class of one instance.
    #[must_use]
    pub fn command_class(&self, instance: u8, id: CommandClassId) -> Option<&CommandClassData> {
        self.instances.get(&instance)?.get(&id)
    }

    /// Returns the binary switch data of an instance.
    #[must_use]
    pub fn switch_binary(&self, instance: u8) -> Option<&SwitchBinaryData> {
        match self.command_class(instance, CommandClassId::SwitchBinary)? {
            CommandClassData::SwitchBinary(data) => Some(data),
            _ => None,
        }
    }

    /// Returns the reported binary switch level of an instance.
    #[must_use]
    pub fn switch_level(&self, instance: u8) -> Option<SwitchLevel> {
        self.switch_binary(instance)?.level
    }

    /// Returns one meter reading of an instance.
    #[must_use]
    pub fn meter_reading(&self, instance: u8, scale: u8) -> Option<MeterReading> {
        match self.command_class(instance, CommandClassId::Meter)? {
            CommandClassData::Meter(data) => data.readings.get(&scale).copied(),
            _ => None,
        }
    }
}

/// Typed data of one command class.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandClassData {
    /// Binary switch state.
    SwitchBinary(SwitchBinaryData),
    /// Meter readings.
    Meter(MeterData),
    /// A command class the bridge does not interpret.
    Unsupported(u8),
}

impl CommandClassData {
    /// Returns the command class this data belongs to.
    #[must_use]
    pub fn command_class(&self) -> CommandClassId {
        match self {
            Self::SwitchBinary(_) => CommandClassId::SwitchBinary,
            Self::Meter(_) => CommandClassId::Meter,
            Self::Unsupported(id) => CommandClassId::Other(*id),
        }
    }
}

/// Binary switch command class data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwitchBinaryData {
    /// The last reported level, `None` until the device has reported.
    pub level: Option<SwitchLevel>,
    /// Controller time of the last level report.
    pub update_time: Option<i64>,
}

/// Meter command class data, keyed by scale.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeterData {
    /// Readings per scale.
    pub readings: BTreeMap<u8, MeterReading>,
}

/// One meter reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterReading {
    /// The measured value in the unit of its scale.
    pub value: f64,
    /// Controller time of the reading.
    pub update_time: Option<i64>,
}

// ========== Raw wire shapes ==========

#[derive(Debug, Deserialize)]
struct RawDataResponse {
    #[serde(default)]
    controller: Option<RawController>,
    #[serde(default)]
    devices: Option<BTreeMap<String, Value>>,
    #[serde(rename = "updateTime", default)]
    update_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawController {
    data: RawControllerData,
}

#[derive(Debug, Deserialize)]
struct RawControllerData {
    #[serde(default)]
    vendor: Option<RawField>,
}

/// Z-Way wraps every datum as `{"value": ..., "updateTime": ...}`.
#[derive(Debug, Deserialize)]
struct RawField {
    #[serde(default)]
    value: Value,
    #[serde(rename = "updateTime", default)]
    update_time: Option<i64>,
}

impl RawField {
    fn as_string(&self) -> Option<String> {
        self.value.as_str().map(str::to_string)
    }
}

#[derive(Debug, Deserialize)]
struct RawDevice {
    data: RawDeviceData,
    #[serde(default)]
    instances: BTreeMap<String, RawInstance>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDeviceData {
    #[serde(default)]
    given_name: Option<RawField>,
    #[serde(default)]
    vendor_string: Option<RawField>,
    #[serde(default)]
    device_type_string: Option<RawField>,
}

#[derive(Debug, Deserialize)]
struct RawInstance {
    #[serde(rename = "commandClasses", default)]
    command_classes: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawSwitchBinary {
    data: RawSwitchBinaryData,
}

#[derive(Debug, Deserialize)]
struct RawSwitchBinaryData {
    #[serde(default)]
    level: Option<RawField>,
}

#[derive(Debug, Deserialize)]
struct RawMeter {
    data: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawMeterScale {
    #[serde(default)]
    val: Option<RawField>,
    #[serde(rename = "updateTime", default)]
    update_time: Option<i64>,
}

fn parse_device(key: &str, value: Value) -> Result<DeviceSnapshot, ParseError> {
    let node_id: NodeId = key.parse()?;
    let raw: RawDevice = serde_json::from_value(value)?;

    let text = |field: Option<RawField>| field.and_then(|f| f.as_string()).unwrap_or_default();

    let mut device = DeviceSnapshot::new(
        node_id,
        text(raw.data.given_name),
        text(raw.data.vendor_string),
        text(raw.data.device_type_string),
    );

    for (instance_key, instance) in raw.instances {
        let instance_index = parse_index(&instance_key, "instance")?;
        for (class_key, class_value) in instance.command_classes {
            let Ok(raw_class) = class_key.parse::<u8>() else {
                tracing::warn!(node = %node_id, class = %class_key, "Skipping unknown command class key");
                continue;
            };
            let class_id = CommandClassId::from(raw_class);
            let data = parse_command_class(class_id, class_value)?;
            device = device.with_command_class(instance_index, data);
        }
    }

    Ok(device)
}

fn parse_index(key: &str, field: &str) -> Result<u8, ParseError> {
    key.parse::<u8>().map_err(|e| ParseError::InvalidValue {
        field: field.to_string(),
        message: format!("{key:?}: {e}"),
    })
}

fn parse_command_class(id: CommandClassId, value: Value) -> Result<CommandClassData, ParseError> {
    match id {
        CommandClassId::SwitchBinary => {
            let raw: RawSwitchBinary = serde_json::from_value(value)?;
            let (level, update_time) = match raw.data.level {
                Some(field) => (parse_level(&field.value)?, field.update_time),
                None => (None, None),
            };
            Ok(CommandClassData::SwitchBinary(SwitchBinaryData {
                level,
                update_time,
            }))
        }
        CommandClassId::Meter => {
            let raw: RawMeter = serde_json::from_value(value)?;
            let mut readings = BTreeMap::new();
            // Scales are the numeric keys; the rest are class-level attributes.
            for (key, scale_value) in raw.data {
                let Ok(scale) = key.parse::<u8>() else {
                    continue;
                };
                match parse_meter_scale(scale, scale_value) {
                    Ok(Some(reading)) => {
                        readings.insert(scale, reading);
                    }
                    Ok(None) => {}
                    Err(e) if scale != WATTS_SCALE => {
                        tracing::warn!(scale, error = %e, "Skipping malformed meter scale");
                    }
                    Err(e) => return Err(e),
                }
            }
            Ok(CommandClassData::Meter(MeterData { readings }))
        }
        CommandClassId::Other(raw_id) => Ok(CommandClassData::Unsupported(raw_id)),
    }
}

fn parse_meter_scale(scale: u8, value: Value) -> Result<Option<MeterReading>, ParseError> {
    let scale_data: RawMeterScale = serde_json::from_value(value)?;
    let Some(val) = scale_data.val else {
        return Ok(None);
    };
    if val.value.is_null() {
        return Ok(None);
    }
    let reading = val.value.as_f64().ok_or_else(|| ParseError::InvalidValue {
        field: format!("meter scale {scale}"),
        message: format!("expected a number, got {}", val.value),
    })?;
    Ok(Some(MeterReading {
        value: reading,
        update_time: val.update_time.or(scale_data.update_time),
    }))
}

fn parse_level(value: &Value) -> Result<Option<SwitchLevel>, ParseError> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(on) => Ok(Some(SwitchLevel::from(*on))),
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u16::try_from(n).ok())
            .map(|n| Some(SwitchLevel::new(n)))
            .ok_or_else(|| ParseError::InvalidValue {
                field: "switch level".to_string(),
                message: format!("{n} is not a valid level"),
            }),
        other => Err(ParseError::InvalidValue {
            field: "switch level".to_string(),
            message: format!("expected a number or boolean, got {other}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pump_json(level: &str, watts: &str) -> String {
        format!(
            r#"{{
                "controller": {{"data": {{"vendor": {{"value": "RaZberry"}}}}}},
                "updateTime": 1700000100,
                "devices": {{
                    "1": {{
                        "data": {{
                            "givenName": {{"value": ""}},
                            "vendorString": {{"value": "Z-Wave.Me"}},
                            "deviceTypeString": {{"value": "Static PC Controller"}}
                        }},
                        "instances": {{"0": {{"commandClasses": {{}}}}}}
                    }},
                    "7": {{
                        "data": {{
                            "givenName": {{"value": "Well pump"}},
                            "vendorString": {{"value": "Elexa Consumer Products Inc."}},
                            "deviceTypeString": {{"value": "Binary Power Switch"}}
                        }},
                        "instances": {{
                            "0": {{
                                "commandClasses": {{
                                    "37": {{"data": {{"level": {{"value": {level}, "updateTime": 1700000050}}}}}},
                                    "50": {{"data": {{
                                        "sensorType": {{"value": 1}},
                                        "0": {{"val": {{"value": 12.5, "updateTime": 1700000000}}}},
                                        "2": {{"val": {{"value": {watts}, "updateTime": 1700000090}}}}
                                    }}}},
                                    "112": {{"data": {{}}}}
                                }}
                            }}
                        }}
                    }}
                }}
            }}"#
        )
    }

    #[test]
    fn parses_controller_fields() {
        let set = SnapshotSet::from_json(&pump_json("255", "2.0")).unwrap();
        assert_eq!(set.update_time(), 1_700_000_100);
        assert_eq!(set.controller_vendor(), Some("RaZberry"));
        assert_eq!(set.devices().count(), 2);
        assert!(set.rejected().is_empty());
    }

    #[test]
    fn parses_switch_and_meter() {
        let set = SnapshotSet::from_json(&pump_json("255", "2.0")).unwrap();
        let pump = set.device(NodeId::new(7)).unwrap();

        assert_eq!(pump.vendor(), "Elexa Consumer Products Inc.");
        assert_eq!(pump.device_type(), "Binary Power Switch");
        assert_eq!(pump.switch_level(0), Some(SwitchLevel::ON));
        assert_eq!(pump.switch_binary(0).unwrap().update_time, Some(1_700_000_050));

        let watts = pump.meter_reading(0, 2).unwrap();
        assert!((watts.value - 2.0).abs() < f64::EPSILON);
        assert_eq!(watts.update_time, Some(1_700_000_090));
        assert!(pump.meter_reading(0, 0).is_some());
        assert!(pump.meter_reading(0, 4).is_none());

        assert_eq!(
            pump.command_class(0, CommandClassId::Other(112)),
            Some(&CommandClassData::Unsupported(112))
        );
    }

    #[test]
    fn boolean_level_maps_to_switch_level() {
        let set = SnapshotSet::from_json(&pump_json("false", "0")).unwrap();
        let pump = set.device(NodeId::new(7)).unwrap();
        assert_eq!(pump.switch_level(0), Some(SwitchLevel::OFF));
    }

    #[test]
    fn null_level_is_unknown() {
        let set = SnapshotSet::from_json(&pump_json("null", "0")).unwrap();
        let pump = set.device(NodeId::new(7)).unwrap();
        assert_eq!(pump.switch_level(0), None);
    }

    #[test]
    fn malformed_device_is_rejected_alone() {
        let set = SnapshotSet::from_json(&pump_json(r#""on""#, "1")).unwrap();
        assert!(set.device(NodeId::new(7)).is_none());
        assert!(set.device(NodeId::new(1)).is_some());
        assert_eq!(set.rejected().len(), 1);
        assert_eq!(set.rejected()[0].0, "7");
    }

    #[test]
    fn non_numeric_meter_value_is_rejected() {
        let set = SnapshotSet::from_json(&pump_json("255", r#""lots""#)).unwrap();
        assert!(matches!(
            set.rejected()[0].1,
            ParseError::InvalidValue { .. }
        ));
    }

    #[test]
    fn malformed_secondary_scale_is_skipped() {
        let json = pump_json("255", "1.0").replace("12.5", r#""n/a""#);
        let set = SnapshotSet::from_json(&json).unwrap();
        assert!(set.rejected().is_empty());

        let pump = set.device(NodeId::new(7)).unwrap();
        assert!(pump.meter_reading(0, 0).is_none());
        let watts = pump.meter_reading(0, 2).unwrap();
        assert!((watts.value - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn non_numeric_class_key_is_skipped() {
        let json = pump_json("255", "1.0").replace(r#""112": "#, r#""extra": "#);
        let set = SnapshotSet::from_json(&json).unwrap();
        assert!(set.rejected().is_empty());
        let pump = set.device(NodeId::new(7)).unwrap();
        assert_eq!(pump.switch_level(0), Some(SwitchLevel::ON));
    }

    #[test]
    fn missing_update_time_fails_whole_snapshot() {
        let result = SnapshotSet::from_json(r#"{"devices": {}}"#);
        assert!(matches!(result, Err(ParseError::MissingField(f)) if f == "updateTime"));
    }

    #[test]
    fn missing_devices_fails_whole_snapshot() {
        let result = SnapshotSet::from_json(r#"{"updateTime": 1}"#);
        assert!(matches!(result, Err(ParseError::MissingField(f)) if f == "devices"));
    }

    #[test]
    fn invalid_json_fails() {
        assert!(matches!(
            SnapshotSet::from_json("<html>"),
            Err(ParseError::Json(_))
        ));
    }

    #[test]
    fn non_numeric_device_key_is_rejected() {
        let set = SnapshotSet::from_json(
            r#"{"updateTime": 1, "devices": {"abc": {"data": {}}}}"#,
        )
        .unwrap();
        assert_eq!(set.devices().count(), 0);
        assert_eq!(set.rejected().len(), 1);
    }
}
