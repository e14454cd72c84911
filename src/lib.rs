// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Z-Way pump outlet bridge.
//!
//! This library polls a Z-Way home-automation controller for Z-Wave pump
//! outlets and republishes them as smart-home valve accessories with a leak
//! sensor reporting an empty tank. When a running pump draws less power than
//! a threshold, the bridge switches it off.
//!
//! # Features
//!
//! - **Session management**: persisted, validated and renewed controller sessions
//! - **Discovery**: supported outlets are reconciled with cached accessories
//! - **Dry-run protection**: debounced empty detection and automatic shutoff
//! - **Throttled polling**: startup anti-flood window and in-flight query deduplication
//!
//! # Cargo features
//!
//! - `http` (default): the [`ZWayClient`](protocol::ZWayClient) HTTP controller client
//!
//! # Quick Start
//!
//! ```no_run
//! use zway_pump_bridge::event::EventBus;
//! use zway_pump_bridge::manager::{Bridge, BridgeConfig};
//!
//! #[tokio::main]
//! async fn main() -> zway_pump_bridge::Result<()> {
//!     let config = BridgeConfig::new("http://192.168.1.20:8083")
//!         .with_credentials("admin", "secret")
//!         .with_threshold_wattage(5.0);
//!     config.validate()?;
//!
//!     let client = config.controller_config().into_client(config.session_store())?;
//!     let mut bridge = Bridge::new(config, client, EventBus::new());
//!     bridge.run().await;
//!     Ok(())
//! }
//! ```
//!
//! # Logging
//!
//! Diagnostics are emitted through [`tracing`]. The library never installs
//! a subscriber.

pub mod command;
pub mod error;
pub mod event;
pub mod manager;
pub mod poll;
pub mod protocol;
pub mod state;
pub mod telemetry;
pub mod types;

pub use command::{Command, MeterCommand, RunCommand, SwitchBinaryCommand};
pub use error::{AuthError, ConfigError, Error, ParseError, Result, TransportError};
pub use event::{AccessoryEvent, AccessorySink, EventBus};
pub use manager::{Bridge, BridgeConfig, BridgeHandle, TrackedAccessory};
pub use protocol::{ControllerClient, SessionState};
#[cfg(feature = "http")]
pub use protocol::{ZWayClient, ZWayConfig};
pub use types::{CommandClassId, NodeId, SwitchLevel};
