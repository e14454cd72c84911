// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The bridge engine and its configuration.
//!
//! # Overview
//!
//! A [`Bridge`] owns the tracked outlet accessories. On start it discovers
//! the supported outlets on the controller and [`reconcile`]s them with the
//! accessories the host restored. Then it polls:
//!
//! 1. fetch a full snapshot,
//! 2. re-query actively polled outlets, throttled by the
//!    [`PollScheduler`](crate::poll::PollScheduler),
//! 3. derive each outlet's state and publish what changed,
//! 4. switch off pumps that run dry.
//!
//! Set events from the accessory framework reach the loop through a
//! [`BridgeHandle`].
//!
//! # Examples
//!
//! ```no_run
//! use zway_pump_bridge::event::{AccessoryEvent, EventBus};
//! use zway_pump_bridge::manager::{Bridge, BridgeConfig};
//! use zway_pump_bridge::state::{Characteristic, CharacteristicValue};
//!
//! #[tokio::main]
//! async fn main() -> zway_pump_bridge::Result<()> {
//!     let config = BridgeConfig::load("zway-pump.json")?;
//!     let client = config.controller_config().into_client(config.session_store())?;
//!     let events = EventBus::new();
//!     let mut rx = events.subscribe();
//!
//!     let mut bridge = Bridge::new(config, client, events);
//!     let handle = bridge.handle();
//!
//!     let host = async move {
//!         while let Ok(event) = rx.recv().await {
//!             if let AccessoryEvent::Created { node_id, .. } = event {
//!                 // Switch every new outlet on.
//!                 let _ = handle
//!                     .set_characteristic(node_id, Characteristic::Active, CharacteristicValue::Bool(true))
//!                     .await;
//!             }
//!         }
//!     };
//!
//!     tokio::join!(bridge.run(), host);
//!     Ok(())
//! }
//! ```

mod bridge;
mod config;
mod reconciler;
mod tracked_accessory;

pub use bridge::{Bridge, BridgeCommand, BridgeHandle, INITIAL_DELAY};
pub use config::{BridgeConfig, MAX_POLL_INTERVAL};
pub use reconciler::{
    DEFAULT_ACCESSORY_NAME, Delta, ReconcileMode, SUPPORTED_DEVICE_TYPE, SUPPORTED_VENDOR,
    display_name, is_supported_device, reconcile,
};
pub use tracked_accessory::TrackedAccessory;
