// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Accessory state management types.
//!
//! [`AccessoryState`] is what the bridge remembers about one outlet between
//! poll cycles. Applying derived telemetry to it yields the [`StateChange`]s
//! that must be published as [`Characteristic`] updates.
//!
//! # Examples
//!
//! ```
//! use zway_pump_bridge::state::{AccessoryState, Characteristic, CharacteristicValue};
//!
//! let state = AccessoryState::new();
//! assert_eq!(
//!     state.characteristic(Characteristic::Active),
//!     CharacteristicValue::Bool(false)
//! );
//! ```

mod accessory_state;
mod characteristic;
mod state_change;

pub use accessory_state::AccessoryState;
pub use characteristic::{Characteristic, CharacteristicValue};
pub use state_change::StateChange;
