// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared across the bridge.
//!
//! # Types
//!
//! - [`NodeId`] - Stable identifier of a Z-Wave device
//! - [`CommandClassId`] - Z-Wave command class (binary switch, meter, ...)
//! - [`SwitchLevel`] - Binary switch level (0 = off, non-zero = on)

mod command_class;
mod node_id;
mod switch_level;

pub use command_class::CommandClassId;
pub use node_id::NodeId;
pub use switch_level::SwitchLevel;
