// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Meter commands.

use crate::command::Command;
use crate::types::CommandClassId;

/// Meter scale carrying the instantaneous power draw in watts.
pub const WATTS_SCALE: u8 = 2;

/// Command for the meter command class.
///
/// # Examples
///
/// ```
/// use zway_pump_bridge::command::{Command, MeterCommand};
///
/// let cmd = MeterCommand::watts();
/// assert_eq!(cmd.invocation(), "Get(2)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeterCommand {
    /// Ask the device to report the reading of one scale.
    Get {
        /// The meter scale to refresh.
        scale: u8,
    },
}

impl MeterCommand {
    /// Creates a query for the wattage reading.
    #[must_use]
    pub const fn watts() -> Self {
        Self::Get { scale: WATTS_SCALE }
    }
}

impl Command for MeterCommand {
    fn command_class(&self) -> CommandClassId {
        CommandClassId::Meter
    }

    fn action(&self) -> &'static str {
        "Get"
    }

    fn argument(&self) -> Option<String> {
        match self {
            Self::Get { scale } => Some(scale.to_string()),
        }
    }
}
