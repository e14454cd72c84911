// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Binary switch commands.

use crate::command::Command;
use crate::types::{CommandClassId, SwitchLevel};

/// Command for the binary switch command class.
///
/// # Examples
///
/// ```
/// use zway_pump_bridge::command::{Command, SwitchBinaryCommand};
///
/// let off = SwitchBinaryCommand::off();
/// assert_eq!(off.invocation(), "Set(0)");
///
/// let query = SwitchBinaryCommand::Get;
/// assert_eq!(query.invocation(), "Get()");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchBinaryCommand {
    /// Ask the device to report its current level.
    Get,
    /// Drive the switch to a level.
    Set(SwitchLevel),
}

impl SwitchBinaryCommand {
    /// Creates a command to switch the outlet on.
    #[must_use]
    pub const fn on() -> Self {
        Self::Set(SwitchLevel::ON)
    }

    /// Creates a command to switch the outlet off.
    #[must_use]
    pub const fn off() -> Self {
        Self::Set(SwitchLevel::OFF)
    }
}

impl From<bool> for SwitchBinaryCommand {
    fn from(on: bool) -> Self {
        Self::Set(SwitchLevel::from(on))
    }
}

impl Command for SwitchBinaryCommand {
    fn command_class(&self) -> CommandClassId {
        CommandClassId::SwitchBinary
    }

    fn action(&self) -> &'static str {
        match self {
            Self::Get => "Get",
            Self::Set(_) => "Set",
        }
    }

    fn argument(&self) -> Option<String> {
        match self {
            Self::Get => None,
            Self::Set(level) => Some(level.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_from_bool() {
        assert_eq!(SwitchBinaryCommand::from(true), SwitchBinaryCommand::on());
        assert_eq!(SwitchBinaryCommand::from(false).argument(), Some("0".to_string()));
        assert_eq!(SwitchBinaryCommand::on().invocation(), "Set(255)");
    }

    #[test]
    fn get_has_no_argument() {
        assert_eq!(SwitchBinaryCommand::Get.argument(), None);
        assert_eq!(
            SwitchBinaryCommand::Get.command_class(),
            CommandClassId::SwitchBinary
        );
    }
}
