// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Z-Wave command definitions.
//!
//! Commands are typed per command class and lowered to a [`RunCommand`], the
//! addressed form the controller understands.
//!
//! # Available Commands
//!
//! | Command Type | Command class | Example |
//! |-------------|---------------|---------|
//! | [`SwitchBinaryCommand`] | Binary switch (37) | `Set(255)`, `Get()` |
//! | [`MeterCommand`] | Meter (50) | `Get(2)` |
//!
//! # Examples
//!
//! ```
//! use zway_pump_bridge::command::{RunCommand, SwitchBinaryCommand};
//! use zway_pump_bridge::types::NodeId;
//!
//! let run = RunCommand::new(NodeId::new(7), 0, &SwitchBinaryCommand::off());
//! assert_eq!(
//!     run.run_path(),
//!     "devices[7].instances[0].commandClasses[37].Set(0)"
//! );
//! ```

mod meter;
mod switch_binary;

pub use meter::{MeterCommand, WATTS_SCALE};
pub use switch_binary::SwitchBinaryCommand;

use std::fmt;

use crate::types::{CommandClassId, NodeId};

/// A command addressed to a command class of a device instance.
pub trait Command {
    /// Returns the command class the command belongs to.
    fn command_class(&self) -> CommandClassId;

    /// Returns the action verb, e.g. `"Set"` or `"Get"`.
    fn action(&self) -> &'static str;

    /// Returns the action argument, if any.
    fn argument(&self) -> Option<String>;

    /// Returns the call expression, e.g. `Set(0)` or `Get()`.
    fn invocation(&self) -> String {
        format!("{}({})", self.action(), self.argument().unwrap_or_default())
    }
}

/// A command bound to a device instance, ready to be run on the controller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunCommand {
    device: NodeId,
    instance: u8,
    command_class: CommandClassId,
    action: &'static str,
    argument: Option<String>,
}

impl RunCommand {
    /// Binds `command` to instance `instance` of `device`.
    #[must_use]
    pub fn new<C: Command + ?Sized>(device: NodeId, instance: u8, command: &C) -> Self {
        Self {
            device,
            instance,
            command_class: command.command_class(),
            action: command.action(),
            argument: command.argument(),
        }
    }

    /// Returns the addressed device.
    #[must_use]
    pub fn device(&self) -> NodeId {
        self.device
    }

    /// Returns the addressed instance index.
    #[must_use]
    pub fn instance(&self) -> u8 {
        self.instance
    }

    /// Returns the addressed command class.
    #[must_use]
    pub fn command_class(&self) -> CommandClassId {
        self.command_class
    }

    /// Returns the action argument, or an empty string.
    #[must_use]
    pub fn param(&self) -> &str {
        self.argument.as_deref().unwrap_or_default()
    }

    /// Returns the path of this command below the controller's `Run/` endpoint.
    #[must_use]
    pub fn run_path(&self) -> String {
        format!(
            "devices[{}].instances[{}].commandClasses[{}].{}({})",
            self.device.value(),
            self.instance,
            self.command_class,
            self.action,
            self.param()
        )
    }
}

impl fmt::Display for RunCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.run_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_path_for_switch_on() {
        let run = RunCommand::new(NodeId::new(12), 0, &SwitchBinaryCommand::on());
        assert_eq!(
            run.run_path(),
            "devices[12].instances[0].commandClasses[37].Set(255)"
        );
    }

    #[test]
    fn run_path_for_meter_query() {
        let run = RunCommand::new(NodeId::new(4), 1, &MeterCommand::watts());
        assert_eq!(run.run_path(), "devices[4].instances[1].commandClasses[50].Get(2)");
        assert_eq!(run.param(), "2");
        assert_eq!(run.instance(), 1);
    }

    #[test]
    fn query_without_argument_has_empty_param() {
        let run = RunCommand::new(NodeId::new(4), 0, &SwitchBinaryCommand::Get);
        assert_eq!(run.param(), "");
        assert_eq!(run.to_string(), "devices[4].instances[0].commandClasses[37].Get()");
    }
}
