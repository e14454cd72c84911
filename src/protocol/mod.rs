// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Communication with the Z-Way controller.
//!
//! The bridge engine only talks to the controller through the
//! [`ControllerClient`] trait. [`ZWayClient`] implements it over the Z-Way
//! HTTP API (behind the `http` feature) and takes care of the session
//! lifecycle:
//!
//! - a persisted token is validated with a cheap status call,
//! - missing or rejected tokens lead to a login, whose token is persisted,
//! - a request rejected with 401/403 triggers one fresh login and one retry.
//!
//! Session tokens are persisted through a [`SessionStore`].

#[cfg(feature = "http")]
mod http;
mod session;

#[cfg(feature = "http")]
pub use http::{ZWayClient, ZWayConfig};
pub use session::{
    FileSessionStore, MemorySessionStore, SESSION_FILE_NAME, SessionState, SessionStore, redact,
};

use crate::command::RunCommand;
use crate::error::Result;
use crate::telemetry::SnapshotSet;

/// Read and write access to the controller.
#[allow(async_fn_in_trait)]
pub trait ControllerClient {
    /// Fetches a full snapshot of every device known to the controller.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the controller cannot be reached, an
    /// authentication error if no session can be established, or a parse
    /// error if the snapshot itself is malformed.
    async fn fetch_snapshot(&self) -> Result<SnapshotSet>;

    /// Runs a command class action on a device.
    ///
    /// Callers treat this as best effort: a failure is logged and the next
    /// poll cycle converges the state.
    ///
    /// # Errors
    ///
    /// Returns a transport or authentication error if the command could not
    /// be delivered.
    async fn run_command(&self, command: &RunCommand) -> Result<()>;
}
