// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Poll throttling.
//!
//! Explicit queries ask a device to report again. They are costly on a
//! Z-Wave mesh, so the bridge sends them sparingly:
//!
//! - [`PollCounter`] holds them back during the startup anti-flood window,
//! - [`PendingQueryLedger`] suppresses a query while an identical one is
//!   still outstanding, and re-sends it once it has gone stale.
//!
//! [`PollScheduler`] combines both for the bridge's poll loop.

mod flood_guard;
mod ledger;
mod scheduler;

pub use flood_guard::{ANTI_STARTUP_FLOOD_COUNT, PollCounter};
pub use ledger::{Dispatch, PendingQueryLedger, QueryKey, STALE_AFTER};
pub use scheduler::{DEFAULT_POLL_DELAY, PollScheduler, QueryCandidate, outlet_queries};
