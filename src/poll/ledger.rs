// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ledger of queries sent to the controller and not yet answered.

use std::collections::HashMap;
use std::fmt;

use crate::command::RunCommand;
use crate::types::{CommandClassId, NodeId};

/// Controller time units (seconds) after which a pending query is re-sent.
pub const STALE_AFTER: i64 = 100;

/// Identity of a controller query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    device: NodeId,
    instance: u8,
    command_class: CommandClassId,
    param: String,
}

impl QueryKey {
    /// Creates a key.
    #[must_use]
    pub fn new(
        device: NodeId,
        instance: u8,
        command_class: CommandClassId,
        param: impl Into<String>,
    ) -> Self {
        Self {
            device,
            instance,
            command_class,
            param: param.into(),
        }
    }

    /// Returns the queried device.
    #[must_use]
    pub fn device(&self) -> NodeId {
        self.device
    }
}

impl From<&RunCommand> for QueryKey {
    fn from(command: &RunCommand) -> Self {
        Self::new(
            command.device(),
            command.instance(),
            command.command_class(),
            command.param(),
        )
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "device {} instance {} class {} param '{}'",
            self.device, self.instance, self.command_class, self.param
        )
    }
}

/// Outcome of checking a query against the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// No query is outstanding, or the data is newer than the last one sent.
    Fresh,
    /// A query is outstanding but went unanswered for too long.
    Retry,
    /// A query is already outstanding.
    Pending,
}

impl Dispatch {
    /// Returns `true` if the query must be sent.
    #[must_use]
    pub const fn should_send(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Tracks when each query was last sent, in controller time.
///
/// A query is held back while an entry exists that was recorded at or after
/// the time of the data it would refresh, unless that entry is at least
/// [`STALE_AFTER`] old. Every dispatch stamps the entry with the current
/// controller time.
///
/// # Examples
///
/// ```
/// use zway_pump_bridge::poll::{Dispatch, PendingQueryLedger, QueryKey};
/// use zway_pump_bridge::types::{CommandClassId, NodeId};
///
/// let mut ledger = PendingQueryLedger::new();
/// let key = QueryKey::new(NodeId::new(7), 0, CommandClassId::Meter, "2");
///
/// assert_eq!(ledger.check(&key, 1_000, 1_010), Dispatch::Fresh);
/// assert_eq!(ledger.check(&key, 1_000, 1_050), Dispatch::Pending);
/// assert_eq!(ledger.check(&key, 1_000, 1_110), Dispatch::Retry);
/// ```
#[derive(Debug, Default)]
pub struct PendingQueryLedger {
    entries: HashMap<QueryKey, i64>,
}

impl PendingQueryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decides whether a query must be sent and records it if so.
    ///
    /// `request_time` is the controller time of the data the query would
    /// refresh; `current_time` is the controller's current time.
    pub fn check(&mut self, key: &QueryKey, request_time: i64, current_time: i64) -> Dispatch {
        let outcome = match self.entries.get(key) {
            Some(&issued) if issued >= request_time => {
                if current_time - issued >= STALE_AFTER {
                    tracing::warn!(
                        query = %key,
                        waited = current_time - issued,
                        "Query unanswered for too long, retrying"
                    );
                    Dispatch::Retry
                } else {
                    Dispatch::Pending
                }
            }
            _ => Dispatch::Fresh,
        };

        if outcome.should_send() {
            self.entries.insert(key.clone(), current_time);
        }
        outcome
    }

    /// Shorthand for [`check`](Self::check) returning whether to send.
    pub fn should_dispatch(&mut self, key: &QueryKey, request_time: i64, current_time: i64) -> bool {
        self.check(key, request_time, current_time).should_send()
    }

    /// Returns when a query was last sent, if ever.
    #[must_use]
    pub fn issued_at(&self, key: &QueryKey) -> Option<i64> {
        self.entries.get(key).copied()
    }

    /// Drops every entry whose device is not tracked anymore.
    ///
    /// Returns the number of evicted entries.
    pub fn evict_untracked(&mut self, is_tracked: impl Fn(NodeId) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| is_tracked(key.device));
        let evicted = before - self.entries.len();
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted pending queries of untracked devices");
        }
        evicted
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the ledger is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
