// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Selection of the explicit queries sent during one poll cycle.

use std::time::Duration;

use super::{PendingQueryLedger, PollCounter, QueryKey};
use crate::command::{MeterCommand, RunCommand, SwitchBinaryCommand, WATTS_SCALE};
use crate::telemetry::{DeviceSnapshot, OUTLET_INSTANCE};
use crate::types::NodeId;

/// Default delay between the end of one poll cycle and the start of the next.
pub const DEFAULT_POLL_DELAY: Duration = Duration::from_millis(500);

/// An explicit query the poll cycle may send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryCandidate {
    /// The query to run.
    pub command: RunCommand,
    /// Controller time of the data the query refreshes.
    pub request_time: i64,
}

/// Builds the queries refreshing the telemetry of an actively polled outlet.
///
/// The meter wattage and the switch level are both re-queried, each timed by
/// the update time of the reading it refreshes. A reading without a
/// timestamp counts as infinitely old.
#[must_use]
pub fn outlet_queries(device: &DeviceSnapshot) -> Vec<QueryCandidate> {
    let node = device.node_id();
    let watts_time = device
        .meter_reading(OUTLET_INSTANCE, WATTS_SCALE)
        .and_then(|reading| reading.update_time);
    let level_time = device
        .switch_binary(OUTLET_INSTANCE)
        .and_then(|switch| switch.update_time);

    vec![
        QueryCandidate {
            command: RunCommand::new(node, OUTLET_INSTANCE, &MeterCommand::watts()),
            request_time: watts_time.unwrap_or(0),
        },
        QueryCandidate {
            command: RunCommand::new(node, OUTLET_INSTANCE, &SwitchBinaryCommand::Get),
            request_time: level_time.unwrap_or(0),
        },
    ]
}

/// Throttles explicit queries across poll cycles.
///
/// Combines the startup [`PollCounter`] with the [`PendingQueryLedger`].
#[derive(Debug, Default)]
pub struct PollScheduler {
    counter: PollCounter,
    ledger: PendingQueryLedger,
}

impl PollScheduler {
    /// Creates a scheduler before the first poll.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new poll cycle.
    pub fn begin_cycle(&mut self) {
        self.counter.tick();
    }

    /// Returns the poll counter.
    #[must_use]
    pub fn counter(&self) -> &PollCounter {
        &self.counter
    }

    /// Returns the pending query ledger.
    #[must_use]
    pub fn ledger(&self) -> &PendingQueryLedger {
        &self.ledger
    }

    /// Filters the candidates of this cycle down to the queries to send.
    ///
    /// Nothing is sent inside the anti-flood window. Otherwise each candidate
    /// goes through the ledger at `current_time`.
    pub fn select(
        &mut self,
        candidates: Vec<QueryCandidate>,
        current_time: i64,
    ) -> Vec<RunCommand> {
        if !self.counter.queries_allowed() {
            if !candidates.is_empty() {
                tracing::trace!(
                    polls = self.counter.polls(),
                    held = candidates.len(),
                    "Holding back queries during startup"
                );
            }
            return Vec::new();
        }

        candidates
            .into_iter()
            .filter(|candidate| {
                let key = QueryKey::from(&candidate.command);
                self.ledger
                    .should_dispatch(&key, candidate.request_time, current_time)
            })
            .map(|candidate| candidate.command)
            .collect()
    }

    /// Drops ledger entries of devices that are no longer tracked.
    pub fn evict_untracked(&mut self, is_tracked: impl Fn(NodeId) -> bool) -> usize {
        self.ledger.evict_untracked(is_tracked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{CommandClassData, MeterData, MeterReading, SwitchBinaryData};
    use crate::types::SwitchLevel;

    fn outlet() -> DeviceSnapshot {
        let mut meter = MeterData::default();
        meter.readings.insert(
            WATTS_SCALE,
            MeterReading {
                value: 120.0,
                update_time: Some(900),
            },
        );
        DeviceSnapshot::new(NodeId::new(7), "Cistern", "", "")
            .with_command_class(
                0,
                CommandClassData::SwitchBinary(SwitchBinaryData {
                    level: Some(SwitchLevel::ON),
                    update_time: Some(950),
                }),
            )
            .with_command_class(0, CommandClassData::Meter(meter))
    }

    #[test]
    fn outlet_queries_are_timed_by_their_readings() {
        let queries = outlet_queries(&outlet());
        assert_eq!(queries.len(), 2);
        assert_eq!(
            queries[0].command.run_path(),
            "devices[7].instances[0].commandClasses[50].Get(2)"
        );
        assert_eq!(queries[0].request_time, 900);
        assert_eq!(
            queries[1].command.run_path(),
            "devices[7].instances[0].commandClasses[37].Get()"
        );
        assert_eq!(queries[1].request_time, 950);
    }

    #[test]
    fn first_cycle_sends_then_window_holds() {
        let mut scheduler = PollScheduler::new();

        scheduler.begin_cycle();
        assert_eq!(scheduler.select(outlet_queries(&outlet()), 1_000).len(), 2);

        scheduler.begin_cycle();
        assert!(scheduler.select(outlet_queries(&outlet()), 1_200).is_empty());
    }

    #[test]
    fn steady_state_deduplicates() {
        let mut scheduler = PollScheduler::new();
        for _ in 0..150 {
            scheduler.begin_cycle();
        }
        assert!(scheduler.counter().is_steady());

        assert_eq!(scheduler.select(outlet_queries(&outlet()), 1_000).len(), 2);
        assert!(scheduler.select(outlet_queries(&outlet()), 1_001).is_empty());
        assert_eq!(scheduler.select(outlet_queries(&outlet()), 1_100).len(), 2);
        assert_eq!(scheduler.ledger().len(), 2);

        scheduler.evict_untracked(|_| false);
        assert!(scheduler.ledger().is_empty());
    }
}
