// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Startup anti-flood window.

/// Number of polls during which explicit queries are held back at startup.
pub const ANTI_STARTUP_FLOOD_COUNT: u32 = 120;

/// Counter value marking steady-state operation.
const STEADY_STATE: u32 = 999;

/// Counts poll cycles until the startup anti-flood window is over.
///
/// The first cycle may query (nothing has been asked yet). Cycles 2 to 119
/// are quiet so passive device reports can catch up. From cycle 120 the
/// counter stays at a steady-state sentinel.
///
/// # Examples
///
/// ```
/// use zway_pump_bridge::poll::PollCounter;
///
/// let mut counter = PollCounter::new();
/// counter.tick();
/// assert!(counter.queries_allowed());
/// counter.tick();
/// assert!(!counter.queries_allowed());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollCounter {
    polls: u32,
}

impl PollCounter {
    /// Creates a counter before the first poll.
    #[must_use]
    pub const fn new() -> Self {
        Self { polls: 0 }
    }

    /// Counts one poll cycle.
    ///
    /// Returns `true` on the cycle that ends the anti-flood window.
    pub fn tick(&mut self) -> bool {
        if self.polls < ANTI_STARTUP_FLOOD_COUNT {
            self.polls += 1;
        }
        if self.polls == ANTI_STARTUP_FLOOD_COUNT {
            tracing::info!("Startup anti-flood is finished");
            self.polls = STEADY_STATE;
            return true;
        }
        false
    }

    /// Returns the number of counted polls, or the steady-state sentinel.
    #[must_use]
    pub const fn polls(&self) -> u32 {
        self.polls
    }

    /// Returns `true` once the anti-flood window is over.
    #[must_use]
    pub const fn is_steady(&self) -> bool {
        self.polls >= ANTI_STARTUP_FLOOD_COUNT
    }

    /// Returns `true` if explicit queries may be sent this cycle.
    #[must_use]
    pub const fn queries_allowed(&self) -> bool {
        !(self.polls > 1 && self.polls < ANTI_STARTUP_FLOOD_COUNT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_spans_second_to_last_cycle() {
        let mut counter = PollCounter::new();
        let mut allowed = Vec::new();
        for _ in 0..ANTI_STARTUP_FLOOD_COUNT {
            counter.tick();
            allowed.push(counter.queries_allowed());
        }

        assert!(allowed[0]);
        assert!(allowed[1..119].iter().all(|a| !a));
        assert!(allowed[119]);
    }

    #[test]
    fn steady_state_is_sticky() {
        let mut counter = PollCounter::new();
        let finished: Vec<bool> = (0..200).map(|_| counter.tick()).collect();

        assert_eq!(finished.iter().filter(|f| **f).count(), 1);
        assert!(finished[119]);
        assert_eq!(counter.polls(), 999);
        assert!(counter.is_steady());
        assert!(counter.queries_allowed());
    }
}
