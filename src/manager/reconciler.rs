// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reconciliation of tracked accessories against discovered devices.

use std::collections::HashSet;

use crate::telemetry::DeviceSnapshot;
use crate::types::NodeId;

/// Vendor of the only supported outlet.
pub const SUPPORTED_VENDOR: &str = "Elexa Consumer Products Inc.";
/// Device type of the only supported outlet.
pub const SUPPORTED_DEVICE_TYPE: &str = "Binary Power Switch";
/// Name given to an outlet without a configured name.
pub const DEFAULT_ACCESSORY_NAME: &str = "Pump";

/// How tracked accessories are reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcileMode {
    /// Diff tracked accessories against discovered devices.
    #[default]
    Discover,
    /// Drop every tracked accessory and add nothing.
    Nuke,
}

/// Result of a reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delta {
    /// Discovered devices to turn into accessories, in discovery order.
    pub added: Vec<NodeId>,
    /// Tracked accessories to destroy, in tracking order.
    pub removed: Vec<NodeId>,
    /// Discovered devices held back by the ignore list.
    pub ignored: Vec<NodeId>,
}

impl Delta {
    /// Returns `true` if nothing changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Computes which accessories to add and remove.
///
/// `added` is `discovered - tracked` without ignored nodes, `removed` is
/// `tracked - discovered`. Both keep the order of their input. An ignored
/// node that is already tracked stays tracked as long as it is discovered.
///
/// # Examples
///
/// ```
/// use zway_pump_bridge::manager::{reconcile, ReconcileMode};
/// use zway_pump_bridge::types::NodeId;
///
/// let ids = |v: &[u16]| v.iter().copied().map(NodeId::new).collect::<Vec<_>>();
///
/// let delta = reconcile(&ids(&[1, 2]), &ids(&[2, 3, 4]), &ids(&[4]), ReconcileMode::Discover);
/// assert_eq!(delta.added, ids(&[3]));
/// assert_eq!(delta.removed, ids(&[1]));
/// assert_eq!(delta.ignored, ids(&[4]));
/// ```
#[must_use]
pub fn reconcile(
    tracked: &[NodeId],
    discovered: &[NodeId],
    ignore: &[NodeId],
    mode: ReconcileMode,
) -> Delta {
    if mode == ReconcileMode::Nuke {
        return Delta {
            removed: dedup(tracked.iter().copied()),
            ..Delta::default()
        };
    }

    let tracked_set: HashSet<NodeId> = tracked.iter().copied().collect();
    let discovered_set: HashSet<NodeId> = discovered.iter().copied().collect();
    let ignore_set: HashSet<NodeId> = ignore.iter().copied().collect();

    let mut delta = Delta::default();
    for node in dedup(discovered.iter().copied()) {
        if tracked_set.contains(&node) {
            continue;
        }
        if ignore_set.contains(&node) {
            delta.ignored.push(node);
        } else {
            delta.added.push(node);
        }
    }
    delta.removed = dedup(
        tracked
            .iter()
            .copied()
            .filter(|node| !discovered_set.contains(node)),
    );
    delta
}

fn dedup(nodes: impl Iterator<Item = NodeId>) -> Vec<NodeId> {
    let mut seen = HashSet::new();
    nodes.filter(|node| seen.insert(*node)).collect()
}

/// Returns `true` if the device is a supported pump outlet.
#[must_use]
pub fn is_supported_device(device: &DeviceSnapshot) -> bool {
    device.vendor() == SUPPORTED_VENDOR && device.device_type() == SUPPORTED_DEVICE_TYPE
}

/// Returns the accessory name of a device.
#[must_use]
pub fn display_name(device: &DeviceSnapshot) -> &str {
    if device.given_name().is_empty() {
        DEFAULT_ACCESSORY_NAME
    } else {
        device.given_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[u16]) -> Vec<NodeId> {
        v.iter().copied().map(NodeId::new).collect()
    }

    fn union(sets: &[&[NodeId]]) -> HashSet<NodeId> {
        sets.iter().flat_map(|s| s.iter().copied()).collect()
    }

    #[test]
    fn every_id_is_accounted_for() {
        let cases: [(&[u16], &[u16], &[u16]); 6] = [
            (&[], &[], &[]),
            (&[1, 2, 3], &[], &[]),
            (&[], &[1, 2, 3], &[2]),
            (&[1, 2], &[2, 3], &[3]),
            (&[5, 6], &[5, 6], &[5]),
            (&[1, 4, 9], &[9, 4, 7, 8], &[8, 100]),
        ];

        for (t, d, i) in cases {
            let (t, d, i) = (ids(t), ids(d), ids(i));
            let delta = reconcile(&t, &d, &i, ReconcileMode::Discover);

            assert!(delta.added.iter().all(|n| !i.contains(n)));
            let common: Vec<NodeId> = t.iter().copied().filter(|n| d.contains(n)).collect();
            assert_eq!(
                union(&[&delta.added, &delta.removed, &delta.ignored, &common]),
                union(&[&t, &d])
            );
            let accounted_without_ignored = union(&[&delta.added, &delta.removed, &common]);
            let expected: HashSet<NodeId> = union(&[&t, &d])
                .into_iter()
                .filter(|n| !delta.ignored.contains(n))
                .collect();
            assert_eq!(accounted_without_ignored, expected);
        }
    }

    #[test]
    fn order_is_preserved() {
        let delta = reconcile(
            &ids(&[9, 1, 5]),
            &ids(&[8, 3, 7, 5]),
            &[],
            ReconcileMode::Discover,
        );
        assert_eq!(delta.added, ids(&[8, 3, 7]));
        assert_eq!(delta.removed, ids(&[9, 1]));
    }

    #[test]
    fn nuke_removes_everything() {
        for discovered in [ids(&[]), ids(&[1, 2]), ids(&[3, 4, 5])] {
            let delta = reconcile(&ids(&[1, 2, 3]), &discovered, &ids(&[2]), ReconcileMode::Nuke);
            assert_eq!(delta.removed, ids(&[1, 2, 3]));
            assert!(delta.added.is_empty());
        }
    }

    #[test]
    fn tracked_ignored_node_stays() {
        let delta = reconcile(&ids(&[4]), &ids(&[4]), &ids(&[4]), ReconcileMode::Discover);
        assert!(delta.is_empty());
        assert!(delta.ignored.is_empty());
    }

    #[test]
    fn duplicates_are_collapsed() {
        let delta = reconcile(&[], &ids(&[3, 3, 2]), &[], ReconcileMode::Discover);
        assert_eq!(delta.added, ids(&[3, 2]));
    }

    #[test]
    fn only_the_elexa_outlet_is_supported() {
        let outlet = DeviceSnapshot::new(
            NodeId::new(7),
            "",
            SUPPORTED_VENDOR,
            SUPPORTED_DEVICE_TYPE,
        );
        let dimmer = DeviceSnapshot::new(
            NodeId::new(8),
            "Hall",
            SUPPORTED_VENDOR,
            "Multilevel Power Switch",
        );
        let other = DeviceSnapshot::new(NodeId::new(9), "Plug", "Aeotec", SUPPORTED_DEVICE_TYPE);

        assert!(is_supported_device(&outlet));
        assert!(!is_supported_device(&dimmer));
        assert!(!is_supported_device(&other));
    }

    #[test]
    fn empty_name_defaults_to_pump() {
        let unnamed = DeviceSnapshot::new(NodeId::new(7), "", SUPPORTED_VENDOR, SUPPORTED_DEVICE_TYPE);
        let named = DeviceSnapshot::new(NodeId::new(7), "Cistern", SUPPORTED_VENDOR, SUPPORTED_DEVICE_TYPE);
        assert_eq!(display_name(&unnamed), "Pump");
        assert_eq!(display_name(&named), "Cistern");
    }

    #[test]
    fn blank_name_is_kept() {
        let blank = DeviceSnapshot::new(NodeId::new(7), " ", SUPPORTED_VENDOR, SUPPORTED_DEVICE_TYPE);
        assert_eq!(display_name(&blank), " ");
    }
}
