// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bridge configuration.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::poll::DEFAULT_POLL_DELAY;
use crate::protocol::FileSessionStore;
#[cfg(feature = "http")]
use crate::protocol::ZWayConfig;
use crate::types::NodeId;

/// Longest accepted delay between poll cycles.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(3600);

/// Configuration of a pump outlet bridge.
///
/// Deserializes from the host's JSON platform block:
///
/// ```
/// use zway_pump_bridge::manager::BridgeConfig;
/// use zway_pump_bridge::types::NodeId;
///
/// let config: BridgeConfig = serde_json::from_str(r#"{
///     "host": "http://192.168.1.20:8083/",
///     "user": "admin",
///     "pass": "secret",
///     "ignore": [12],
///     "toPoll": [7],
///     "thresholdWattage": 5
/// }"#).unwrap();
///
/// assert!(config.is_ignored(NodeId::new(12)));
/// assert!(config.should_poll(NodeId::new(7)));
/// assert!(!config.nuke);
/// ```
///
/// or is built in code:
///
/// ```
/// use zway_pump_bridge::manager::BridgeConfig;
/// use zway_pump_bridge::types::NodeId;
///
/// let config = BridgeConfig::new("192.168.1.20:8083")
///     .with_credentials("admin", "secret")
///     .with_threshold_wattage(5.0)
///     .with_to_poll([NodeId::new(7)]);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Controller address, optionally with scheme and port.
    pub host: String,
    /// Login user name.
    #[serde(default)]
    pub user: String,
    /// Login password. May be empty once the session is non-expiring.
    #[serde(default)]
    pub pass: String,
    /// Destroy every tracked accessory on start instead of discovering.
    #[serde(default)]
    pub nuke: bool,
    /// Nodes never turned into accessories.
    #[serde(default)]
    pub ignore: Vec<NodeId>,
    /// Nodes whose telemetry is actively re-queried.
    #[serde(default)]
    pub to_poll: Vec<NodeId>,
    /// Power draw below which a running pump is considered dry.
    pub threshold_wattage: f64,
    /// Directory holding the persisted session.
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,
    /// Delay between poll cycles, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from(".")
}

#[allow(clippy::cast_possible_truncation)]
fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_DELAY.as_millis() as u64
}

impl BridgeConfig {
    /// Creates a configuration for the given controller host.
    ///
    /// The wattage threshold starts at zero, which never reports an empty
    /// tank; set it with [`with_threshold_wattage`](Self::with_threshold_wattage).
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: String::new(),
            pass: String::new(),
            nuke: false,
            ignore: Vec::new(),
            to_poll: Vec::new(),
            threshold_wattage: 0.0,
            storage_path: default_storage_path(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }

    /// Sets the login credentials.
    #[must_use]
    pub fn with_credentials(mut self, user: impl Into<String>, pass: impl Into<String>) -> Self {
        self.user = user.into();
        self.pass = pass.into();
        self
    }

    /// Enables or disables the forced reset.
    #[must_use]
    pub fn with_nuke(mut self, nuke: bool) -> Self {
        self.nuke = nuke;
        self
    }

    /// Sets the ignored nodes.
    #[must_use]
    pub fn with_ignore(mut self, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        self.ignore = nodes.into_iter().collect();
        self
    }

    /// Sets the actively polled nodes.
    #[must_use]
    pub fn with_to_poll(mut self, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        self.to_poll = nodes.into_iter().collect();
        self
    }

    /// Sets the dry-run wattage threshold.
    #[must_use]
    pub fn with_threshold_wattage(mut self, watts: f64) -> Self {
        self.threshold_wattage = watts;
        self
    }

    /// Sets the directory holding the persisted session.
    #[must_use]
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = path.into();
        self
    }

    /// Sets the delay between poll cycles.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Reads and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, is not valid JSON
    /// of the expected shape, or fails [`validate`](Self::validate).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), host = %config.host, "Loaded configuration");
        Ok(config)
    }

    /// Checks that the values are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an empty host, a negative or
    /// non-finite threshold, or a zero poll interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "host",
                message: "must not be empty".to_string(),
            });
        }
        if !self.threshold_wattage.is_finite() || self.threshold_wattage < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "thresholdWattage",
                message: format!("{} is not a wattage", self.threshold_wattage),
            });
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pollIntervalMs",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.poll_interval() > MAX_POLL_INTERVAL {
            return Err(ConfigError::InvalidValue {
                field: "pollIntervalMs",
                message: format!(
                    "must not exceed {} ms",
                    MAX_POLL_INTERVAL.as_millis()
                ),
            });
        }
        Ok(())
    }

    /// Returns `true` if the node must not become an accessory.
    #[must_use]
    pub fn is_ignored(&self, node: NodeId) -> bool {
        self.ignore.contains(&node)
    }

    /// Returns `true` if the node's telemetry is actively re-queried.
    #[must_use]
    pub fn should_poll(&self, node: NodeId) -> bool {
        self.to_poll.contains(&node)
    }

    /// Returns the delay between poll cycles.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Returns the session store inside the storage directory.
    #[must_use]
    pub fn session_store(&self) -> FileSessionStore {
        FileSessionStore::in_dir(&self.storage_path)
    }

    /// Returns the controller connection parameters.
    #[cfg(feature = "http")]
    #[must_use]
    pub fn controller_config(&self) -> ZWayConfig {
        ZWayConfig::new(&self.host).with_credentials(&self.user, &self.pass)
    }
}

impl fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("nuke", &self.nuke)
            .field("ignore", &self.ignore)
            .field("to_poll", &self.to_poll)
            .field("threshold_wattage", &self.threshold_wattage)
            .field("storage_path", &self.storage_path)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .finish_non_exhaustive()
    }
}
