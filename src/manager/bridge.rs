// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The bridge engine: discovery, polling and command handling.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use super::config::{BridgeConfig, MAX_POLL_INTERVAL};
use super::reconciler::{Delta, ReconcileMode, display_name, is_supported_device, reconcile};
use super::tracked_accessory::TrackedAccessory;
use crate::command::{RunCommand, SwitchBinaryCommand};
use crate::error::{Error, Result, TransportError};
use crate::event::AccessorySink;
use crate::poll::{PollScheduler, outlet_queries};
use crate::protocol::ControllerClient;
use crate::state::{Characteristic, CharacteristicValue};
use crate::telemetry::{OUTLET_INSTANCE, SnapshotSet, interpret};
use crate::types::NodeId;

/// Delay before the first contact with the controller.
pub const INITIAL_DELAY: Duration = Duration::from_millis(500);

const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Requests funneled into the bridge loop.
#[derive(Debug)]
pub enum BridgeCommand {
    /// A characteristic set event from the accessory framework.
    SetCharacteristic {
        /// Target accessory.
        node_id: NodeId,
        /// Characteristic being written.
        characteristic: Characteristic,
        /// Requested value.
        value: CharacteristicValue,
        /// Receives the outcome.
        respond: oneshot::Sender<Result<()>>,
    },
    /// An identify request from the accessory framework.
    Identify {
        /// Target accessory.
        node_id: NodeId,
        /// Receives the outcome.
        respond: oneshot::Sender<Result<()>>,
    },
    /// Stops the loop after the current cycle.
    Shutdown,
}

/// Cloneable handle used by the host to reach a running [`Bridge`].
#[derive(Debug, Clone)]
pub struct BridgeHandle {
    sender: mpsc::Sender<BridgeCommand>,
}

impl BridgeHandle {
    /// Forwards a characteristic set event and waits for it to be handled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAccessory`] or [`Error::ReadOnlyCharacteristic`]
    /// for invalid targets, and a channel error if the bridge has stopped.
    pub async fn set_characteristic(
        &self,
        node_id: NodeId,
        characteristic: Characteristic,
        value: CharacteristicValue,
    ) -> Result<()> {
        let (respond, response) = oneshot::channel();
        self.send(BridgeCommand::SetCharacteristic {
            node_id,
            characteristic,
            value,
            respond,
        })
        .await?;
        response.await.map_err(|_| closed())?
    }

    /// Forwards an identify request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAccessory`] for an untracked node, and a
    /// channel error if the bridge has stopped.
    pub async fn identify(&self, node_id: NodeId) -> Result<()> {
        let (respond, response) = oneshot::channel();
        self.send(BridgeCommand::Identify { node_id, respond }).await?;
        response.await.map_err(|_| closed())?
    }

    /// Asks the bridge loop to stop.
    ///
    /// # Errors
    ///
    /// Returns a channel error if the bridge has already stopped.
    pub async fn shutdown(&self) -> Result<()> {
        self.send(BridgeCommand::Shutdown).await
    }

    async fn send(&self, command: BridgeCommand) -> Result<()> {
        self.sender.send(command).await.map_err(|_| closed())
    }
}

fn closed() -> Error {
    TransportError::ChannelClosed("bridge has stopped".to_string()).into()
}

/// Synchronizes Z-Way pump outlets with outlet accessories.
///
/// The bridge owns the tracked accessories and the poll throttling state.
/// [`run`](Self::run) drives a single-flight loop: each cycle runs to
/// completion before the next one is scheduled, and set events received
/// through a [`BridgeHandle`] are handled between cycles.
///
/// # Examples
///
/// ```no_run
/// use zway_pump_bridge::event::EventBus;
/// use zway_pump_bridge::manager::{Bridge, BridgeConfig};
///
/// # async fn example() -> zway_pump_bridge::Result<()> {
/// let config = BridgeConfig::load("zway-pump.json")?;
/// let client = config.controller_config().into_client(config.session_store())?;
/// let events = EventBus::new();
/// let mut accessories = events.subscribe();
///
/// let mut bridge = Bridge::new(config, client, events);
/// let handle = bridge.handle();
///
/// tokio::join!(bridge.run(), async {
///     while let Ok(event) = accessories.recv().await {
///         println!("{event:?}");
///     }
///     let _ = handle.shutdown().await;
/// });
/// # Ok(())
/// # }
/// ```
pub struct Bridge<C, S> {
    config: BridgeConfig,
    client: C,
    sink: S,
    accessories: BTreeMap<NodeId, TrackedAccessory>,
    scheduler: PollScheduler,
    started: bool,
    sender: mpsc::Sender<BridgeCommand>,
    commands: mpsc::Receiver<BridgeCommand>,
}

impl<C, S> Bridge<C, S>
where
    C: ControllerClient,
    S: AccessorySink,
{
    /// Creates a bridge. Nothing is contacted until [`run`](Self::run) or
    /// [`start`](Self::start).
    #[must_use]
    pub fn new(config: BridgeConfig, client: C, sink: S) -> Self {
        let (sender, commands) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        Self {
            config,
            client,
            sink,
            accessories: BTreeMap::new(),
            scheduler: PollScheduler::new(),
            started: false,
            sender,
            commands,
        }
    }

    /// Returns a handle for set events and shutdown.
    #[must_use]
    pub fn handle(&self) -> BridgeHandle {
        BridgeHandle {
            sender: self.sender.clone(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Returns the controller client.
    #[must_use]
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Returns `true` once initial contact succeeded.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Returns a tracked accessory.
    #[must_use]
    pub fn accessory(&self, node_id: NodeId) -> Option<&TrackedAccessory> {
        self.accessories.get(&node_id)
    }

    /// Returns every tracked accessory, ordered by node.
    pub fn accessories(&self) -> impl Iterator<Item = &TrackedAccessory> {
        self.accessories.values()
    }

    /// Returns the poll scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    /// Hands back an accessory persisted by the host.
    ///
    /// Restored accessories take part in the reconciliation of
    /// [`start`](Self::start) like any other tracked accessory.
    pub fn restore_accessory(&mut self, accessory: TrackedAccessory) {
        tracing::debug!(
            node_id = %accessory.node_id(),
            name = %accessory.name(),
            "Restoring cached accessory"
        );
        self.accessories.insert(accessory.node_id(), accessory);
    }

    // =========================================================================
    // Loop
    // =========================================================================

    /// Runs the bridge until [`BridgeHandle::shutdown`] is called.
    ///
    /// Failures never stop the loop: they are logged and the next cycle is
    /// scheduled anyway.
    pub async fn run(&mut self) {
        let sleep = tokio::time::sleep(INITIAL_DELAY);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                () = &mut sleep => {
                    self.tick().await;
                    sleep.as_mut().reset(next_deadline(self.config.poll_interval()));
                }
                command = self.commands.recv() => match command {
                    Some(BridgeCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command).await,
                },
            }
        }

        tracing::info!("Bridge stopped");
    }

    async fn tick(&mut self) {
        if !self.started {
            if let Err(e) = self.start().await {
                tracing::warn!(error = %e, "Initial contact with controller failed, retrying");
            }
        } else if let Err(e) = self.poll_once().await {
            tracing::warn!(error = %e, "Poll cycle failed");
        }
    }

    async fn handle_command(&mut self, command: BridgeCommand) {
        match command {
            BridgeCommand::SetCharacteristic {
                node_id,
                characteristic,
                value,
                respond,
            } => {
                let result = self.handle_set(node_id, characteristic, value).await;
                // The requester may have given up waiting.
                let _ = respond.send(result);
            }
            BridgeCommand::Identify { node_id, respond } => {
                let _ = respond.send(self.identify(node_id));
            }
            BridgeCommand::Shutdown => {}
        }
    }

    // =========================================================================
    // Cycles
    // =========================================================================

    /// Performs initial contact: discovery, reconciliation and a first update.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be fetched. Nothing changes
    /// in that case and the call may be repeated.
    pub async fn start(&mut self) -> Result<()> {
        let snapshot = self.client.fetch_snapshot().await?;

        tracing::info!(
            vendor = snapshot.controller_vendor().unwrap_or("unknown"),
            "Connected to controller"
        );
        for device in snapshot.devices() {
            tracing::info!(
                node_id = %device.node_id(),
                name = %device.given_name(),
                vendor = %device.vendor(),
                device_type = %device.device_type(),
                "Found device"
            );
        }
        log_rejected(&snapshot);

        let mut discovered: Vec<NodeId> = snapshot
            .devices()
            .filter(|device| is_supported_device(device))
            .map(crate::telemetry::DeviceSnapshot::node_id)
            .collect();
        // A tracked device with unreadable data is still present on the controller.
        for (key, _) in snapshot.rejected() {
            if let Ok(node_id) = key.parse::<NodeId>()
                && self.accessories.contains_key(&node_id)
            {
                tracing::warn!(node_id = %node_id, "Keeping accessory with malformed device data");
                discovered.push(node_id);
            }
        }

        let mode = if self.config.nuke {
            tracing::warn!("Nuke is enabled, removing every accessory");
            ReconcileMode::Nuke
        } else {
            ReconcileMode::Discover
        };
        let tracked: Vec<NodeId> = self.accessories.keys().copied().collect();
        let delta = reconcile(&tracked, &discovered, &self.config.ignore, mode);
        self.apply_delta(&delta, &snapshot);

        self.started = true;
        self.update_values(&snapshot, Utc::now()).await;
        Ok(())
    }

    fn apply_delta(&mut self, delta: &Delta, snapshot: &SnapshotSet) {
        for node_id in &delta.removed {
            if self.accessories.remove(node_id).is_some() {
                tracing::info!(node_id = %node_id, "Removing accessory");
                self.sink.destroy_accessory(*node_id);
            }
        }

        for node_id in &delta.ignored {
            tracing::info!(node_id = %node_id, "Ignoring device");
        }

        for node_id in &delta.added {
            let Some(device) = snapshot.device(*node_id) else {
                continue;
            };
            let name = display_name(device);
            if device.given_name().is_empty() {
                tracing::warn!(node_id = %node_id, "Device has no name, using default");
            }
            tracing::info!(node_id = %node_id, name = %name, "Adding accessory");

            let accessory = TrackedAccessory::new(*node_id, name);
            self.sink.create_accessory(*node_id, name);
            for characteristic in [
                Characteristic::ValveType,
                Characteristic::Active,
                Characteristic::InUse,
                Characteristic::LeakDetected,
            ] {
                self.sink.update_characteristic(
                    *node_id,
                    characteristic,
                    accessory.state().characteristic(characteristic),
                );
            }
            self.accessories.insert(*node_id, accessory);
        }

        let accessories = &self.accessories;
        self.scheduler
            .evict_untracked(|node_id| accessories.contains_key(&node_id));
    }

    /// Runs one poll cycle.
    ///
    /// Fetches a snapshot, sends the explicit queries the scheduler lets
    /// through, then updates every accessory and shuts off dry pumps.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be fetched.
    pub async fn poll_once(&mut self) -> Result<()> {
        self.scheduler.begin_cycle();

        let snapshot = self.client.fetch_snapshot().await?;
        log_rejected(&snapshot);
        let now = Utc::now();

        let mut candidates = Vec::new();
        for node_id in self.accessories.keys() {
            if !self.config.should_poll(*node_id) {
                continue;
            }
            tracing::debug!(
                node_id = %node_id,
                "Prefer lifeline association or a lower reporting threshold over polling"
            );
            if let Some(device) = snapshot.device(*node_id) {
                candidates.extend(outlet_queries(device));
            }
        }

        for query in self.scheduler.select(candidates, snapshot.update_time()) {
            tracing::debug!(command = %query, "Querying device");
            self.send_command(&query).await;
        }

        self.update_values(&snapshot, now).await;

        let accessories = &self.accessories;
        self.scheduler
            .evict_untracked(|node_id| accessories.contains_key(&node_id));
        Ok(())
    }

    /// Derives accessory state from a snapshot and shuts off dry pumps.
    async fn update_values(&mut self, snapshot: &SnapshotSet, now: DateTime<Utc>) {
        let mut shutoffs = Vec::new();

        for (node_id, accessory) in &mut self.accessories {
            let Some(device) = snapshot.device(*node_id) else {
                tracing::warn!(node_id = %node_id, "Device missing from snapshot, keeping state");
                continue;
            };

            let derived = match interpret(
                accessory.state(),
                device,
                self.config.threshold_wattage,
                now,
            ) {
                Ok(derived) => derived,
                Err(e) => {
                    tracing::warn!(node_id = %node_id, error = %e, "Malformed device data, keeping state");
                    continue;
                }
            };

            for change in accessory.state_mut().apply(&derived) {
                tracing::debug!(node_id = %node_id, change = ?change, "Characteristic changed");
                self.sink
                    .update_characteristic(*node_id, change.characteristic(), change.value());
            }

            if derived.shutoff_required {
                tracing::warn!(node_id = %node_id, "Pump is running dry, shutting off");
                accessory.state_mut().record_power_change(now);
                shutoffs.push(RunCommand::new(
                    *node_id,
                    OUTLET_INSTANCE,
                    &SwitchBinaryCommand::off(),
                ));
            }
        }

        for command in shutoffs {
            self.send_command(&command).await;
        }
    }

    async fn send_command(&self, command: &RunCommand) {
        if let Err(e) = self.client.run_command(command).await {
            tracing::warn!(command = %command, error = %e, "Failed to send command");
        }
    }

    // =========================================================================
    // Set events
    // =========================================================================

    /// Handles a characteristic set event.
    ///
    /// Writing `Active` records the power change and switches the outlet.
    /// Delivery is best effort: a failed command is logged and the next poll
    /// reflects the actual state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAccessory`] for an untracked node and
    /// [`Error::ReadOnlyCharacteristic`] for anything but `Active`.
    pub async fn handle_set(
        &mut self,
        node_id: NodeId,
        characteristic: Characteristic,
        value: CharacteristicValue,
    ) -> Result<()> {
        let accessory = self
            .accessories
            .get_mut(&node_id)
            .ok_or(Error::UnknownAccessory(node_id))?;
        if !characteristic.is_writable() {
            return Err(Error::ReadOnlyCharacteristic(characteristic.to_string()));
        }

        let on = value.as_bool();
        tracing::info!(node_id = %node_id, on, "Setting outlet");
        accessory.state_mut().record_power_change(Utc::now());

        let command = RunCommand::new(node_id, OUTLET_INSTANCE, &SwitchBinaryCommand::from(on));
        self.send_command(&command).await;
        Ok(())
    }

    /// Handles an identify request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAccessory`] for an untracked node.
    pub fn identify(&self, node_id: NodeId) -> Result<()> {
        let accessory = self
            .accessories
            .get(&node_id)
            .ok_or(Error::UnknownAccessory(node_id))?;
        tracing::info!(node_id = %node_id, name = %accessory.name(), "Identify requested");
        Ok(())
    }
}

impl<C, S> std::fmt::Debug for Bridge<C, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("config", &self.config)
            .field("accessories", &self.accessories)
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

fn next_deadline(delay: Duration) -> Instant {
    Instant::now() + delay.min(MAX_POLL_INTERVAL)
}

fn log_rejected(snapshot: &SnapshotSet) {
    for (node, error) in snapshot.rejected() {
        tracing::warn!(node = %node, error = %error, "Ignoring malformed device data");
    }
}
