// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end tests of the bridge against a mocked controller.

use chrono::{Duration, Utc};
use serde_json::json;
use tokio::sync::broadcast;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zway_pump_bridge::event::{AccessoryEvent, EventBus};
use zway_pump_bridge::manager::{Bridge, BridgeConfig, TrackedAccessory};
use zway_pump_bridge::protocol::{MemorySessionStore, ZWayClient, ZWayConfig};
use zway_pump_bridge::state::{AccessoryState, Characteristic, CharacteristicValue};
use zway_pump_bridge::types::NodeId;

const TOKEN: &str = "abcdef0123456789";
const SHUTOFF_PATH: &str = "/ZWave.zway/Run/devices[7].instances[0].commandClasses[37].Set(0)";

fn snapshot(level: u16, watts: f64) -> serde_json::Value {
    json!({
        "updateTime": 1_700_000_000,
        "controller": { "data": { "vendor": { "value": "Z-Wave.Me" } } },
        "devices": {
            "1": {
                "data": {
                    "givenName": { "value": "" },
                    "vendorString": { "value": "Z-Wave.Me" },
                    "deviceTypeString": { "value": "Static PC Controller" }
                },
                "instances": {}
            },
            "7": {
                "data": {
                    "givenName": { "value": "Cistern" },
                    "vendorString": { "value": "Elexa Consumer Products Inc." },
                    "deviceTypeString": { "value": "Binary Power Switch" }
                },
                "instances": { "0": { "commandClasses": {
                    "37": { "data": { "level": { "value": level, "updateTime": 1_699_999_990 } } },
                    "50": { "data": { "2": { "val": { "value": watts, "updateTime": 1_699_999_995 } } } }
                } } }
            }
        }
    })
}

async fn controller(level: u16, watts: f64, expected_shutoffs: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ZAutomation/api/v1/status"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ZWaveAPI/Data/0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(snapshot(level, watts)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SHUTOFF_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(expected_shutoffs)
        .mount(&server)
        .await;
    server
}

fn client(server: &MockServer) -> ZWayClient {
    ZWayConfig::new(server.uri())
        .into_client(MemorySessionStore::with_token(TOKEN))
        .unwrap()
}

fn config() -> BridgeConfig {
    BridgeConfig::new("unused").with_threshold_wattage(5.0)
}

fn drain(rx: &mut broadcast::Receiver<AccessoryEvent>) -> Vec<AccessoryEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn updated(characteristic: Characteristic, value: bool) -> AccessoryEvent {
    AccessoryEvent::characteristic_updated(
        NodeId::new(7),
        characteristic,
        CharacteristicValue::Bool(value),
    )
}

#[tokio::test]
async fn dry_pump_is_created_and_shut_off() {
    let server = controller(255, 2.0, 1).await;
    let bus = EventBus::new();
    let mut rx = bus.subscribe();
    let mut bridge = Bridge::new(config(), client(&server), bus);

    bridge.start().await.unwrap();

    let events = drain(&mut rx);
    assert_eq!(events[0], AccessoryEvent::created(NodeId::new(7), "Cistern"));
    assert!(events.contains(&updated(Characteristic::Active, true)));
    assert!(events.contains(&updated(Characteristic::InUse, true)));
    assert!(events.contains(&updated(Characteristic::LeakDetected, true)));
    assert!(events.iter().all(|event| event.node_id() == NodeId::new(7)));

    let state = bridge.accessory(NodeId::new(7)).unwrap().state();
    assert!(state.is_on());
    assert!(state.is_empty());
    assert!(state.last_power_change().is_some());
}

#[tokio::test]
async fn settled_restored_pump_is_shut_off() {
    let server = controller(255, 2.0, 1).await;
    let bus = EventBus::new();
    let mut rx = bus.subscribe();
    let mut bridge = Bridge::new(config(), client(&server), bus);
    bridge.restore_accessory(TrackedAccessory::with_state(
        NodeId::new(7),
        "Cistern",
        AccessoryState::restored(true, false, Some(Utc::now() - Duration::seconds(60))),
    ));

    bridge.start().await.unwrap();

    assert_eq!(
        drain(&mut rx),
        vec![updated(Characteristic::LeakDetected, true)]
    );
    let state = bridge.accessory(NodeId::new(7)).unwrap().state();
    assert!(state.is_on());
    assert!(state.is_empty());
}

#[tokio::test]
async fn recently_switched_pump_is_left_running() {
    let server = controller(255, 2.0, 0).await;
    let mut bridge = Bridge::new(config(), client(&server), EventBus::new());
    bridge.restore_accessory(TrackedAccessory::with_state(
        NodeId::new(7),
        "Cistern",
        AccessoryState::restored(true, false, Some(Utc::now() - Duration::seconds(10))),
    ));

    bridge.start().await.unwrap();
    bridge.poll_once().await.unwrap();

    let state = bridge.accessory(NodeId::new(7)).unwrap().state();
    assert!(state.is_on());
    assert!(!state.is_empty());
}

#[tokio::test]
async fn running_pump_is_not_empty() {
    let server = controller(255, 250.0, 0).await;
    let mut bridge = Bridge::new(config(), client(&server), EventBus::new());

    bridge.start().await.unwrap();

    let state = bridge.accessory(NodeId::new(7)).unwrap().state();
    assert!(state.is_on());
    assert!(!state.is_empty());
}

#[tokio::test]
async fn set_event_reaches_controller() {
    let server = controller(0, 0.0, 0).await;
    Mock::given(method("POST"))
        .and(path_regex(r"commandClasses\[37\]\.Set\(255\)$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let mut bridge = Bridge::new(config(), client(&server), EventBus::new());
    bridge.start().await.unwrap();

    bridge
        .handle_set(NodeId::new(7), Characteristic::Active, CharacteristicValue::Bool(true))
        .await
        .unwrap();
}

#[tokio::test]
async fn unreachable_controller_does_not_start() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let mut bridge = Bridge::new(config(), client(&server), EventBus::new());

    assert!(bridge.start().await.is_err());
    assert!(!bridge.is_started());
    assert_eq!(bridge.accessories().count(), 0);
}
