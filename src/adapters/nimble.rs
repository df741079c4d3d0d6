//! NimBLE central adapter.
//!
//! Implements [`TransportPort`] on top of `esp32-nimble`'s async GATT
//! client, driving each call to completion with `futures_lite::block_on`.
//! Also provides [`scan`], which feeds thermostat advertisements into the
//! driver's [`EventInbox`].
//!
//! ## Client pool
//!
//! One `BLEClient` is kept per peer and reused on later commands, so
//! service discovery only runs once per thermostat.  When every slot is
//! taken by another peer the connect is refused.
//!
//! | Parameter             | Value              |
//! |-----------------------|--------------------|
//! | Connection interval   | 12 × 1.25 ms       |
//! | Slave latency         | 0                  |
//! | Supervision timeout   | 51 × 10 ms         |
//! | Connect timeout       | 5 s                |

use std::sync::Arc;
use std::time::Duration;

use esp32_nimble::utilities::BleUuid;
use esp32_nimble::{BLEAddress, BLEAddressType, BLEClient, BLEDevice, BLERemoteCharacteristic, BLEScan};
use futures_lite::future::block_on;
use log::{debug, info, warn};

use crate::address::DeviceAddress;
use crate::app::ports::{CharacteristicHandle, ConnectionHandle, TransportError, TransportPort};
use crate::events::{Advertisement, EventInbox, ScanBatch, ScanOffer};

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

/// Must not exceed `CONFIG_BT_NIMBLE_MAX_CONNECTIONS`.
pub const MAX_CLIENTS: usize = 3;

const CONN_INTERVAL: u16 = 12;
const CONN_LATENCY: u16 = 0;
const CONN_SUPERVISION_TIMEOUT: u16 = 51;
const CONN_SCAN_INTERVAL: u16 = 16;
const CONN_SCAN_WINDOW: u16 = 16;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const SCAN_INTERVAL_UNITS: u16 = 100;
const SCAN_WINDOW_UNITS: u16 = 99;

// ───────────────────────────────────────────────────────────────
// Conversions
// ───────────────────────────────────────────────────────────────

fn ble_address(address: &DeviceAddress) -> BLEAddress {
    BLEAddress::from_be_bytes(address.octets(), BLEAddressType::Public)
}

fn ble_uuid(uuid: u128) -> BleUuid {
    BleUuid::from_uuid128(uuid.to_le_bytes())
}

// ───────────────────────────────────────────────────────────────
// NimbleTransport
// ───────────────────────────────────────────────────────────────

struct ClientSlot {
    peer: DeviceAddress,
    client: BLEClient,
}

/// GATT client pool implementing [`TransportPort`].
pub struct NimbleTransport {
    slots: heapless::Vec<ClientSlot, MAX_CLIENTS>,
    inbox: Arc<EventInbox>,
}

impl NimbleTransport {
    /// `inbox` receives every notification from subscribed characteristics.
    pub fn new(inbox: Arc<EventInbox>) -> Self {
        Self {
            slots: heapless::Vec::new(),
            inbox,
        }
    }

    fn slot_mut(&mut self, connection: ConnectionHandle) -> Result<&mut ClientSlot, TransportError> {
        self.slots
            .get_mut(connection.0 as usize)
            .ok_or(TransportError::NotConnected)
    }

    /// Look the characteristic up again; the client caches discovery results.
    fn remote(
        &mut self,
        handle: &CharacteristicHandle,
    ) -> Result<(DeviceAddress, &mut BLERemoteCharacteristic), TransportError> {
        let slot = self.slot_mut(handle.connection)?;
        if !slot.client.connected() {
            return Err(TransportError::NotConnected);
        }
        let peer = slot.peer;
        let client = &mut slot.client;
        let (service, characteristic) = (handle.service, handle.characteristic);
        let remote = block_on(async move {
            let service = client
                .get_service(ble_uuid(service))
                .await
                .map_err(|_| TransportError::ServiceNotFound)?;
            service
                .get_characteristic(ble_uuid(characteristic))
                .await
                .map_err(|_| TransportError::CharacteristicNotFound)
        })?;
        Ok((peer, remote))
    }

    fn open_client(address: &DeviceAddress) -> Result<BLEClient, TransportError> {
        let mut client = BLEClient::new();
        client.set_connection_params(
            CONN_INTERVAL,
            CONN_INTERVAL,
            CONN_LATENCY,
            CONN_SUPERVISION_TIMEOUT,
            CONN_SCAN_INTERVAL,
            CONN_SCAN_WINDOW,
        );
        client.set_connect_timeout(CONNECT_TIMEOUT);
        block_on(client.connect(&ble_address(address))).map_err(|e| {
            warn!("BLE: connect to {} failed: {:?}", address, e);
            TransportError::ConnectFailed
        })?;
        Ok(client)
    }
}

impl TransportPort for NimbleTransport {
    fn connect(&mut self, address: &DeviceAddress) -> Result<ConnectionHandle, TransportError> {
        let handle;
        if let Some(index) = self.slots.iter().position(|s| s.peer == *address) {
            handle = ConnectionHandle(index as u16);
            let slot = self.slot_mut(handle)?;
            if !slot.client.connected() {
                debug!("BLE: reconnecting cached client for {}", address);
                block_on(slot.client.connect(&ble_address(address))).map_err(|e| {
                    warn!("BLE: reconnect to {} failed: {:?}", address, e);
                    TransportError::ConnectFailed
                })?;
            }
        } else {
            if self.slots.is_full() {
                warn!("BLE: client pool full ({}), refusing {}", MAX_CLIENTS, address);
                return Err(TransportError::ConnectFailed);
            }
            let client = Self::open_client(address)?;
            handle = ConnectionHandle(self.slots.len() as u16);
            self.slots
                .push(ClientSlot { peer: *address, client })
                .map_err(|_| TransportError::ConnectFailed)?;
        }

        let slot = self.slot_mut(handle)?;
        match slot.client.get_rssi() {
            Ok(rssi) => info!("BLE: connected to {} (RSSI {} dBm)", address, rssi),
            Err(_) => info!("BLE: connected to {}", address),
        }
        Ok(handle)
    }

    fn characteristic(
        &mut self,
        connection: ConnectionHandle,
        service: u128,
        characteristic: u128,
    ) -> Result<CharacteristicHandle, TransportError> {
        let handle = CharacteristicHandle {
            connection,
            service,
            characteristic,
        };
        self.remote(&handle)?;
        Ok(handle)
    }

    fn read(&mut self, handle: &CharacteristicHandle) -> Result<(), TransportError> {
        let (_, remote) = self.remote(handle)?;
        if !remote.can_read() {
            return Err(TransportError::Unsupported);
        }
        block_on(remote.read_value())
            .map(|_| ())
            .map_err(|_| TransportError::Rejected)
    }

    fn write(
        &mut self,
        handle: &CharacteristicHandle,
        data: &[u8],
        with_response: bool,
    ) -> Result<(), TransportError> {
        let (_, remote) = self.remote(handle)?;
        block_on(remote.write_value(data, with_response)).map_err(|_| TransportError::Rejected)
    }

    fn subscribe(&mut self, handle: &CharacteristicHandle) -> Result<(), TransportError> {
        let inbox = Arc::clone(&self.inbox);
        let characteristic = handle.characteristic;
        let (peer, remote) = self.remote(handle)?;
        if !remote.can_notify() {
            return Err(TransportError::Unsupported);
        }
        remote.on_notify(move |data| {
            if !inbox.push_notification(characteristic, peer, data) {
                warn!("BLE: notification from {} dropped ({} bytes)", peer, data.len());
            }
        });
        block_on(remote.subscribe_notify(false)).map_err(|_| TransportError::Rejected)
    }

    fn unsubscribe(&mut self, handle: &CharacteristicHandle) -> Result<(), TransportError> {
        let (_, remote) = self.remote(handle)?;
        block_on(remote.unsubscribe()).map_err(|_| TransportError::Rejected)
    }

    fn disconnect(&mut self, connection: ConnectionHandle) {
        if let Ok(slot) = self.slot_mut(connection) {
            if let Err(e) = slot.client.disconnect() {
                debug!("BLE: disconnect from {} failed: {:?}", slot.peer, e);
            }
        }
    }

    fn is_connected(&self, connection: ConnectionHandle) -> bool {
        self.slots
            .get(connection.0 as usize)
            .is_some_and(|s| s.client.connected())
    }
}

// ───────────────────────────────────────────────────────────────
// Scanner
// ───────────────────────────────────────────────────────────────

/// Run an active scan for `duration_ms`, queueing each advertiser that
/// offers the thermostat service once.  Blocks until the scan window closes.
pub fn scan(inbox: &EventInbox, duration_ms: i32) -> Result<(), TransportError> {
    let device = BLEDevice::take();
    let mut ble_scan = BLEScan::new();
    ble_scan
        .active_scan(true)
        .interval(SCAN_INTERVAL_UNITS)
        .window(SCAN_WINDOW_UNITS);

    let mut batch = ScanBatch::new(inbox);
    info!("BLE: scanning for {} ms", duration_ms);
    block_on(ble_scan.start(device, duration_ms, |found, data| {
        let mut advertisement = Advertisement::new(DeviceAddress::new(found.addr().as_be_bytes()));
        advertisement.rssi = i8::try_from(found.rssi()).ok();
        for uuid in data.service_uuids() {
            if let BleUuid::Uuid128(bytes) = uuid {
                advertisement = advertisement.with_service(u128::from_le_bytes(bytes));
            }
        }
        if batch.offer(advertisement) == ScanOffer::Dropped {
            warn!("BLE: inbox full, advert from {} dropped", found.addr());
        }
        None::<()>
    }))
    .map_err(|e| {
        warn!("BLE: scan failed: {:?}", e);
        TransportError::Rejected
    })?;

    debug!("BLE: scan queued {} thermostat(s)", batch.len());
    Ok(())
}

