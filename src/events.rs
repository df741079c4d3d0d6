//! Transport event inbox.
//!
//! Events are produced by the BLE host task:
//! - scan result callbacks (a thermostat advertised)
//! - GATT notification callbacks (a status report arrived)
//!
//! Events are consumed by the driver, which drains the inbox at the top of
//! every completion poll and processes them one at a time, in order.
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Scan callback   │────▶│  EventInbox  │────▶│  TrvDriver   │
//! │ Notify callback │────▶│  (bounded)   │     │  (consumer)  │
//! └─────────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! The lock is held only to push or pop a single event, never while a
//! handler runs, so a callback firing mid-drain just lands in the queue.

use std::sync::Mutex;

use heapless::{Deque, Vec};

use crate::address::DeviceAddress;
use crate::codec::SERVICE_UUID;

/// Maximum number of pending events.
pub const INBOX_CAPACITY: usize = 16;

/// Largest notification payload carried (one default-MTU ATT value).
pub const MAX_NOTIFICATION_LEN: usize = 20;

/// Service UUIDs kept per advertisement.
pub const MAX_ADVERTISED_SERVICES: usize = 4;

/// Distinct thermostats remembered during one scan window.
pub const MAX_SCAN_PEERS: usize = 32;

/// Advertisement data as delivered by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    pub address: DeviceAddress,
    /// Advertised 128-bit service UUIDs (excess entries dropped).
    pub services: Vec<u128, MAX_ADVERTISED_SERVICES>,
    pub rssi: Option<i8>,
}

impl Advertisement {
    pub fn new(address: DeviceAddress) -> Self {
        Self {
            address,
            services: Vec::new(),
            rssi: None,
        }
    }

    /// Builder-style helper; UUIDs past capacity are ignored.
    pub fn with_service(mut self, uuid: u128) -> Self {
        let _ = self.services.push(uuid);
        self
    }

    pub fn advertises(&self, uuid: u128) -> bool {
        self.services.contains(&uuid)
    }
}

/// Something the BLE stack reported asynchronously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    DeviceDiscovered(Advertisement),
    Notification {
        characteristic: u128,
        source: DeviceAddress,
        payload: Vec<u8, MAX_NOTIFICATION_LEN>,
    },
}

impl TransportEvent {
    /// Build a notification event.  `None` if the payload does not fit.
    pub fn notification(characteristic: u128, source: DeviceAddress, payload: &[u8]) -> Option<Self> {
        let payload = Vec::from_slice(payload).ok()?;
        Some(Self::Notification {
            characteristic,
            source,
            payload,
        })
    }
}

/// What [`ScanBatch::offer`] did with an advertisement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOffer {
    Queued,
    /// Address already queued in this batch.
    Duplicate,
    /// Not a thermostat.
    Ignored,
    /// Inbox full; a later advert from the same peer may still get in.
    Dropped,
}

/// Collects thermostat adverts for the duration of one scan.
///
/// The scanner reports each peer several times per window and the inbox
/// is only drained after the scan returns, so each address is queued at
/// most once per batch.
pub struct ScanBatch<'a> {
    inbox: &'a EventInbox,
    queued: Vec<DeviceAddress, MAX_SCAN_PEERS>,
}

impl<'a> ScanBatch<'a> {
    pub fn new(inbox: &'a EventInbox) -> Self {
        Self {
            inbox,
            queued: Vec::new(),
        }
    }

    /// Queue `advertisement` if it offers the thermostat service and its
    /// address has not been queued in this batch.
    pub fn offer(&mut self, advertisement: Advertisement) -> ScanOffer {
        if !advertisement.advertises(SERVICE_UUID) {
            return ScanOffer::Ignored;
        }
        let address = advertisement.address;
        if self.queued.contains(&address) {
            return ScanOffer::Duplicate;
        }
        if !self.inbox.push(TransportEvent::DeviceDiscovered(advertisement)) {
            return ScanOffer::Dropped;
        }
        // Past capacity repeats are pushed again; the inbox bound still holds.
        let _ = self.queued.push(address);
        ScanOffer::Queued
    }

    /// Distinct thermostats queued so far.
    pub fn len(&self) -> usize {
        self.queued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }
}

/// Bounded FIFO shared between the BLE host task and the driver.
pub struct EventInbox {
    queue: Mutex<Deque<TransportEvent, INBOX_CAPACITY>>,
}

impl Default for EventInbox {
    fn default() -> Self {
        Self::new()
    }
}

impl EventInbox {
    pub const fn new() -> Self {
        Self {
            queue: Mutex::new(Deque::new()),
        }
    }

    /// Push an event.  Returns `false` if the inbox is full (event dropped).
    pub fn push(&self, event: TransportEvent) -> bool {
        match self.queue.lock() {
            Ok(mut queue) => queue.push_back(event).is_ok(),
            Err(_) => false,
        }
    }

    /// Convenience for notification callbacks: copy the payload in and push.
    /// Returns `false` if the payload is oversized or the inbox is full.
    pub fn push_notification(&self, characteristic: u128, source: DeviceAddress, payload: &[u8]) -> bool {
        match TransportEvent::notification(characteristic, source, payload) {
            Some(event) => self.push(event),
            None => false,
        }
    }

    /// Pop the oldest event, if any.
    pub fn pop(&self) -> Option<TransportEvent> {
        self.queue.lock().ok()?.pop_front()
    }

    /// Drain all pending events into a callback, oldest first.
    pub fn drain(&self, mut handler: impl FnMut(TransportEvent)) {
        while let Some(event) = self.pop() {
            handler(event);
        }
    }

    pub fn len(&self) -> usize {
        self.queue.lock().map(|q| q.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
