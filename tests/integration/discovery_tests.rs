//! Integration tests for the event adapter: scan results and notifications
//! arriving through the inbox outside of any command.

use crate::mock_ble::{TRV_A, TRV_B, make_driver};

use eq3_trv::address::DeviceAddress;
use eq3_trv::app::events::DriverEvent;
use eq3_trv::app::service::CompletionStatus;
use eq3_trv::codec::{NOTIFY_CHAR_UUID, SERVICE_UUID};
use eq3_trv::events::{Advertisement, ScanBatch, ScanOffer, TransportEvent};

fn advert(address: DeviceAddress) -> TransportEvent {
    TransportEvent::DeviceDiscovered(Advertisement::new(address).with_service(SERVICE_UUID))
}

#[test]
fn discovered_devices_are_listed_once() {
    let (mut driver, _clock) = make_driver();
    let inbox = driver.inbox();

    inbox.push(advert(TRV_A));
    inbox.push(advert(TRV_B));
    inbox.push(advert(TRV_A));
    driver.process_events();

    let mut known: Vec<DeviceAddress> = driver.known_addresses().copied().collect();
    known.sort();
    assert_eq!(known, vec![TRV_A, TRV_B]);

    let discovered = driver
        .sink()
        .events
        .iter()
        .filter(|e| matches!(e, DriverEvent::DeviceDiscovered(_)))
        .count();
    assert_eq!(discovered, 2);
}

#[test]
fn repeated_adverts_do_not_crowd_out_later_devices() {
    let (mut driver, _clock) = make_driver();
    let inbox = driver.inbox();
    let mut batch = ScanBatch::new(&inbox);

    for _ in 0..20 {
        batch.offer(Advertisement::new(TRV_A).with_service(SERVICE_UUID));
    }
    assert_eq!(
        batch.offer(Advertisement::new(TRV_B).with_service(SERVICE_UUID)),
        ScanOffer::Queued
    );
    driver.process_events();

    let mut known: Vec<DeviceAddress> = driver.known_addresses().copied().collect();
    known.sort();
    assert_eq!(known, vec![TRV_A, TRV_B]);
}

#[test]
fn new_devices_start_invalid() {
    let (mut driver, _clock) = make_driver();
    driver.inbox().push(advert(TRV_A));
    driver.process_events();
    assert!(!driver.status(&TRV_A).unwrap().valid);
}

#[test]
fn advert_without_service_ignored() {
    let (mut driver, _clock) = make_driver();
    driver
        .inbox()
        .push(TransportEvent::DeviceDiscovered(Advertisement::new(TRV_A).with_service(0x180f)));
    driver.process_events();
    assert_eq!(driver.known_addresses().count(), 0);
}

#[test]
fn events_are_drained_by_poll() {
    let (mut driver, _clock) = make_driver();
    driver.inbox().push(advert(TRV_B));
    assert_eq!(driver.poll_completion(), CompletionStatus::NoResult);
    assert!(driver.status(&TRV_B).is_some());
    assert!(driver.inbox().is_empty());
}

#[test]
fn notification_without_session_updates_registry() {
    let (mut driver, _clock) = make_driver();
    let inbox = driver.inbox();
    inbox.push(advert(TRV_A));
    inbox.push_notification(NOTIFY_CHAR_UUID, TRV_A, &[0x02, 0x01, 0xb4, 75, 0x04, 38]);
    driver.process_events();

    let status = driver.status(&TRV_A).unwrap();
    assert!(status.valid);
    assert_eq!(status.valve, 75);
    assert_eq!(status.temperature, 19.0);
    assert!(status.boost);
    assert!(status.window_open);
    assert!(status.locked);
    assert!(status.low_battery);
    assert!(status.auto_mode);
    assert!(!status.holiday);
    assert!(driver.take_last_result().is_none());
}

#[test]
fn notification_from_unknown_device_ignored() {
    let (mut driver, _clock) = make_driver();
    driver
        .inbox()
        .push_notification(NOTIFY_CHAR_UUID, TRV_A, &[0x02, 0x01, 0x00, 10, 0x04, 40]);
    driver.process_events();
    assert!(driver.status(&TRV_A).is_none());
    assert!(driver.sink().events.is_empty());
}

#[test]
fn scan_interval_controls() {
    let (mut driver, clock) = make_driver();
    assert!(driver.is_scan_interval_expired());

    driver.trigger_scan_interval();
    assert!(!driver.is_scan_interval_expired());

    clock.advance(59_999);
    assert!(!driver.is_scan_interval_expired());
    clock.advance(1);
    assert!(driver.is_scan_interval_expired());
}
