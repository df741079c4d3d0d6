//! Integration tests for every failing step of session setup.
//!
//! Each failure must release whatever was opened, invalidate the target,
//! re-arm the scan timer and leave the driver idle and usable.

use crate::mock_ble::{TRV_A, TestDriver, TransportCall, make_driver_with};

use eq3_trv::app::commands::CommandMode;
use eq3_trv::app::events::DriverEvent;
use eq3_trv::codec::{COMMAND_CHAR_UUID, NOTIFY_CHAR_UUID};
use eq3_trv::error::CommandError;

const STATUS: [u8; 6] = [0x02, 0x01, 0x20, 0, 0x04, 42];

fn assert_settled_after_failure(driver: &mut TestDriver) {
    assert!(driver.is_idle());
    assert!(!driver.transport().connected);
    assert!(!driver.status(&TRV_A).unwrap().valid);
    assert!(!driver.is_scan_interval_expired());
    assert!(!driver.take_last_result().unwrap().valid);
    assert!(matches!(
        driver.sink().events.last(),
        Some(DriverEvent::CommandFailed { target, .. }) if *target == TRV_A
    ));
}

#[test]
fn connect_refused() {
    let (mut driver, _clock) = make_driver_with(|t| t.fail_connect = true);

    assert_eq!(
        driver.boost(TRV_A, true, CommandMode::Async),
        Err(CommandError::ConnectFailed)
    );
    assert_settled_after_failure(&mut driver);
    assert_eq!(driver.transport().calls, vec![TransportCall::Connect(TRV_A)]);
}

#[test]
fn command_characteristic_missing() {
    let (mut driver, _clock) = make_driver_with(|t| t.missing_characteristic = Some(COMMAND_CHAR_UUID));

    assert_eq!(
        driver.lock(TRV_A, true, CommandMode::Sync),
        Err(CommandError::ServiceNotFound)
    );
    assert_settled_after_failure(&mut driver);
    assert_eq!(driver.transport().calls.last(), Some(&TransportCall::Disconnect));
    assert!(driver.transport().writes().is_empty());
}

#[test]
fn notify_characteristic_missing() {
    let (mut driver, _clock) = make_driver_with(|t| t.missing_characteristic = Some(NOTIFY_CHAR_UUID));

    assert_eq!(
        driver.on(TRV_A, CommandMode::Async),
        Err(CommandError::ServiceNotFound)
    );
    assert_settled_after_failure(&mut driver);
}

#[test]
fn subscribe_refused() {
    let (mut driver, _clock) = make_driver_with(|t| t.fail_subscribe = true);

    assert_eq!(
        driver.off(TRV_A, CommandMode::Async),
        Err(CommandError::SubscribeFailed)
    );
    assert_settled_after_failure(&mut driver);
    assert!(driver.transport().writes().is_empty());
    assert_eq!(
        driver
            .transport()
            .count(|c| matches!(c, TransportCall::Disconnect)),
        1
    );
}

#[test]
fn write_refused_tears_down_full_session() {
    let (mut driver, _clock) = make_driver_with(|t| t.fail_write = true);

    assert_eq!(
        driver.select_temperature(TRV_A, 22.0, CommandMode::Sync),
        Err(CommandError::WriteFailed)
    );
    assert_settled_after_failure(&mut driver);

    let calls = &driver.transport().calls;
    let n = calls.len();
    assert_eq!(calls[n - 2], TransportCall::Unsubscribe(NOTIFY_CHAR_UUID));
    assert_eq!(calls[n - 1], TransportCall::Disconnect);
}

#[test]
fn failure_invalidates_previously_valid_record() {
    let (mut driver, _clock) = make_driver_with(|t| t.reply = Some(STATUS.to_vec()));
    driver.boost(TRV_A, true, CommandMode::Sync).unwrap();
    assert!(driver.status(&TRV_A).unwrap().locked);
    assert!(driver.status(&TRV_A).unwrap().valid);

    driver.transport_mut().fail_write = true;
    assert_eq!(
        driver.boost(TRV_A, false, CommandMode::Sync),
        Err(CommandError::WriteFailed)
    );
    assert!(!driver.status(&TRV_A).unwrap().valid);
}

#[test]
fn driver_recovers_after_failure() {
    let (mut driver, _clock) = make_driver_with(|t| {
        t.fail_connect = true;
        t.reply = Some(STATUS.to_vec());
    });
    assert!(driver.set_mode(TRV_A, true, CommandMode::Sync).is_err());

    driver.transport_mut().fail_connect = false;
    assert_eq!(driver.set_mode(TRV_A, true, CommandMode::Sync), Ok(()));
    assert!(driver.status(&TRV_A).unwrap().valid);
    assert!(driver.take_last_result().unwrap().valid);
}
