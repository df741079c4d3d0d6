//! Integration tests for the issue → notify → complete pipeline.

use crate::mock_ble::{TRV_A, TRV_B, TransportCall, make_driver, make_driver_with};

use eq3_trv::app::commands::CommandMode;
use eq3_trv::app::events::DriverEvent;
use eq3_trv::app::service::CompletionStatus;
use eq3_trv::codec::{COMMAND_CHAR_UUID, DeviceTime, HolidayEnd, NOTIFY_CHAR_UUID, SERVICE_UUID};
use eq3_trv::error::CommandError;
use eq3_trv::events::Advertisement;
use eq3_trv::fsm::StateId;

const STATUS_21_5: [u8; 6] = [0x02, 0x01, 0x00, 50, 0x00, 43];

// ── Async select-temperature scenario ─────────────────────────

#[test]
fn async_select_temperature_completes_on_matching_notification() {
    let (mut driver, _clock) = make_driver();

    driver
        .select_temperature(TRV_A, 21.5, CommandMode::Async)
        .unwrap();
    assert_eq!(driver.transport().writes(), vec![vec![0x41, 43]]);
    assert_eq!(driver.state(), StateId::AwaitingResult);
    assert_eq!(driver.poll_completion(), CompletionStatus::NoResult);

    assert!(
        driver
            .inbox()
            .push_notification(NOTIFY_CHAR_UUID, TRV_A, &STATUS_21_5)
    );
    assert_eq!(driver.poll_completion(), CompletionStatus::Success);
    assert!(driver.is_idle());

    let status = driver.status(&TRV_A).unwrap();
    assert!(status.valid);
    assert_eq!(status.temperature, 21.5);
    assert_eq!(status.valve, 50);

    let last = driver.take_last_result().unwrap();
    assert_eq!(last.address, TRV_A);
    assert!(last.valid);
}

#[test]
fn success_is_reported_once() {
    let (mut driver, _clock) = make_driver_with(|t| t.reply = Some(STATUS_21_5.to_vec()));
    driver.boost(TRV_A, true, CommandMode::Async).unwrap();
    assert_eq!(driver.poll_completion(), CompletionStatus::Success);
    assert_eq!(driver.poll_completion(), CompletionStatus::NoResult);
}

// ── Session call sequence ─────────────────────────────────────

#[test]
fn session_opens_primes_subscribes_then_writes_with_response() {
    let (mut driver, _clock) = make_driver_with(|t| t.reply = Some(STATUS_21_5.to_vec()));

    driver.lock(TRV_A, true, CommandMode::Sync).unwrap();

    assert_eq!(
        driver.transport().calls,
        vec![
            TransportCall::Connect(TRV_A),
            TransportCall::Lookup {
                service: SERVICE_UUID,
                characteristic: COMMAND_CHAR_UUID
            },
            TransportCall::Lookup {
                service: SERVICE_UUID,
                characteristic: NOTIFY_CHAR_UUID
            },
            TransportCall::Read(COMMAND_CHAR_UUID),
            TransportCall::Read(NOTIFY_CHAR_UUID),
            TransportCall::Subscribe(NOTIFY_CHAR_UUID),
            TransportCall::Write {
                data: vec![0x80, 0x01],
                with_response: true
            },
            TransportCall::Unsubscribe(NOTIFY_CHAR_UUID),
            TransportCall::Disconnect,
        ]
    );
    assert!(!driver.transport().connected);
}

#[test]
fn priming_read_failure_is_not_fatal() {
    let (mut driver, _clock) = make_driver_with(|t| {
        t.fail_read = true;
        t.reply = Some(STATUS_21_5.to_vec());
    });
    assert_eq!(driver.select_comfort(TRV_A, CommandMode::Sync), Ok(()));
    assert!(driver.status(&TRV_A).unwrap().valid);
}

// ── Sync mode ─────────────────────────────────────────────────

#[test]
fn sync_command_returns_after_reply() {
    let (mut driver, clock) = make_driver_with(|t| t.reply = Some(vec![0x02, 0x01, 0x09, 0, 0x04, 40]));

    assert_eq!(driver.set_mode(TRV_A, false, CommandMode::Sync), Ok(()));
    assert!(driver.is_idle());
    assert!(clock.now() < 5_000);

    let status = driver.status(&TRV_A).unwrap();
    assert!(!status.auto_mode);
    assert!(status.dst);
    assert_eq!(status.temperature, 20.0);
}

#[test]
fn sync_command_times_out_without_reply() {
    let (mut driver, clock) = make_driver();
    assert_eq!(
        driver.select_reduced(TRV_A, CommandMode::Sync),
        Err(CommandError::Timeout)
    );
    assert!(clock.now() >= 5_000);
    assert!(driver.is_idle());
    assert!(!driver.status(&TRV_A).unwrap().valid);
}

// ── Busy rejection ────────────────────────────────────────────

#[test]
fn second_command_while_awaiting_is_busy_and_changes_nothing() {
    let (mut driver, _clock) = make_driver();
    driver.boost(TRV_A, true, CommandMode::Async).unwrap();
    let calls_before = driver.transport().calls.clone();

    assert_eq!(
        driver.select_temperature(TRV_B, 19.0, CommandMode::Async),
        Err(CommandError::Busy)
    );
    assert_eq!(
        driver.boost(TRV_A, false, CommandMode::Sync),
        Err(CommandError::Busy)
    );

    assert_eq!(driver.transport().calls, calls_before);
    assert_eq!(driver.state(), StateId::AwaitingResult);
    assert!(driver.status(&TRV_B).is_none());

    driver
        .inbox()
        .push_notification(NOTIFY_CHAR_UUID, TRV_A, &STATUS_21_5);
    assert_eq!(driver.poll_completion(), CompletionStatus::Success);
}

// ── Timeout ───────────────────────────────────────────────────

#[test]
fn timeout_fires_exactly_at_deadline() {
    let (mut driver, clock) = make_driver();
    clock.set(1_000);
    driver.off(TRV_A, CommandMode::Async).unwrap();

    clock.set(5_999);
    assert_eq!(driver.poll_completion(), CompletionStatus::NoResult);

    clock.set(6_000);
    assert_eq!(
        driver.poll_completion(),
        CompletionStatus::Error(CommandError::Timeout)
    );
    assert!(driver.is_idle());
    assert!(!driver.status(&TRV_A).unwrap().valid);
    assert!(!driver.transport().connected);
    assert!(!driver.is_scan_interval_expired());

    let last = driver.take_last_result().unwrap();
    assert!(!last.valid);
}

#[test]
fn late_notification_after_timeout_only_updates_registry() {
    let (mut driver, clock) = make_driver();
    driver.on(TRV_A, CommandMode::Async).unwrap();
    clock.advance(5_000);
    assert_eq!(
        driver.poll_completion(),
        CompletionStatus::Error(CommandError::Timeout)
    );

    driver
        .inbox()
        .push_notification(NOTIFY_CHAR_UUID, TRV_A, &STATUS_21_5);
    assert_eq!(driver.poll_completion(), CompletionStatus::NoResult);
    assert!(driver.status(&TRV_A).unwrap().valid);
    assert!(
        driver
            .sink()
            .events
            .iter()
            .any(|e| matches!(e, DriverEvent::StatusUpdated(s) if s.address == TRV_A))
    );
}

// ── Correlation ───────────────────────────────────────────────

#[test]
fn notification_from_other_device_does_not_complete() {
    let (mut driver, _clock) = make_driver();
    driver.on_device_discovered(&Advertisement::new(TRV_A).with_service(SERVICE_UUID));
    driver.select_comfort(TRV_B, CommandMode::Async).unwrap();

    driver
        .inbox()
        .push_notification(NOTIFY_CHAR_UUID, TRV_A, &STATUS_21_5);
    assert_eq!(driver.poll_completion(), CompletionStatus::NoResult);
    assert_eq!(driver.state(), StateId::AwaitingResult);

    // The bystander's record is still refreshed.
    assert!(driver.status(&TRV_A).unwrap().valid);
    assert!(!driver.status(&TRV_B).unwrap().valid);
}

#[test]
fn non_status_payload_leaves_record_and_command_untouched() {
    let (mut driver, _clock) = make_driver();
    driver.lock(TRV_A, false, CommandMode::Async).unwrap();
    let before = *driver.status(&TRV_A).unwrap();

    driver
        .inbox()
        .push_notification(NOTIFY_CHAR_UUID, TRV_A, &[0x02, 0x02, 0x01]);
    driver
        .inbox()
        .push_notification(NOTIFY_CHAR_UUID, TRV_A, &[0x01, 0x01, 0x00, 10, 0x00, 40]);
    assert_eq!(driver.poll_completion(), CompletionStatus::NoResult);
    assert_eq!(*driver.status(&TRV_A).unwrap(), before);
}

#[test]
fn notification_on_command_characteristic_is_ignored() {
    let (mut driver, _clock) = make_driver();
    driver.lock(TRV_A, true, CommandMode::Async).unwrap();
    driver
        .inbox()
        .push_notification(COMMAND_CHAR_UUID, TRV_A, &STATUS_21_5);
    assert_eq!(driver.poll_completion(), CompletionStatus::NoResult);
    assert!(!driver.status(&TRV_A).unwrap().valid);
}

// ── Frames for every operation ────────────────────────────────

#[test]
fn every_operation_writes_its_frame() {
    let (mut driver, _clock) = make_driver_with(|t| t.reply = Some(STATUS_21_5.to_vec()));
    let sync = CommandMode::Sync;

    driver.select_temperature(TRV_A, 21.5, sync).unwrap();
    driver.set_temperatures(TRV_A, 21.0, 17.0, sync).unwrap();
    driver.select_comfort(TRV_A, sync).unwrap();
    driver.select_reduced(TRV_A, sync).unwrap();
    driver
        .set_clock(
            TRV_A,
            DeviceTime {
                year: 2026,
                month: 10,
                day: 17,
                hour: 8,
                minute: 30,
                second: 5,
            },
            sync,
        )
        .unwrap();
    driver.boost(TRV_A, true, sync).unwrap();
    driver
        .holiday(
            TRV_A,
            12.0,
            HolidayEnd {
                year: 2026,
                month: 12,
                day: 24,
                hour: 18,
                minute: 30,
            },
            sync,
        )
        .unwrap();
    driver.lock(TRV_A, true, sync).unwrap();
    driver.offset(TRV_A, -1.5, sync).unwrap();
    driver.window_open(TRV_A, 12.0, 15, sync).unwrap();
    driver.set_mode(TRV_A, true, sync).unwrap();
    driver.set_mode(TRV_A, false, sync).unwrap();
    driver.on(TRV_A, sync).unwrap();
    driver.off(TRV_A, sync).unwrap();

    assert_eq!(
        driver.transport().writes(),
        vec![
            vec![0x41, 43],
            vec![0x11, 42, 34],
            vec![0x43],
            vec![0x44],
            vec![0x03, 26, 10, 17, 8, 30, 5],
            vec![0x45, 1],
            vec![0x40, 24 | 0x80, 24, 26, 37, 12],
            vec![0x80, 1],
            vec![0x13, 4],
            vec![0x14, 24, 3],
            vec![0x40, 0x00],
            vec![0x40, 0x40],
            vec![0x41, 60],
            vec![0x41, 9],
        ]
    );
}

#[test]
fn command_events_are_emitted() {
    let (mut driver, _clock) = make_driver_with(|t| t.reply = Some(STATUS_21_5.to_vec()));
    driver.boost(TRV_A, false, CommandMode::Sync).unwrap();

    let events = &driver.sink().events;
    assert!(matches!(events[0], DriverEvent::DeviceDiscovered(a) if a == TRV_A));
    assert!(matches!(
        events[1],
        DriverEvent::CommandIssued { target, command: "boost" } if target == TRV_A
    ));
    assert!(matches!(events[2], DriverEvent::CommandCompleted(s) if s.valid));
}
