//! Outbound driver events.
//!
//! The [`TrvDriver`](super::service::TrvDriver) emits these through the
//! [`EventSink`](super::ports::EventSink) port; the adapter decides where they go.

use crate::address::DeviceAddress;
use crate::error::CommandError;
use crate::registry::TrvStatus;

/// Structured events emitted by the driver core.
#[derive(Debug, Clone)]
pub enum DriverEvent {
    /// A thermostat was seen for the first time.
    DeviceDiscovered(DeviceAddress),

    /// A command frame was written and the driver is waiting for a report.
    CommandIssued {
        target: DeviceAddress,
        command: &'static str,
    },

    /// The awaited status report arrived.
    CommandCompleted(TrvStatus),

    /// The command failed; the target's record is now invalid.
    CommandFailed {
        target: DeviceAddress,
        error: CommandError,
    },

    /// A status report updated a record outside of any command.
    StatusUpdated(TrvStatus),
}
