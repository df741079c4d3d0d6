//! Port traits: the hexagonal boundary between the driver and the BLE stack.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ TrvDriver (domain)
//! ```
//!
//! Driven adapters (NimBLE client, system timer, log output) implement
//! these traits.  The [`TrvDriver`](super::service::TrvDriver) owns them
//! via generics, so the command state machine never touches the radio
//! directly and runs unchanged against mocks on the host.

use core::fmt;

use crate::address::DeviceAddress;

// ───────────────────────────────────────────────────────────────
// Handles
// ───────────────────────────────────────────────────────────────

/// Opaque connection handle issued by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionHandle(pub u16);

/// A resolved GATT characteristic on an open connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CharacteristicHandle {
    pub connection: ConnectionHandle,
    pub service: u128,
    pub characteristic: u128,
}

// ───────────────────────────────────────────────────────────────
// Transport port (driven adapter: domain ↔ BLE central)
// ───────────────────────────────────────────────────────────────

/// GATT client operations the command state machine needs.
///
/// Notifications are not returned from any method: the adapter pushes them
/// into the driver's [`EventInbox`](crate::events::EventInbox) from its own
/// callback context.
pub trait TransportPort {
    /// Open a connection to `address`, or reuse an existing client for it.
    fn connect(&mut self, address: &DeviceAddress) -> Result<ConnectionHandle, TransportError>;

    /// Resolve `characteristic` inside `service` on an open connection.
    fn characteristic(
        &mut self,
        connection: ConnectionHandle,
        service: u128,
        characteristic: u128,
    ) -> Result<CharacteristicHandle, TransportError>;

    /// Read the characteristic once.  The value is discarded; the read only
    /// starts whatever authentication the peer requires.
    fn read(&mut self, handle: &CharacteristicHandle) -> Result<(), TransportError>;

    /// Write `data`, optionally waiting for the peer's write response.
    fn write(
        &mut self,
        handle: &CharacteristicHandle,
        data: &[u8],
        with_response: bool,
    ) -> Result<(), TransportError>;

    /// Enable notifications on the characteristic.
    fn subscribe(&mut self, handle: &CharacteristicHandle) -> Result<(), TransportError>;

    /// Disable notifications on the characteristic.
    fn unsubscribe(&mut self, handle: &CharacteristicHandle) -> Result<(), TransportError>;

    /// Release the connection back to the stack.
    fn disconnect(&mut self, connection: ConnectionHandle);

    /// Whether the link is still up.
    fn is_connected(&self, connection: ConnectionHandle) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: domain → system timer)
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock plus a blocking delay.
pub trait ClockPort {
    /// Milliseconds since an arbitrary fixed origin; never goes backwards.
    fn now_ms(&self) -> u64;

    /// Block the calling task for `ms` milliseconds.
    fn delay_ms(&self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The driver emits structured [`DriverEvent`](super::events::DriverEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::DriverEvent);
}

/// Sink that drops every event.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &super::events::DriverEvent) {}
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`TransportPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The peer did not accept the connection (or no client slot was free).
    ConnectFailed,
    /// The connection dropped underneath the operation.
    NotConnected,
    /// The requested GATT service is not present.
    ServiceNotFound,
    /// The service lacks the requested characteristic.
    CharacteristicNotFound,
    /// The characteristic does not support the operation (read / notify).
    Unsupported,
    /// The peer rejected the request.
    Rejected,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed => write!(f, "connect failed"),
            Self::NotConnected => write!(f, "not connected"),
            Self::ServiceNotFound => write!(f, "service not found"),
            Self::CharacteristicNotFound => write!(f, "characteristic not found"),
            Self::Unsupported => write!(f, "operation not supported by characteristic"),
            Self::Rejected => write!(f, "rejected by peer"),
        }
    }
}
