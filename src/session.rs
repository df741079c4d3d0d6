//! The single active GATT session.
//!
//! A [`Session`] exists only between a successful [`Session::open`] and
//! [`Session::close`].  The driver keeps it in an `Option`, so "no session"
//! and "session with dangling handles" cannot both be represented.

use log::{debug, info};

use crate::address::DeviceAddress;
use crate::app::ports::{CharacteristicHandle, ConnectionHandle, TransportError, TransportPort};
use crate::codec::{COMMAND_CHAR_UUID, NOTIFY_CHAR_UUID, SERVICE_UUID};
use crate::error::CommandError;

/// Handles held for the duration of one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub target: DeviceAddress,
    pub connection: ConnectionHandle,
    pub command: CharacteristicHandle,
    pub notify: CharacteristicHandle,
}

impl Session {
    /// Connect to `target`, resolve both characteristics, prime them with a
    /// read and subscribe to notifications.
    ///
    /// On failure any connection that was opened is released before the
    /// error is returned.
    pub fn open<T: TransportPort>(
        transport: &mut T,
        target: DeviceAddress,
    ) -> Result<Self, CommandError> {
        let connection = transport.connect(&target).map_err(|e| {
            debug!("connect to {} failed: {}", target, e);
            CommandError::ConnectFailed
        })?;

        match Self::prepare(transport, target, connection) {
            Ok(session) => {
                info!("session open: {}", target);
                Ok(session)
            }
            Err(err) => {
                if transport.is_connected(connection) {
                    transport.disconnect(connection);
                }
                Err(err)
            }
        }
    }

    fn prepare<T: TransportPort>(
        transport: &mut T,
        target: DeviceAddress,
        connection: ConnectionHandle,
    ) -> Result<Self, CommandError> {
        let command = transport
            .characteristic(connection, SERVICE_UUID, COMMAND_CHAR_UUID)
            .map_err(lookup_error)?;
        let notify = transport
            .characteristic(connection, SERVICE_UUID, NOTIFY_CHAR_UUID)
            .map_err(lookup_error)?;

        // Reading once makes the stack run pairing if the thermostat asks for it.
        for handle in [&command, &notify] {
            if let Err(e) = transport.read(handle) {
                debug!("priming read on {} ignored: {}", target, e);
            }
        }

        transport.subscribe(&notify).map_err(|e| {
            debug!("subscribe on {} failed: {}", target, e);
            CommandError::SubscribeFailed
        })?;

        Ok(Self {
            target,
            connection,
            command,
            notify,
        })
    }

    /// Write an encoded command frame, waiting for the write response.
    pub fn write_frame<T: TransportPort>(
        &self,
        transport: &mut T,
        frame: &[u8],
    ) -> Result<(), CommandError> {
        transport.write(&self.command, frame, true).map_err(|e| {
            debug!("write to {} failed: {}", self.target, e);
            CommandError::WriteFailed
        })
    }

    /// Unsubscribe and release the connection.  Consumes the session.
    pub fn close<T: TransportPort>(self, transport: &mut T) {
        if transport.is_connected(self.connection) {
            if let Err(e) = transport.unsubscribe(&self.notify) {
                debug!("unsubscribe on {} failed: {}", self.target, e);
            }
            transport.disconnect(self.connection);
        }
        info!("session closed: {}", self.target);
    }
}

fn lookup_error(err: TransportError) -> CommandError {
    match err {
        TransportError::NotConnected | TransportError::ConnectFailed => CommandError::ConnectFailed,
        _ => CommandError::ServiceNotFound,
    }
}
