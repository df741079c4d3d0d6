//! BLE device address.

use core::fmt;
use core::str::FromStr;

use crate::error::AddressParseError;

/// A 6-byte BLE hardware address, most significant byte first.
///
/// Displays and parses in the canonical `aa:bb:cc:dd:ee:ff` form used by
/// the BLE stack (parsing accepts either case).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceAddress([u8; 6]);

impl DeviceAddress {
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl From<[u8; 6]> for DeviceAddress {
    fn from(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl FromStr for DeviceAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 6];
        let mut groups = s.split(':');
        for byte in &mut bytes {
            let group = groups.next().ok_or(AddressParseError::WrongLength)?;
            if group.len() != 2 || !group.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(AddressParseError::InvalidHex);
            }
            *byte = u8::from_str_radix(group, 16).map_err(|_| AddressParseError::InvalidHex)?;
        }
        if groups.next().is_some() {
            return Err(AddressParseError::WrongLength);
        }
        Ok(Self(bytes))
    }
}
