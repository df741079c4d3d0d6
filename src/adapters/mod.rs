//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements     | Connects to                 |
//! |------------|----------------|-----------------------------|
//! | `log_sink` | EventSink      | Serial log output           |
//! | `nimble`   | TransportPort  | NimBLE GATT client + scanner|
//! | `time`     | ClockPort      | ESP32 system timer          |

pub mod log_sink;
#[cfg(feature = "espidf")]
pub mod nimble;
pub mod time;
