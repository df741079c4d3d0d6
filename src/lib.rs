//! EQ-3 Bluetooth radiator thermostat driver.
//!
//! Exposes the pure-logic modules (codec, registry, command state machine)
//! for integration testing on the host.  The NimBLE transport and the
//! firmware entry point are only built with the `espidf` feature.

#![deny(unused_must_use)]

pub mod address;
pub mod adapters;
pub mod app;
pub mod codec;
pub mod config;
pub mod error;
pub mod events;
pub mod fsm;
pub mod registry;
pub mod scan_timer;
pub mod session;
