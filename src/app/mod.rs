//! Application core: the driver's command logic, zero I/O.
//!
//! This module contains the rules for talking to thermostats: one command
//! in flight, notification correlation, timeouts and teardown.  All
//! interaction with the radio and the clock happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable
//! without a BLE stack.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
