//! Fuzz target: `DeviceAddress::from_str`
//!
//! Any string that parses must print back to its lowercase form.
//!
//! cargo fuzz run fuzz_address_parse

#![no_main]

use eq3_trv::address::DeviceAddress;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(address) = text.parse::<DeviceAddress>() {
        assert_eq!(address.to_string(), text.to_ascii_lowercase());
    }
});
