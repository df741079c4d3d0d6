//! Fuzz target: `decode_status` + `TrvStatus::apply`
//!
//! Drives arbitrary notification payloads through the decoder and asserts
//! that only `{0x02, 0x01, ...}` payloads of at least six bytes are
//! accepted, and that applying an accepted report always yields a valid
//! record carrying the payload's valve and temperature bytes.
//!
//! cargo fuzz run fuzz_status_decoder

#![no_main]

use eq3_trv::address::DeviceAddress;
use eq3_trv::codec::decode_status;
use eq3_trv::registry::TrvStatus;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some(report) = decode_status(data) else {
        assert!(data.len() < 6 || data[..2] != [0x02, 0x01]);
        return;
    };

    assert!(data.len() >= 6 && data[..2] == [0x02, 0x01]);

    let mut status = TrvStatus::new(DeviceAddress::new([0; 6]));
    status.apply(&report);
    assert!(status.valid);
    assert_eq!(status.valve, data[3]);
    assert_eq!(status.temperature, data[5] as f32 / 2.0);
});
