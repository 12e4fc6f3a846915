//! Fuzz target: `NmeaDecoder::push_all`
//!
//! Streams arbitrary bytes from the GPS UART into the decoder and checks
//! that it never panics and that any fix it reports is a real position.
//!
//! cargo fuzz run fuzz_nmea

#![no_main]

use libfuzzer_sys::fuzz_target;
use orion::drivers::nmea::{NmeaDecoder, parse_gga};

fuzz_target!(|data: &[u8]| {
    let mut decoder = NmeaDecoder::new();
    decoder.push_all(data);

    if let Some(fix) = decoder.fix() {
        assert!(fix.lat.is_finite() && (-90.0..=90.0).contains(&fix.lat));
        assert!(fix.lon.is_finite() && (-180.0..=180.0).contains(&fix.lon));
        assert!(decoder.sentences() > 0, "fix without a sentence");
    }

    // Same bytes as one sentence string.
    if let Ok(text) = core::str::from_utf8(data) {
        let _ = parse_gga(text);
    }

    decoder.reset();
    assert!(decoder.fix().is_none());
});
