#![no_main]

use libfuzzer_sys::fuzz_target;
use pico::raw::{detect_shift, parse_header, read_precursors};

fuzz_target!(|data: &[u8]| {
    if let Ok(header) = parse_header("fuzz.STS", data) {
        if let Some(records) = data.get(header.header_len..) {
            let _ = detect_shift(records, false);
            let _ = detect_shift(records, true);
        }
    }

    for type1_6 in [false, true] {
        for shifted in [false, true] {
            let _ = read_precursors("fuzz.STS", data, 64, type1_6, shifted);
        }
    }
});
