#![no_main]

use libfuzzer_sys::fuzz_target;
use pico::raw::{detect_record_size, parse_idx, IDX_RECORD_SIZES};

fuzz_target!(|data: &[u8]| {
    // Size detection and parsing must reject bad input without panicking
    let _ = detect_record_size(&[data.len()], Some(data));

    for size in IDX_RECORD_SIZES {
        if let Ok(records) = parse_idx("fuzz.IDX", data, size) {
            for record in records {
                let _ = record.retention_time_secs();
                let _ = record.is_centroid();
            }
        }
    }
});
