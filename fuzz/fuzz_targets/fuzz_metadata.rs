#![no_main]

use libfuzzer_sys::fuzz_target;
use pico::calibration::CalibrationTable;
use pico::classify::{classify, parse_functns, parse_inlet, ExternInfo};
use pico::raw::parse_chroms_inf;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);

    let ext = ExternInfo::parse(&text).ok();
    let records = parse_functns(data);
    let _ = classify(Some(&records), ext.as_ref());

    let _ = parse_inlet(&text);
    let _ = CalibrationTable::parse(&text);
    let _ = parse_chroms_inf(data);
});
