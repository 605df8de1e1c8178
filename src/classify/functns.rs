//! `_FUNCTNS.INF` binary function records.

use std::fs;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, warn};

use super::error::ClassifyError;
use super::types::{function_type_name, FunctionRecord};

/// File name inside the raw directory.
pub const FUNCTNS_FILE: &str = "_FUNCTNS.INF";

/// Size of one function record.
pub const FUNCTNS_RECORD_SIZE: usize = 0x1A0;

/// Data type nibble marking accurate-mass data.
pub const ACCURATE_DATA_TYPE: u8 = 0xD;

const OFF_SCAN_TIME: usize = 2;
const OFF_SURVEY_INTERSCAN: usize = 6;
const OFF_START_TIME: usize = 10;
const OFF_END_TIME: usize = 14;
const OFF_INTERSCAN: usize = 28;
const OFF_MASS_WINDOW: usize = 32;
const OFF_START_MASS: usize = 0xA0;
const OFF_END_MASS: usize = 0x120;

fn decode_record(number: u32, rec: &[u8]) -> FunctionRecord {
    let type_raw = rec[0];
    let mode_raw = rec[1];
    let f32_at = |off: usize| LittleEndian::read_f32(&rec[off..off + 4]);
    FunctionRecord {
        number,
        type_raw,
        mode_raw,
        function_type: type_raw & 0x1F,
        ion_mode: ((type_raw >> 5) & 7) | ((mode_raw & 1) << 3),
        data_type: (mode_raw >> 2) & 0xF,
        continuum: mode_raw & 1 != 0,
        accurate: false,
        cal_function: mode_raw & 0x80 != 0,
        scan_time: f32_at(OFF_SCAN_TIME),
        survey_interscan_time: f32_at(OFF_SURVEY_INTERSCAN),
        start_time: f32_at(OFF_START_TIME),
        end_time: f32_at(OFF_END_TIME),
        interscan_time: f32_at(OFF_INTERSCAN),
        mass_window: f32_at(OFF_MASS_WINDOW),
        start_mass: f32_at(OFF_START_MASS),
        end_mass: f32_at(OFF_END_MASS),
    }
}

/// Decode every complete record; a trailing partial record is ignored.
///
/// If any record carries the accurate-mass data type, all records are marked accurate.
pub fn parse_functns(bytes: &[u8]) -> Vec<FunctionRecord> {
    let mut records: Vec<FunctionRecord> = bytes
        .chunks_exact(FUNCTNS_RECORD_SIZE)
        .enumerate()
        .map(|(i, rec)| decode_record(i as u32 + 1, rec))
        .collect();
    for r in &records {
        debug!(
            "_FUNC{:03}: type=0x{:02x} mode=0x{:02x} function_type={}({}) ion_mode={} data_type={} continuum={}",
            r.number,
            r.type_raw,
            r.mode_raw,
            function_type_name(r.function_type),
            r.function_type,
            r.ion_mode,
            r.data_type,
            r.continuum
        );
        if r.ion_mode > 13 {
            warn!("Function {}: ion mode {} out of range", r.number, r.ion_mode);
        }
    }
    if records.iter().any(|r| r.data_type == ACCURATE_DATA_TYPE) {
        for r in &mut records {
            r.accurate = true;
        }
    }
    records
}

/// Read `_FUNCTNS.INF` from a raw directory.
pub fn read_functns(dir: &Path) -> Result<Vec<FunctionRecord>, ClassifyError> {
    let bytes = fs::read(dir.join(FUNCTNS_FILE))?;
    if bytes.len() % FUNCTNS_RECORD_SIZE != 0 {
        warn!(
            "{} size {} is not a multiple of {}",
            FUNCTNS_FILE,
            bytes.len(),
            FUNCTNS_RECORD_SIZE
        );
    }
    let records = parse_functns(&bytes);
    if records.is_empty() {
        return Err(ClassifyError::ParseError(format!(
            "{} holds no complete record",
            FUNCTNS_FILE
        )));
    }
    Ok(records)
}

/// Encode a record back into its 0x1A0-byte form.
pub fn encode_record(record: &FunctionRecord) -> Vec<u8> {
    let mut out = vec![0u8; FUNCTNS_RECORD_SIZE];
    out[0] = record.type_raw;
    out[1] = record.mode_raw;
    let mut put = |off: usize, v: f32| LittleEndian::write_f32(&mut out[off..off + 4], v);
    put(OFF_SCAN_TIME, record.scan_time);
    put(OFF_SURVEY_INTERSCAN, record.survey_interscan_time);
    put(OFF_START_TIME, record.start_time);
    put(OFF_END_TIME, record.end_time);
    put(OFF_INTERSCAN, record.interscan_time);
    put(OFF_MASS_WINDOW, record.mass_window);
    put(OFF_START_MASS, record.start_mass);
    put(OFF_END_MASS, record.end_mass);
    out
}
