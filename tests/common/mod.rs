//! Synthetic Waters `.raw` directories for the integration tests.

#![allow(dead_code)]

use pico::classify::{encode_record, FunctionRecord, EXTERN_FILE, FUNCTNS_FILE};
use pico::codec::{encode_intensity_type1, encode_mz_type1};
use pico::raw::IdxRecord;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

/// `(intensity, m/z)` of every synthetic scan.
pub const SCAN_POINTS: [(u32, f64); 3] = [(0, 400.0), (100, 401.0), (200, 402.0)];

pub const TOF_MS: &str = "TOF MS FUNCTION";
pub const TOF_MSMS: &str = "TOF MSMS FUNCTION";
pub const REFERENCE: &str = "REFERENCE";

const STS_HEADER_LEN: usize = 16;
const STS_RECORD_LEN: usize = 0x95;
const STS_PRECURSOR_OFFSET: usize = 0x2a;

struct FunctionSpec {
    name: String,
    type_raw: u8,
    mode_raw: u8,
    retention_times: Vec<f32>,
    precursors: Option<Vec<f32>>,
}

/// Builder for a run directory with one DAT/IDX pair per function.
#[derive(Default)]
pub struct RunBuilder {
    functions: Vec<FunctionSpec>,
    header: Option<String>,
}

impl RunBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a function; retention times are in minutes.
    pub fn function(mut self, name: &str, type_raw: u8, mode_raw: u8, retention_times: &[f32]) -> Self {
        self.functions.push(FunctionSpec {
            name: name.to_string(),
            type_raw,
            mode_raw,
            retention_times: retention_times.to_vec(),
            precursors: None,
        });
        self
    }

    /// Give the last added function an STS file.
    pub fn precursors(mut self, values: &[f32]) -> Self {
        if let Some(last) = self.functions.last_mut() {
            last.precursors = Some(values.to_vec());
        }
        self
    }

    /// Write a `_HEADER.TXT`.
    pub fn header(mut self, text: &str) -> Self {
        self.header = Some(text.to_string());
        self
    }

    pub fn write(&self, dir: &Path) {
        let functns: Vec<u8> = self
            .functions
            .iter()
            .enumerate()
            .flat_map(|(i, f)| {
                encode_record(&FunctionRecord {
                    number: i as u32 + 1,
                    type_raw: f.type_raw,
                    mode_raw: f.mode_raw,
                    function_type: f.type_raw & 0x1F,
                    ..Default::default()
                })
            })
            .collect();
        fs::write(dir.join(FUNCTNS_FILE), functns).unwrap();

        let mut extern_text = String::new();
        for (i, f) in self.functions.iter().enumerate() {
            extern_text.push_str(&format!(
                "Function Parameters - Function {} - {}\r\nSurvey Start Mass\t\t50\r\n\r\n",
                i + 1,
                f.name
            ));
        }
        fs::write(dir.join(EXTERN_FILE), extern_text).unwrap();

        let scan = type1_points(&SCAN_POINTS);
        for (i, f) in self.functions.iter().enumerate() {
            let n = i + 1;
            let dat: Vec<u8> = scan
                .iter()
                .copied()
                .cycle()
                .take(scan.len() * f.retention_times.len())
                .collect();
            fs::write(dir.join(format!("_FUNC{:03}.IDX", n)), idx_bytes(&f.retention_times)).unwrap();
            fs::write(dir.join(format!("_FUNC{:03}.DAT", n)), dat).unwrap();
            if let Some(values) = &f.precursors {
                fs::write(dir.join(format!("_FUNC{:03}.STS", n)), sts_bytes(values)).unwrap();
            }
        }

        if let Some(header) = &self.header {
            fs::write(dir.join("_HEADER.TXT"), header).unwrap();
        }
    }

    /// Write into `root/name` and return the directory.
    pub fn write_in(&self, root: &Path, name: &str) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir(&dir).unwrap();
        self.write(&dir);
        dir
    }
}

/// Survey, fragment and lock-mass functions with interleaved retention times.
pub fn standard_run() -> RunBuilder {
    RunBuilder::new()
        .function(TOF_MS, 0x12, 0x71, &[0.10, 0.20, 0.30])
        .function(TOF_MSMS, 0x10, 0x71, &[0.12, 0.22, 0.32])
        .precursors(&[400.5, 401.5, 402.5])
        .function(REFERENCE, 0x12, 0xF1, &[0.15, 0.25, 0.35])
}

/// Two TOF MS survey functions plus lock mass: an MSE acquisition.
pub fn mse_run() -> RunBuilder {
    RunBuilder::new()
        .function(TOF_MS, 0x12, 0x71, &[0.10, 0.20, 0.30])
        .function(TOF_MS, 0x12, 0x71, &[0.11, 0.21, 0.31])
        .precursors(&[0.0, 0.0, 0.0])
        .function(REFERENCE, 0x12, 0xF1, &[0.15, 0.25, 0.35])
}

/// Survey, fragment and lock-mass functions with `scans` scans each, six
/// seconds apart.
pub fn long_run(scans: usize) -> RunBuilder {
    let times = |offset: f32| -> Vec<f32> { (0..scans).map(|i| 0.1 * i as f32 + offset).collect() };
    let precursors: Vec<f32> = (0..scans).map(|i| 400.5 + i as f32).collect();
    RunBuilder::new()
        .function(TOF_MS, 0x12, 0x71, &times(0.1))
        .function(TOF_MSMS, 0x10, 0x71, &times(0.12))
        .precursors(&precursors)
        .function(REFERENCE, 0x12, 0xF1, &times(0.15))
}

/// Point the last m/z word of a scan (1-based) outside every band.
pub fn break_scan(dir: &Path, function: u32, scan: usize) {
    let path = dir.join(format!("_FUNC{:03}.DAT", function));
    let mut dat = fs::read(&path).unwrap();
    let scan_len = SCAN_POINTS.len() * 8;
    let word = scan * scan_len - 4;
    dat[word..word + 4].copy_from_slice(&1u32.to_le_bytes());
    fs::write(&path, dat).unwrap();
}

pub fn type1_points(points: &[(u32, f64)]) -> Vec<u8> {
    let mut buf = Vec::new();
    for &(intensity, mz) in points {
        buf.extend_from_slice(&encode_intensity_type1(intensity).to_le_bytes());
        buf.extend_from_slice(&encode_mz_type1(mz).to_le_bytes());
    }
    buf
}

pub fn idx_bytes(retention_times: &[f32]) -> Vec<u8> {
    retention_times
        .iter()
        .flat_map(|&rt| {
            IdxRecord {
                point_count: SCAN_POINTS.len() as u32,
                retention_time: rt,
                tic: 300.0,
                ..Default::default()
            }
            .encode(22)
        })
        .collect()
}

pub fn sts_bytes(values: &[f32]) -> Vec<u8> {
    let mut bytes = vec![0u8; STS_HEADER_LEN + values.len() * STS_RECORD_LEN];
    bytes[0..2].copy_from_slice(&(STS_HEADER_LEN as u16).to_le_bytes());
    bytes[4..6].copy_from_slice(&(STS_RECORD_LEN as u16).to_le_bytes());
    for (i, v) in values.iter().enumerate() {
        let pos = STS_HEADER_LEN + STS_PRECURSOR_OFFSET + i * STS_RECORD_LEN;
        bytes[pos..pos + 4].copy_from_slice(&v.to_le_bytes());
    }
    bytes
}

pub fn f64s(blob: &[u8]) -> Vec<f64> {
    blob.chunks_exact(8)
        .map(|c| f64::from_le_bytes(c.try_into().unwrap()))
        .collect()
}

pub fn files_info(conn: &Connection, key: &str) -> Option<String> {
    conn.query_row("SELECT Value FROM FilesInfo WHERE Key = ?1", [key], |r| r.get(0))
        .ok()
}

pub fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |r| r.get(0)).unwrap()
}

/// `(ScanNumber, MSLevel, ParentScanNumber)` of every spectrum, by scan number.
pub fn lineage(conn: &Connection) -> Vec<(i64, i32, Option<i64>)> {
    conn.prepare("SELECT ScanNumber, MSLevel, ParentScanNumber FROM Spectra ORDER BY ScanNumber")
        .unwrap()
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}
