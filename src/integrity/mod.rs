//! Pre-flight integrity check of a Waters `.raw` directory.
//!
//! The check looks for the files a conversion needs and sorts what is missing
//! into fatal findings and warnings:
//!
//! | Finding | Severity |
//! |---------|----------|
//! | unreadable directory, missing or corrupt `_extern.inf` | fatal |
//! | missing `.DAT`/`.IDX`/`.STS` of a level 1-8 function | fatal |
//! | the same for UV (level 0) or lock-mass (level 9) functions | warning |
//! | missing `_FUNCTNS.INF` or `_HEADER.TXT` | warning |
//! | missing or corrupt `_CHROMS.INF`, missing `_CHROnnn.DAT` | warning |
//!
//! Nothing is decoded; only presence and the small metadata files are read.
//!
//! ```rust,no_run
//! use pico::integrity::{check_integrity, IntegrityResult};
//! use std::path::Path;
//!
//! let report = check_integrity(Path::new("sample.raw"));
//! println!("{}", report);
//! if report.result() == IntegrityResult::Error {
//!     std::process::exit(1);
//! }
//! ```

mod report;


use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use log::{debug, info};

pub use report::{CheckStatus, Finding, FindingKind, IntegrityCheck, IntegrityReport, IntegrityResult};

use crate::calibration::HEADER_FILE;
use crate::classify::{
    classify, read_functns, ClassifyError, ExternInfo, CALIBRATION_LEVEL, EXTERN_FILE,
    FUNCTNS_FILE, MAX_FUNCTIONS,
};
use crate::raw::{
    chro_file_name, function_file_name, parse_chroms_inf, FunctionFile, CHROMS_FILE,
};

/// Number in a `_FUNCnnn.xxx` or `_CHROnnn.DAT` style name.
fn numbered(name: &str, prefix: &str, extensions: &[&str]) -> Option<u32> {
    let upper = name.to_ascii_uppercase();
    let rest = upper.strip_prefix(prefix)?;
    let (digits, ext) = rest.split_once('.')?;
    if !extensions.contains(&ext) {
        return None;
    }
    digits.parse().ok()
}

/// Check a raw directory.
pub fn check_integrity(dir: &Path) -> IntegrityReport {
    let mut report = IntegrityReport::new(dir.display().to_string());
    info!("Checking raw directory {}", dir.display());

    let names: Vec<String> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(e) => {
            report.add_check(IntegrityCheck::finding(
                "Raw directory",
                Finding::new(FindingKind::FileIo).with_detail(e.to_string()),
            ));
            return report;
        }
    };
    if names.is_empty() {
        report.add_check(IntegrityCheck::finding(
            "Raw directory",
            Finding::new(FindingKind::FileIo).with_detail("directory is empty"),
        ));
        return report;
    }
    report.add_check(IntegrityCheck::ok("Raw directory"));

    let records = if dir.join(FUNCTNS_FILE).is_file() {
        match read_functns(dir) {
            Ok(records) => {
                report.add_check(IntegrityCheck::ok(FUNCTNS_FILE));
                Some(records)
            }
            Err(e) => {
                report.add_check(IntegrityCheck::finding(
                    FUNCTNS_FILE,
                    Finding::new(FindingKind::MissingFunctionsInf).with_detail(e.to_string()),
                ));
                None
            }
        }
    } else {
        report.add_check(IntegrityCheck::finding(
            FUNCTNS_FILE,
            Finding::new(FindingKind::MissingFunctionsInf),
        ));
        None
    };

    if dir.join(HEADER_FILE).is_file() {
        report.add_check(IntegrityCheck::ok(HEADER_FILE));
    } else {
        report.add_check(IntegrityCheck::finding(
            HEADER_FILE,
            Finding::new(FindingKind::MissingHeaderTxt),
        ));
    }

    let extern_info = match ExternInfo::from_dir(dir) {
        Ok(ext) => {
            report.add_check(IntegrityCheck::ok(EXTERN_FILE));
            Some(ext)
        }
        Err(ClassifyError::IoError(e)) if e.kind() == ErrorKind::NotFound => {
            report.add_check(IntegrityCheck::finding(
                EXTERN_FILE,
                Finding::new(FindingKind::MissingExternInf),
            ));
            None
        }
        Err(ClassifyError::IoError(e)) => {
            report.add_check(IntegrityCheck::finding(
                EXTERN_FILE,
                Finding::new(FindingKind::FileIo).with_detail(e.to_string()),
            ));
            None
        }
        Err(e) => {
            report.add_check(IntegrityCheck::finding(
                EXTERN_FILE,
                Finding::new(FindingKind::Parse).with_detail(e.to_string()),
            ));
            None
        }
    };

    let classification = classify(records.as_deref(), extern_info.as_ref());
    let listed_max = names
        .iter()
        .filter_map(|n| numbered(n, "_FUNC", &["DAT", "IDX", "STS"]))
        .max()
        .unwrap_or(0);
    let max_function = listed_max
        .max(classification.function_count())
        .min(MAX_FUNCTIONS);
    debug!("checking functions 1..={}", max_function);
    for number in 1..=max_function {
        check_function(dir, &mut report, number, classification.ms_level(number));
    }

    check_chromatograms(dir, &names, &mut report);
    report
}

fn check_function(dir: &Path, report: &mut IntegrityReport, number: u32, level: i32) {
    if !(0..=CALIBRATION_LEVEL).contains(&level) {
        debug!("function {}: unknown MS level, not checked", number);
        return;
    }
    let mut kinds = vec![
        (FunctionFile::Dat, FindingKind::MissingDat),
        (FunctionFile::Idx, FindingKind::MissingIdx),
    ];
    // status records carry the precursors of fragment scans
    if (1..CALIBRATION_LEVEL).contains(&level) && (number > 1 || level > 1) {
        kinds.push((FunctionFile::Sts, FindingKind::MissingSts));
    }
    for (file, kind) in kinds {
        let name = function_file_name(number, file);
        if dir.join(&name).is_file() {
            report.add_check(IntegrityCheck::ok(name));
        } else {
            report.add_check(IntegrityCheck::finding(
                name,
                Finding::file(kind, number, Some(level)),
            ));
        }
    }
}

fn check_chromatograms(dir: &Path, names: &[String], report: &mut IntegrityReport) {
    let listed: BTreeSet<u32> = names
        .iter()
        .filter_map(|n| numbered(n, "_CHRO", &["DAT"]))
        .collect();
    let chroms_path = dir.join(CHROMS_FILE);
    let mut expected: BTreeSet<u32> = match listed.iter().next_back() {
        Some(&max) => (1..=max).collect(),
        None => BTreeSet::new(),
    };

    if chroms_path.is_file() {
        match fs::read(&chroms_path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| parse_chroms_inf(&bytes).map_err(|e| e.to_string()))
        {
            Ok(channels) => {
                report.add_check(IntegrityCheck::ok(CHROMS_FILE));
                expected.extend(channels.iter().map(|c| c.record as u32 + 1));
            }
            Err(e) => report.add_check(IntegrityCheck::finding(
                CHROMS_FILE,
                Finding::new(FindingKind::ChromParseError).with_detail(e),
            )),
        }
    } else if !listed.is_empty() {
        report.add_check(IntegrityCheck::finding(
            CHROMS_FILE,
            Finding::new(FindingKind::MissingChromInf),
        ));
    }

    for number in expected {
        let name = chro_file_name(number);
        if listed.contains(&number) {
            report.add_check(IntegrityCheck::ok(name));
        } else {
            report.add_check(IntegrityCheck::finding(
                name,
                Finding::file(FindingKind::MissingChromDat, number, None),
            ));
        }
    }
}
