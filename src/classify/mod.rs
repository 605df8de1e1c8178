//! Acquisition function classification.
//!
//! Every function of a Waters run gets an MS level and a [`FunctionRole`]:
//!
//! 1. `_FUNCTNS.INF` records (0x1A0 bytes each) give the function type and mode
//!    bytes; the level comes from a fixed table over the 32 function types, then
//!    the mode byte may turn it into a UV trace (0x24) or the calibration channel
//!    (0xF1, or any mode with the high bit set).
//! 2. Without a readable `_FUNCTNS.INF`, the `Type` of each `_extern.inf` section
//!    decides (`MS1`, `MS2`, `REF`), defaulting to level 1.
//! 3. MSE detection tries four rules in order and sets function 2 to level 2 when
//!    one fires.
//!
//! Each function keeps the list of [`Rule`]s that set or changed its level, so a
//! surprising result can be traced back to the rule responsible.
//!
//! # Example
//!
//! ```
//! use pico::classify::{classify, FunctionRecord, FunctionRole};
//!
//! let records = vec![
//!     FunctionRecord { number: 1, type_raw: 0x12, mode_raw: 0x71, function_type: 0x12, ..Default::default() },
//!     FunctionRecord { number: 2, type_raw: 0x10, mode_raw: 0x71, function_type: 0x10, ..Default::default() },
//!     FunctionRecord { number: 3, type_raw: 0x12, mode_raw: 0xF1, function_type: 0x12, cal_function: true, ..Default::default() },
//! ];
//! let result = classify(Some(&records), None);
//! assert_eq!(result.ms_level(1), 1);
//! assert_eq!(result.ms_level(2), 2);
//! assert_eq!(result.function(3).unwrap().role, FunctionRole::Calibration);
//! assert!(!result.is_mse());
//! ```

mod error;
mod extern_inf;
mod functns;
mod rules;
mod types;

#[cfg(test)]
mod tests;

use std::path::Path;

use log::{debug, warn};

pub use error::ClassifyError;
pub use extern_inf::{
    parse_inlet, read_inlet, ExternFunction, ExternInfo, EXTERN_FILE, INFO_KEYS, INLET_FILE,
    MAX_FUNCTIONS,
};
pub use functns::{
    encode_record, parse_functns, read_functns, ACCURATE_DATA_TYPE, FUNCTNS_FILE,
    FUNCTNS_RECORD_SIZE,
};
pub use rules::{classify, detect_mse, level_from_record};
pub use types::{
    function_type_name, level_for_function_type, CentroidMode, Classification, FunctionInfo,
    FunctionRecord, FunctionRole, Rule, CALIBRATION_LEVEL, MODE_CALIBRATE, MODE_MSN,
    MODE_UV_TRACE, REFERENCE, TOF_MS_FUNCTION, TOF_PARENT_FUNCTION, UNKNOWN_FUNCTION_NAME,
    UV_LEVEL,
};

/// Metadata read from a raw directory.
#[derive(Debug, Clone)]
pub struct RunMetadata {
    /// Classified functions
    pub classification: Classification,
    /// Parsed `_extern.inf`, when present
    pub extern_info: Option<ExternInfo>,
    /// `_INLET.INF` entries
    pub inlet: Vec<(String, String)>,
}

/// Read `_FUNCTNS.INF`, `_extern.inf` and `_INLET.INF` and classify the run.
///
/// A missing or unreadable `_FUNCTNS.INF` falls back to `_extern.inf`; an error is
/// returned only when neither yields a function.
pub fn classify_dir(dir: &Path) -> Result<RunMetadata, ClassifyError> {
    let records = match read_functns(dir) {
        Ok(records) => Some(records),
        Err(e) => {
            warn!("{} unusable ({}), falling back to {}", FUNCTNS_FILE, e, EXTERN_FILE);
            None
        }
    };
    let extern_info = match ExternInfo::from_dir(dir) {
        Ok(info) => Some(info),
        Err(ClassifyError::IoError(e)) => {
            debug!("{} not read: {}", EXTERN_FILE, e);
            None
        }
        Err(e) if records.is_some() => {
            warn!("{} ignored: {}", EXTERN_FILE, e);
            None
        }
        Err(e) => return Err(e),
    };

    let classification = classify(records.as_deref(), extern_info.as_ref());
    if classification.functions.is_empty() {
        return Err(ClassifyError::NoFunctions(dir.display().to_string()));
    }
    Ok(RunMetadata {
        classification,
        extern_info,
        inlet: read_inlet(dir)?,
    })
}
