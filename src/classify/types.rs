//! Function metadata, roles, and the classification trace.

use std::fmt;

use serde::Serialize;

/// MS level assigned to the lock-mass / calibration channel.
pub const CALIBRATION_LEVEL: i32 = 9;

/// MS level of UV and other non-MS channels.
pub const UV_LEVEL: i32 = 0;

/// Name given to functions missing from `_extern.inf`.
pub const UNKNOWN_FUNCTION_NAME: &str = "FUNCTION_NAME_UNKNOWN";

/// `_extern.inf` function names used by the classification rules.
pub const TOF_PARENT_FUNCTION: &str = "TOF PARENT FUNCTION";
/// QTOF MS scan
pub const TOF_MS_FUNCTION: &str = "TOF MS FUNCTION";
/// Lock-spray reference channel
pub const REFERENCE: &str = "REFERENCE";

/// Raw function mode values.
pub const MODE_MSN: u8 = 0x71;
/// Calibration mode
pub const MODE_CALIBRATE: u8 = 0xF1;
/// UV trace mode
pub const MODE_UV_TRACE: u8 = 0x24;

const FUNCTION_TYPE_NAMES: [&str; 32] = [
    "Scan",
    "SIR",
    "Delay",
    "Concatenated",
    "Off",
    "Parents",
    "Daughters",
    "Neutral Loss",
    "Neutral Gain",
    "MRM",
    "Q1F",
    "MS2",
    "Diode Array",
    "TOF",
    "TOF PSD",
    "TOF Survey",
    "TOF Daughter",
    "MALDI TOF",
    "TOF MS",
    "TOF Parent",
    "Voltage Scan",
    "Magnetic Scan",
    "Voltage SIR",
    "Magnetic SIR",
    "Auto Daughters",
    "AutoSpec B/E Scan",
    "AutoSpec B^2/E Scan",
    "AutoSpec CNL Scan",
    "AutoSpec MIKES Scan",
    "AutoSpec MRM",
    "AutoSpec NRMS Scan",
    "AutoSpec Q-MRM Quad",
];

// MS level per function type; -1 where the type carries no known level
const FUNCTION_TYPE_LEVELS: [i32; 32] = [
    1, 1, -1, -1, 0, 1, 2, 2, 2, 2, 1, 2, 0, 1, -1, 1, 2, 1, 1, 1, 0, 0, 0, 0, 2, -1, -1, -1, 2, 2,
    -1, 2,
];

/// Human readable name of a 5-bit function type.
pub fn function_type_name(function_type: u8) -> &'static str {
    FUNCTION_TYPE_NAMES
        .get(function_type as usize)
        .copied()
        .unwrap_or("Unknown")
}

/// MS level implied by a function type alone.
pub fn level_for_function_type(function_type: u8) -> i32 {
    FUNCTION_TYPE_LEVELS
        .get(function_type as usize)
        .copied()
        .unwrap_or(-1)
}

/// One `_FUNCTNS.INF` record (or its `_extern.inf` stand-in).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FunctionRecord {
    /// 1-based function number
    pub number: u32,
    /// Raw type byte
    pub type_raw: u8,
    /// Raw mode byte
    pub mode_raw: u8,
    /// Low five bits of the type byte
    pub function_type: u8,
    /// Ionisation mode (0..=15)
    pub ion_mode: u8,
    /// Data type nibble of the mode byte
    pub data_type: u8,
    /// Continuum (profile) acquisition
    pub continuum: bool,
    /// Accurate-mass run; calibration is skipped below level 9
    pub accurate: bool,
    /// High bit of the mode byte
    pub cal_function: bool,
    /// Scan time, seconds
    pub scan_time: f32,
    /// Survey inter-scan time, seconds
    pub survey_interscan_time: f32,
    /// Start time, minutes
    pub start_time: f32,
    /// End time, minutes
    pub end_time: f32,
    /// Inter-scan time, seconds
    pub interscan_time: f32,
    /// Mass window (+/-)
    pub mass_window: f32,
    /// Start mass
    pub start_mass: f32,
    /// End mass
    pub end_mass: f32,
}

/// Acquisition role of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FunctionRole {
    /// Survey scans
    Ms1,
    /// Fragment scans at the given level
    Msn(u8),
    /// Lock-mass channel (level 9)
    Calibration,
    /// Non-MS detector channel
    UvTrace,
    /// Reference channel reported at level 1
    Reference,
    /// Level could not be determined
    Unknown,
}

impl FunctionRole {
    /// Role for a resolved MS level and `_extern.inf` name.
    pub fn from_level(level: i32, name: &str) -> Self {
        match level {
            CALIBRATION_LEVEL => FunctionRole::Calibration,
            UV_LEVEL => FunctionRole::UvTrace,
            1 if name == REFERENCE => FunctionRole::Reference,
            1 => FunctionRole::Ms1,
            2..=8 => FunctionRole::Msn(level as u8),
            _ => FunctionRole::Unknown,
        }
    }
}

impl fmt::Display for FunctionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionRole::Ms1 => write!(f, "MS1"),
            FunctionRole::Msn(level) => write!(f, "MS{}", level),
            FunctionRole::Calibration => write!(f, "Calibration"),
            FunctionRole::UvTrace => write!(f, "UV trace"),
            FunctionRole::Reference => write!(f, "Reference"),
            FunctionRole::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Peak mode of a function, decided from its data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum CentroidMode {
    /// Not enough data to tell
    #[default]
    Undetermined,
    /// Sampled peak shapes
    Profile,
    /// One point per peak
    Centroid,
}

/// Named classification rules, in the order they may fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Rule {
    /// Level looked up from the function type table
    FunctionTypeTable,
    /// Mode 0xF1 promoted a level-1 function to calibration
    CalibrateMode,
    /// Mode 0x24 marked a UV trace
    UvTraceMode,
    /// High bit of the mode byte forced calibration
    CalibrationBit,
    /// Level taken from the `_extern.inf` `Type`
    ExternType,
    /// No usable `_extern.inf` `Type`; assumed level 1
    ExternDefault,
    /// MSE: two or more TOF MS functions and two or more level-1 functions
    MseTofMs,
    /// MSE: exactly two level-1 functions, the second not a reference
    MseTwoSurvey,
    /// MSE: three or more level-1 functions leading the list
    MseThreeSurvey,
    /// MSE: legacy collision energy comparison across TOF PARENT functions
    MseCollisionEnergy,
}

impl Rule {
    /// True for the MSE rules.
    pub fn is_mse(&self) -> bool {
        matches!(
            self,
            Rule::MseTofMs | Rule::MseTwoSurvey | Rule::MseThreeSurvey | Rule::MseCollisionEnergy
        )
    }
}

/// A classified function.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionInfo {
    /// Binary metadata
    pub record: FunctionRecord,
    /// `_extern.inf` name, or [`UNKNOWN_FUNCTION_NAME`]
    pub name: String,
    /// Resolved MS level (-1 when unknown)
    pub ms_level: i32,
    /// Resolved role
    pub role: FunctionRole,
    /// Rules that set or changed the level, in order
    pub trace: Vec<Rule>,
}

impl FunctionInfo {
    /// 1-based function number.
    pub fn number(&self) -> u32 {
        self.record.number
    }

    /// True for functions that produce mass spectra.
    pub fn is_ms(&self) -> bool {
        self.ms_level >= 1
    }
}

/// Result of the classification pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Classification {
    /// Functions ordered by number
    pub functions: Vec<FunctionInfo>,
    /// MSE rule that fired, if any
    pub mse: Option<Rule>,
    /// Any function reported accurate-mass data
    pub accurate: bool,
    /// Levels came from `_FUNCTNS.INF`
    pub from_functns: bool,
    /// Non-fatal inconsistencies
    pub cautions: Vec<String>,
}

impl Classification {
    /// Function by 1-based number.
    pub fn function(&self, number: u32) -> Option<&FunctionInfo> {
        self.functions.iter().find(|f| f.number() == number)
    }

    /// MS level of a function, -1 when absent.
    pub fn ms_level(&self, number: u32) -> i32 {
        self.function(number).map_or(-1, |f| f.ms_level)
    }

    /// True when an MSE rule fired.
    pub fn is_mse(&self) -> bool {
        self.mse.is_some()
    }

    /// Number of the last function.
    pub fn function_count(&self) -> u32 {
        self.functions.iter().map(FunctionInfo::number).max().unwrap_or(0)
    }
}
