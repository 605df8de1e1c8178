//! Free-text metadata: `_extern.inf` and `_INLET.INF`.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::Serialize;

use super::error::ClassifyError;
use super::types::{CALIBRATION_LEVEL, REFERENCE, TOF_MS_FUNCTION, TOF_PARENT_FUNCTION};

/// Free-text function metadata file.
pub const EXTERN_FILE: &str = "_extern.inf";

/// Inlet (UV detector) metadata file.
pub const INLET_FILE: &str = "_INLET.INF";

/// Highest function number accepted in `_extern.inf`.
pub const MAX_FUNCTIONS: u32 = 256;

const FUNCTION_HEADER: &str = "Function Parameters - Function ";
const PROFILE_TYPE: &str = "MS Profile Type";
const RAMP_HIGH_ENERGY: &str = "Ramp High Energy from";
const MSMS_START_MASS: &str = "MSMS Start Mass";
const PARENT_SURVEY_HIGH_CE: &str = "Parent Survey High CE";
const PARENT_SURVEY_LOW_CE: &str = "Parent Survey Low CE";

/// Keys copied into the byspec2 `Info` table.
pub const INFO_KEYS: [&str; 6] = ["Type", "ProfileMode", "StartTime", "EndTime", "StartMass", "EndMass"];

/// Text after the last tab, or after the key when the line has no tab.
fn last_field<'a>(line: &'a str, key: &str) -> &'a str {
    match line.rfind('\t') {
        Some(p) => line[p + 1..].trim(),
        None => line.get(key.len()..).unwrap_or("").trim(),
    }
}

/// Per-function section of `_extern.inf`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExternFunction {
    /// Function name from the section header, e.g. `TOF MS FUNCTION`
    pub name: String,
    /// `MS1`, `MS2` or `REF`
    pub ms_type: Option<String>,
    /// Recognised entries in file order (`StartTime`, `FragMode`, collision energies, ...)
    pub entries: Vec<(String, String)>,
    /// Every tab separated line of the section
    pub fields: Vec<(String, String)>,
    /// An `MSMS Start Mass` line was seen
    pub msms_start_mass: bool,
}

impl ExternFunction {
    /// First recognised entry with this key.
    pub fn entry(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// `Ramp High Energy from lo to hi` as `(lo, hi)`.
    pub fn ramp_high_energy(&self) -> Option<(f64, f64)> {
        let text: String = self.entry(RAMP_HIGH_ENERGY)?.split_whitespace().collect();
        let (lo, hi) = text.split_once("to")?;
        Some((lo.parse().ok()?, hi.parse().ok()?))
    }

    /// `(high, low)` parent survey collision energies.
    pub fn collision_energies(&self) -> Option<(f64, f64)> {
        let high = self.entry(PARENT_SURVEY_HIGH_CE)?.parse().ok()?;
        let low = self.entry(PARENT_SURVEY_LOW_CE)?.parse().ok()?;
        Some((high, low))
    }

    /// MS level implied by the resolved type.
    pub fn level(&self) -> Option<i32> {
        match self.ms_type.as_deref()? {
            "MS1" => Some(1),
            "MS2" => Some(2),
            "REF" => Some(CALIBRATION_LEVEL),
            _ => None,
        }
    }
}

/// Parsed `_extern.inf`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExternInfo {
    /// Run-level entries (`LockSprayRefScanFreq(sec)`, `REF_Interval`, `ProfileMode`, `Type`)
    pub global: Vec<(String, String)>,
    /// Sections by function number
    pub functions: BTreeMap<u32, ExternFunction>,
}

impl ExternInfo {
    /// Read `_extern.inf` from a raw directory.
    pub fn from_dir(dir: &Path) -> Result<Self, ClassifyError> {
        let bytes = fs::read(dir.join(EXTERN_FILE))?;
        Self::parse(&String::from_utf8_lossy(&bytes))
    }

    /// Parse the file content.
    pub fn parse(text: &str) -> Result<Self, ClassifyError> {
        let lines: Vec<&str> = text.lines().map(|l| l.trim_end_matches('\r')).collect();
        let mut info = ExternInfo::default();
        let mut file_type = "MS1";
        let mut current: Option<u32> = None;

        let mut i = 0;
        while i < lines.len() {
            let line = lines[i];
            i += 1;

            if line.starts_with("Lock Spray Configuration:") {
                if let Some(next) = lines.get(i) {
                    let key = "Reference Scan Frequency(sec)";
                    if next.starts_with(key) {
                        info.global
                            .push(("LockSprayRefScanFreq(sec)".to_string(), last_field(next, key).to_string()));
                        i += 1;
                    }
                }
            }

            if let Some(rest) = line.strip_prefix(FUNCTION_HEADER) {
                let Some(space) = rest.find(' ') else {
                    continue;
                };
                let number: u32 = rest[..space].trim().parse().map_err(|_| {
                    ClassifyError::ParseError(format!("bad function number in '{}'", line))
                })?;
                if number == 0 || number > MAX_FUNCTIONS {
                    return Err(ClassifyError::ParseError(format!(
                        "function number {} outside 1..={}",
                        number, MAX_FUNCTIONS
                    )));
                }
                let name = rest[space..].trim_start_matches([' ', '-']).trim();
                let function = info.functions.entry(number).or_default();
                function.name = name.to_string();
                current = Some(number);

                if name.starts_with(TOF_PARENT_FUNCTION) || name.starts_with(TOF_MS_FUNCTION) {
                    function.ms_type = Some("MS1".to_string());
                } else if name.starts_with("TOF FAST DDA FUNCTION") {
                    function.ms_type = Some("MS1".to_string());
                    file_type = "MS2";
                } else if name.starts_with("TOF SURVEY FUNCTION") {
                    function.ms_type = Some("MS2".to_string());
                    file_type = "MS2";
                } else if name.starts_with(REFERENCE) {
                    function.ms_type = Some("REF".to_string());
                    file_type = "REF";
                    for next in lines.iter().skip(i).take(3) {
                        if next.starts_with("Interval") {
                            info.global
                                .push(("REF_Interval".to_string(), last_field(next, "Interval").to_string()));
                        }
                    }
                } else if name.len() < REFERENCE.len() {
                    current = None;
                }
                continue;
            }

            if line.starts_with(PROFILE_TYPE) {
                let mut value = last_field(line, PROFILE_TYPE).to_string();
                if value == "Auto P" {
                    value = "AutoP".to_string();
                }
                info.global.push(("ProfileMode".to_string(), value));
            }

            let Some(number) = current else {
                continue;
            };
            let Some(function) = info.functions.get_mut(&number) else {
                continue;
            };
            if line.trim().is_empty() {
                continue;
            }

            let parts: Vec<&str> = line.split('\t').filter(|p| !p.is_empty()).collect();
            if let Some(first) = parts.first() {
                let value = if parts.len() > 1 { parts[parts.len() - 1] } else { "" };
                function.fields.push((first.trim().to_string(), value.trim().to_string()));
            }

            if line.starts_with(RAMP_HIGH_ENERGY) {
                function.ms_type = Some("MS2".to_string());
                file_type = "MSE";
                function
                    .entries
                    .push((RAMP_HIGH_ENERGY.to_string(), last_field(line, RAMP_HIGH_ENERGY).to_string()));
            }
            if line.starts_with(MSMS_START_MASS) {
                function.msms_start_mass = true;
            }
            for (key, label) in [
                ("Survey Start Time", "StartTime"),
                ("Survey End Time", "EndTime"),
                ("Survey Start Mass", "StartMass"),
                ("Survey End Mass", "EndMass"),
                ("FragmentationMode", "FragMode"),
                (PARENT_SURVEY_HIGH_CE, PARENT_SURVEY_HIGH_CE),
                (PARENT_SURVEY_LOW_CE, PARENT_SURVEY_LOW_CE),
            ] {
                if line.starts_with(key) {
                    function
                        .entries
                        .push((label.to_string(), last_field(line, key).to_string()));
                }
            }
            if line.starts_with("Switch to MS/MS when")
                || line.starts_with("MSMS to MS Switch Criteria")
                || line.starts_with("MSMS Collision Energy Ramp Start")
            {
                file_type = "MS2";
            }
        }

        let any_ms2 = info
            .functions
            .values()
            .any(|f| f.ms_type.as_deref() == Some("MS2"));
        let max_function = info.functions.keys().next_back().copied().unwrap_or(0);
        let global_type = match max_function {
            0 => None,
            1 => info.functions.get(&1).and_then(|f| f.ms_type.clone()),
            _ if file_type == "MSE" => Some("MSE".to_string()),
            _ if any_ms2 => Some("MS2".to_string()),
            _ => Some("MS1".to_string()),
        };
        if let Some(t) = global_type {
            info.global.push(("Type".to_string(), t));
        }

        // A ramp line already made its function MS2; only the reverse flip remains.
        for function in info.functions.values_mut() {
            if function.msms_start_mass
                && function.ms_type.as_deref() == Some("MS2")
                && function.entry(RAMP_HIGH_ENERGY).is_none()
            {
                function.ms_type = Some("MS1".to_string());
            }
            if let Some(t) = function.ms_type.clone() {
                function.entries.push(("Type".to_string(), t));
            }
        }
        Ok(info)
    }

    /// Section of one function.
    pub fn function(&self, number: u32) -> Option<&ExternFunction> {
        self.functions.get(&number)
    }

    /// Number of sections with the given name.
    pub fn count_named(&self, name: &str) -> usize {
        self.functions.values().filter(|f| f.name == name).count()
    }

    /// Rows for the byspec2 `Info` table.
    ///
    /// Run-level keys are stored bare, function keys get a `_{function}` suffix.
    /// Among function `Type` rows, every `MS1` after the first is reported as `MS2`.
    pub fn info_rows(&self) -> Vec<(String, String)> {
        let mut rows: Vec<(String, String)> = self
            .global
            .iter()
            .filter(|(k, _)| INFO_KEYS.contains(&k.as_str()))
            .cloned()
            .collect();
        let mut seen_ms1 = false;
        for (number, function) in &self.functions {
            for (key, value) in &function.entries {
                if !INFO_KEYS.contains(&key.as_str()) {
                    continue;
                }
                let mut value = value.clone();
                if key == "Type" && value == "MS1" {
                    if seen_ms1 {
                        value = "MS2".to_string();
                    }
                    seen_ms1 = true;
                }
                rows.push((format!("{}_{}", key, number), value));
            }
        }
        rows
    }
}

/// Parse `_INLET.INF` UV detector settings into key/value pairs.
pub fn parse_inlet(text: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut channel = String::new();
    let tail = |line: &str, at: usize| line.get(at..).unwrap_or("").trim().to_string();
    for line in text.lines().map(|l| l.trim_end_matches('\r')) {
        if line.len() > 18 && line.starts_with("Waters Acquity TUV") {
            out.push(("Type".to_string(), "Waters Acquity TUV".to_string()));
        }
        if line.len() > 17 && line.starts_with(" Wavelength Mode:") {
            out.push(("WavelengthMode".to_string(), tail(line, 18)));
        }
        if line.len() > 8 && line.starts_with("Channel ") {
            channel = line.get(8..9).unwrap_or("").to_string();
        }
        for (prefix, suffix) in [
            (" Wavelength:", "Wavelength"),
            (" Sampling Rate:", "SamplingRate"),
            (" Data Mode:", "DataMode"),
        ] {
            if line.len() > prefix.len() && line.starts_with(prefix) {
                out.push((
                    format!("Channel_{}_{}", channel, suffix),
                    tail(line, prefix.len() + 1),
                ));
            }
        }
    }
    out
}

/// Read `_INLET.INF`; a missing file yields no entries.
pub fn read_inlet(dir: &Path) -> Result<Vec<(String, String)>, ClassifyError> {
    match fs::read(dir.join(INLET_FILE)) {
        Ok(bytes) => Ok(parse_inlet(&String::from_utf8_lossy(&bytes))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}
