//! `_HEADER.TXT` calibration line parsing.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{debug, warn};
use serde::Serialize;

use super::error::CalibrationError;
use super::polynomial::{Calibration, FunctionCalibration, Modification, CALIBRATION_TERMS};

/// Name of the calibration header inside a raw directory.
pub const HEADER_FILE: &str = "_HEADER.TXT";

const CAL_FUNCTION: &str = "$$ Cal Function ";
const CAL_MODIFICATION: &str = "$$ Cal Modification ";

/// Coefficients and type tag of one calibration line.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoefficientSet {
    /// Digit of the `T{d}` tag, if present
    pub tag: Option<u8>,
    /// Coefficients in ascending order
    pub coefficients: Vec<f64>,
}

fn parse_numbers(body: &str) -> Result<Vec<f64>, CalibrationError> {
    body.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse::<f64>()
                .map_err(|_| CalibrationError::ParseError(format!("bad coefficient '{}'", t)))
        })
        .collect()
}

/// Split off the `T{d}` tag and return it with the comma-separated body.
fn split_tag(text: &str) -> Result<(Option<u8>, String), CalibrationError> {
    let text = text.trim();
    if let Some(rest) = text.strip_prefix("<T") {
        let digit = rest
            .chars()
            .next()
            .and_then(|c| c.to_digit(10))
            .ok_or_else(|| CalibrationError::ParseError(format!("bad tag in '{}'", text)))?;
        let open = format!("{}>", digit);
        let close = format!("</T{}>", digit);
        let body = rest
            .strip_prefix(open.as_str())
            .and_then(|b| b.strip_suffix(close.as_str()))
            .ok_or_else(|| CalibrationError::ParseError(format!("unbalanced tag in '{}'", text)))?;
        return Ok((Some(digit as u8), body.to_string()));
    }
    let mut tokens: Vec<&str> = text.split(',').map(str::trim).collect();
    let mut tag = None;
    if let Some(pos) = tokens.iter().rposition(|t| t.len() > 1 && t.starts_with('T')) {
        tag = tokens[pos][1..].chars().next().and_then(|c| c.to_digit(10)).map(|d| d as u8);
        tokens.remove(pos);
    }
    Ok((tag, tokens.join(",")))
}

impl CoefficientSet {
    /// Parse either `c0,c1,...,T1` or `<T1>c0,c1,...,</T1>`.
    pub fn parse(text: &str) -> Result<Self, CalibrationError> {
        let (tag, body) = split_tag(text)?;
        let coefficients = parse_numbers(&body)?;
        if coefficients.len() > CALIBRATION_TERMS {
            return Err(CalibrationError::TooManyCoefficients(coefficients.len()));
        }
        Ok(Self { tag, coefficients })
    }

    /// Parse like [`parse`](Self::parse), reading unparsable coefficients as 0
    /// and keeping only the first six.
    ///
    /// Fails only when the tag itself is malformed.
    pub fn parse_lenient(text: &str) -> Result<Self, CalibrationError> {
        let (tag, body) = split_tag(text)?;
        let coefficients = body
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .take(CALIBRATION_TERMS)
            .map(|t| t.parse::<f64>().unwrap_or(0.0))
            .collect();
        Ok(Self { tag, coefficients })
    }
}

/// Split `"$$ Cal Function 3: ..."` style lines into function number and value.
fn split_line<'a>(line: &'a str, prefix: &str) -> Result<Option<(u32, &'a str)>, CalibrationError> {
    let Some(start) = line.find(prefix) else {
        return Ok(None);
    };
    let rest = &line[start + prefix.len()..];
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    let function = digits
        .parse::<u32>()
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| CalibrationError::ParseError(format!("bad function number in '{}'", line)))?;
    let value = rest
        .find(": ")
        .map(|p| &rest[p + 2..])
        .ok_or_else(|| CalibrationError::ParseError(format!("missing ': ' in '{}'", line)))?;
    Ok(Some((function, value)))
}

/// Calibration lines of one raw directory.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CalibrationTable {
    functions: BTreeMap<u32, CoefficientSet>,
    modifications: BTreeMap<u32, CoefficientSet>,
    files_info: Vec<(String, String)>,
    cautions: Vec<String>,
}

/// Strict parse first; a malformed line falls back to the lenient reading
/// and leaves a caution.
fn parse_set(
    label: &str,
    function: u32,
    value: &str,
    cautions: &mut Vec<String>,
) -> Option<CoefficientSet> {
    let error = match CoefficientSet::parse(value) {
        Ok(set) => return Some(set),
        Err(e) => e,
    };
    let salvaged = CoefficientSet::parse_lenient(value).ok();
    let action = if salvaged.is_some() {
        "unreadable coefficients read as 0, first six kept"
    } else {
        "line ignored"
    };
    warn!("{} {}: {} ({})", label, function, error, action);
    cautions.push(format!("{} {}: {} ({})", label, function, error, action));
    salvaged
}

impl CalibrationTable {
    /// Read `_HEADER.TXT` from a raw directory.
    pub fn from_dir(dir: &Path) -> Result<Self, CalibrationError> {
        let bytes = fs::read(dir.join(HEADER_FILE))?;
        Ok(Self::parse(&String::from_utf8_lossy(&bytes)))
    }

    /// Parse header text.
    ///
    /// Malformed lines never fail the parse; they are reported by
    /// [`cautions`](Self::cautions).
    pub fn parse(text: &str) -> Self {
        let mut table = Self::default();
        for line in text.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);
            let (label, function, value) = match split_line(line, CAL_FUNCTION) {
                Ok(Some((function, value))) => ("Cal Function", function, value),
                Ok(None) => match split_line(line, CAL_MODIFICATION) {
                    Ok(Some((function, value))) => ("Cal Modification", function, value),
                    Ok(None) => continue,
                    Err(e) => {
                        table.skip_line(e);
                        continue;
                    }
                },
                Err(e) => {
                    table.skip_line(e);
                    continue;
                }
            };
            debug!("{} {}: {}", label, function, value);
            table
                .files_info
                .push((format!("{} {}", label, function), value.to_string()));
            let Some(set) = parse_set(label, function, value, &mut table.cautions) else {
                continue;
            };
            if label == "Cal Function" {
                table.functions.insert(function, set);
            } else {
                table.modifications.insert(function, set);
            }
        }
        table
    }

    fn skip_line(&mut self, error: CalibrationError) {
        warn!("{} (line ignored)", error);
        self.cautions.push(format!("{} (line ignored)", error));
    }

    /// Malformed calibration lines, one message each.
    pub fn cautions(&self) -> &[String] {
        &self.cautions
    }

    /// True when no `Cal Function` line was found.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Highest function number with a calibration line.
    pub fn max_function(&self) -> u32 {
        let f = self.functions.keys().next_back().copied().unwrap_or(0);
        let m = self.modifications.keys().next_back().copied().unwrap_or(0);
        f.max(m)
    }

    /// Coefficients for a function; functions past the last line reuse the last line.
    pub fn coefficients(&self, function: u32) -> Option<&CoefficientSet> {
        self.functions
            .get(&function)
            .or_else(|| self.functions.values().next_back())
    }

    /// Modification coefficients for exactly this function.
    pub fn modification(&self, function: u32) -> Option<&CoefficientSet> {
        self.modifications.get(&function)
    }

    /// Calibration to apply to a function, or `None` when it must be skipped.
    ///
    /// Accurate-mass runs skip calibration for every function below level 9.
    pub fn for_function(&self, function: u32, ms_level: i32, accurate: bool) -> Option<FunctionCalibration> {
        if accurate && ms_level < 9 {
            return None;
        }
        let set = self.coefficients(function)?;
        Some(FunctionCalibration {
            primary: Calibration::from_set(set),
            modification: self.modification(function).and_then(Modification::from_set),
        })
    }

    /// `FilesInfo` key/value rows in header order.
    pub fn files_info_rows(&self) -> &[(String, String)] {
        &self.files_info
    }
}
