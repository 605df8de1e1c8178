//! Ordered classification rules.

use log::{info, warn};

use super::extern_inf::ExternInfo;
use super::types::{
    level_for_function_type, Classification, FunctionInfo, FunctionRecord, FunctionRole, Rule,
    CALIBRATION_LEVEL, MODE_CALIBRATE, MODE_MSN, MODE_UV_TRACE, REFERENCE, TOF_MS_FUNCTION,
    TOF_PARENT_FUNCTION, UNKNOWN_FUNCTION_NAME, UV_LEVEL,
};

/// Level from the binary record, with the rules that produced it.
pub fn level_from_record(record: &FunctionRecord) -> (i32, Vec<Rule>, Option<String>) {
    let mut trace = vec![Rule::FunctionTypeTable];
    let mut caution = None;
    let mut level = level_for_function_type(record.function_type);
    match record.mode_raw {
        MODE_MSN => {}
        MODE_CALIBRATE => {
            if level == 1 {
                level = CALIBRATION_LEVEL;
                trace.push(Rule::CalibrateMode);
            } else {
                caution = Some(format!(
                    "function {}: calibrate mode 0xF1 on a level {} function",
                    record.number, level
                ));
            }
        }
        MODE_UV_TRACE => {
            level = UV_LEVEL;
            trace.push(Rule::UvTraceMode);
        }
        other => {
            caution = Some(format!(
                "function {}: unexpected function mode 0x{:02x}",
                record.number, other
            ));
        }
    }
    if record.cal_function && level != CALIBRATION_LEVEL {
        level = CALIBRATION_LEVEL;
        trace.push(Rule::CalibrationBit);
    }
    (level, trace, caution)
}

/// Stand-in record for a function only described by `_extern.inf`.
fn record_from_extern(number: u32, level: i32) -> FunctionRecord {
    let mode_raw = if level == CALIBRATION_LEVEL {
        MODE_CALIBRATE
    } else {
        MODE_MSN
    };
    FunctionRecord {
        number,
        type_raw: level as u8,
        mode_raw,
        cal_function: mode_raw & 0x80 != 0,
        ..FunctionRecord::default()
    }
}

fn name_of(ext: Option<&ExternInfo>, number: u32) -> String {
    ext.and_then(|e| e.function(number))
        .map(|f| f.name.clone())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| UNKNOWN_FUNCTION_NAME.to_string())
}

/// Assign an MS level and role to every function.
///
/// `records` are the `_FUNCTNS.INF` entries when that file is readable; otherwise
/// levels come from the `_extern.inf` `Type` of each section.
pub fn classify(records: Option<&[FunctionRecord]>, ext: Option<&ExternInfo>) -> Classification {
    let mut out = Classification::default();
    match records {
        Some(records) if !records.is_empty() => {
            out.from_functns = true;
            for record in records {
                let (level, trace, caution) = level_from_record(record);
                if let Some(c) = caution {
                    out.cautions.push(c);
                }
                out.accurate |= record.accurate;
                out.functions.push(FunctionInfo {
                    record: record.clone(),
                    name: name_of(ext, record.number),
                    ms_level: level,
                    role: FunctionRole::Unknown,
                    trace,
                });
            }
        }
        _ => {
            if let Some(ext) = ext {
                let last = ext.functions.keys().next_back().copied().unwrap_or(0);
                for number in 1..=last {
                    let (level, rule) = match ext.function(number).and_then(|f| f.level()) {
                        Some(level) => (level, Rule::ExternType),
                        None => (1, Rule::ExternDefault),
                    };
                    out.functions.push(FunctionInfo {
                        record: record_from_extern(number, level),
                        name: name_of(Some(ext), number),
                        ms_level: level,
                        role: FunctionRole::Unknown,
                        trace: vec![rule],
                    });
                }
            }
        }
    }

    if let Some(rule) = detect_mse(&out.functions, ext) {
        info!("MSE acquisition detected ({:?})", rule);
        out.mse = Some(rule);
        if let Some(f) = out.functions.iter_mut().find(|f| f.number() == 2) {
            f.ms_level = 2;
            f.trace.push(rule);
        }
    }

    let calibration_count = out
        .functions
        .iter()
        .filter(|f| f.ms_level == CALIBRATION_LEVEL)
        .count();
    if calibration_count == 0 {
        out.cautions.push("no lock mass function found".to_string());
    } else if calibration_count > 1 {
        out.cautions.push(format!(
            "more than one lock mass function found (count={})",
            calibration_count
        ));
    }

    for f in &mut out.functions {
        f.role = FunctionRole::from_level(f.ms_level, &f.name);
    }
    for c in &out.cautions {
        warn!("caution: {}", c);
    }
    out
}

fn level_of(functions: &[FunctionInfo], number: u32) -> i32 {
    functions
        .iter()
        .find(|f| f.number() == number)
        .map_or(-1, |f| f.ms_level)
}

/// First MSE rule that matches, in rule order.
pub fn detect_mse(functions: &[FunctionInfo], ext: Option<&ExternInfo>) -> Option<Rule> {
    if !functions.iter().any(|f| f.number() == 2) {
        return None;
    }
    let named = |name: &str| functions.iter().filter(|f| f.name == name).count();
    let level_one = functions.iter().filter(|f| f.ms_level == 1).count();

    if named(TOF_MS_FUNCTION) >= 2 && level_one >= 2 {
        return Some(Rule::MseTofMs);
    }

    let second_is_reference = functions
        .iter()
        .find(|f| f.number() == 2)
        .is_some_and(|f| f.name == REFERENCE);
    if level_one == 2 && level_of(functions, 1) == 1 && level_of(functions, 2) == 1 && !second_is_reference {
        return Some(Rule::MseTwoSurvey);
    }

    if level_one >= 3 && (1..=3).all(|n| level_of(functions, n) == 1) {
        return Some(Rule::MseThreeSurvey);
    }

    if named(TOF_PARENT_FUNCTION) >= 2 && collision_energy_rule(ext?) {
        return Some(Rule::MseCollisionEnergy);
    }
    None
}

/// The first function listing both survey energies must have high >= 1.5x low.
/// Every later TOF PARENT function must then carry a rising ramp starting above
/// that low energy, or its own rising energy pair; one failure rejects the run.
fn collision_energy_rule(ext: &ExternInfo) -> bool {
    let Some((first, f1_high, f1_low)) = ext.functions.iter().find_map(|(&n, f)| {
        f.collision_energies()
            .filter(|&(high, low)| high >= 0.0 && low >= 0.0)
            .map(|(high, low)| (n, high, low))
    }) else {
        return false;
    };
    if f1_high < 1.5 * f1_low {
        return false;
    }
    let mut matched = 0;
    for (_, f) in ext.functions.range(first + 1..) {
        if f.name != TOF_PARENT_FUNCTION {
            continue;
        }
        let energies = f
            .collision_energies()
            .is_some_and(|(high, low)| low >= 0.0 && high > low);
        let ramp = f
            .ramp_high_energy()
            .is_some_and(|(lo, hi)| lo >= 0.0 && hi > lo && lo > f1_low);
        if !energies && !ramp {
            return false;
        }
        matched += 1;
    }
    matched > 0
}
