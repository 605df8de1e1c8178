use super::*;
use std::fs;
use tempfile::tempdir;

const MSE_EXTERN: &str = "Lock Spray Configuration:\r\n\
Reference Scan Frequency(sec)\t\t30\r\n\
MS Profile Type\t\tAuto P\r\n\
Function Parameters - Function 1 - TOF PARENT FUNCTION\r\n\
Survey Start Time\t\t0.00\r\n\
Survey End Time\t\t10.00\r\n\
Survey Start Mass\t\t50\r\n\
Survey End Mass\t\t1200\r\n\
Parent Survey High CE\t\t30.0\r\n\
Parent Survey Low CE\t\t6.0\r\n\
\r\n\
Function Parameters - Function 2 - TOF PARENT FUNCTION\r\n\
Survey Start Mass\t\t50\r\n\
Ramp High Energy from\t\t20.0 to 40.0\r\n\
\r\n\
Function Parameters - Function 3 - REFERENCE\r\n\
Interval\t\t30\r\n";

fn record(number: u32, function_type: u8, mode_raw: u8) -> FunctionRecord {
    FunctionRecord {
        number,
        type_raw: function_type,
        mode_raw,
        function_type,
        cal_function: mode_raw & 0x80 != 0,
        ..Default::default()
    }
}

fn info(number: u32, level: i32, name: &str) -> FunctionInfo {
    FunctionInfo {
        record: record(number, 0x12, MODE_MSN),
        name: name.to_string(),
        ms_level: level,
        role: FunctionRole::from_level(level, name),
        trace: vec![Rule::FunctionTypeTable],
    }
}

#[test]
fn test_functns_record_decode() {
    let source = FunctionRecord {
        number: 1,
        type_raw: 0x32,
        mode_raw: 0x71,
        scan_time: 0.5,
        start_mass: 50.0,
        end_mass: 1200.0,
        ..Default::default()
    };
    let mut bytes = encode_record(&source);
    assert_eq!(bytes.len(), FUNCTNS_RECORD_SIZE);
    bytes.extend_from_slice(&[0u8; 10]);

    let records = parse_functns(&bytes);
    assert_eq!(records.len(), 1);
    let r = &records[0];
    assert_eq!(r.function_type, 0x12);
    assert_eq!(r.ion_mode, 9);
    assert_eq!(r.data_type, 0xC);
    assert!(r.continuum);
    assert!(!r.cal_function);
    assert!(!r.accurate);
    assert_eq!(r.scan_time, 0.5);
    assert_eq!(r.end_mass, 1200.0);
    assert_eq!(function_type_name(r.function_type), "TOF MS");
}

#[test]
fn test_accurate_flag_propagates() {
    let mut bytes = encode_record(&record(1, 0x12, MODE_MSN));
    bytes.extend(encode_record(&record(2, 0x12, (ACCURATE_DATA_TYPE << 2) | 1)));
    let records = parse_functns(&bytes);
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.accurate));
}

#[test]
fn test_read_functns_empty_file() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(FUNCTNS_FILE), b"").unwrap();
    assert!(matches!(
        read_functns(dir.path()),
        Err(ClassifyError::ParseError(_))
    ));
}

#[test]
fn test_level_table() {
    assert_eq!(level_for_function_type(0x12), 1);
    assert_eq!(level_for_function_type(0x10), 2);
    assert_eq!(level_for_function_type(0x0C), 0);
    assert_eq!(level_for_function_type(0x02), -1);
    assert_eq!(level_for_function_type(40), -1);
    assert_eq!(function_type_name(40), "Unknown");
}

#[test]
fn test_mode_rules() {
    let (level, trace, caution) = level_from_record(&record(1, 0x12, MODE_MSN));
    assert_eq!(level, 1);
    assert_eq!(trace, vec![Rule::FunctionTypeTable]);
    assert!(caution.is_none());

    let (level, trace, caution) = level_from_record(&record(2, 0x12, MODE_CALIBRATE));
    assert_eq!(level, CALIBRATION_LEVEL);
    assert_eq!(trace, vec![Rule::FunctionTypeTable, Rule::CalibrateMode]);
    assert!(caution.is_none());

    let (level, trace, _) = level_from_record(&record(3, 0x12, MODE_UV_TRACE));
    assert_eq!(level, UV_LEVEL);
    assert_eq!(trace, vec![Rule::FunctionTypeTable, Rule::UvTraceMode]);
}

#[test]
fn test_calibration_bit_on_fragment_function() {
    let (level, trace, caution) = level_from_record(&record(2, 0x10, MODE_CALIBRATE));
    assert_eq!(level, CALIBRATION_LEVEL);
    assert_eq!(trace, vec![Rule::FunctionTypeTable, Rule::CalibrationBit]);
    assert!(caution.unwrap().contains("calibrate mode"));
}

#[test]
fn test_unexpected_mode_caution() {
    let (level, _, caution) = level_from_record(&record(4, 0x12, 0x33));
    assert_eq!(level, 1);
    assert_eq!(caution.unwrap(), "function 4: unexpected function mode 0x33");
}

#[test]
fn test_extern_parse_sections() {
    let ext = ExternInfo::parse(MSE_EXTERN).unwrap();
    assert_eq!(ext.functions.len(), 3);
    assert_eq!(ext.function(1).unwrap().name, TOF_PARENT_FUNCTION);
    assert_eq!(ext.function(3).unwrap().name, REFERENCE);
    assert_eq!(ext.count_named(TOF_PARENT_FUNCTION), 2);

    assert_eq!(ext.function(1).unwrap().level(), Some(1));
    assert_eq!(ext.function(2).unwrap().level(), Some(2));
    assert_eq!(ext.function(3).unwrap().level(), Some(CALIBRATION_LEVEL));

    assert_eq!(ext.function(1).unwrap().entry("StartMass"), Some("50"));
    assert_eq!(ext.function(1).unwrap().collision_energies(), Some((30.0, 6.0)));
    assert_eq!(ext.function(2).unwrap().ramp_high_energy(), Some((20.0, 40.0)));

    let global = |key: &str| {
        ext.global
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    };
    assert_eq!(global("LockSprayRefScanFreq(sec)").as_deref(), Some("30"));
    assert_eq!(global("REF_Interval").as_deref(), Some("30"));
    assert_eq!(global("ProfileMode").as_deref(), Some("AutoP"));
    // the REFERENCE section after the ramp overrides the MSE run type
    assert_eq!(global("Type").as_deref(), Some("MS2"));
}

#[test]
fn test_extern_rejects_bad_function_number() {
    let text = "Function Parameters - Function 0 - TOF MS FUNCTION\n";
    assert!(matches!(
        ExternInfo::parse(text),
        Err(ClassifyError::ParseError(_))
    ));
    let text = "Function Parameters - Function 257 - TOF MS FUNCTION\n";
    assert!(ExternInfo::parse(text).is_err());
}

#[test]
fn test_extern_short_unknown_name_closes_section() {
    let text = "Function Parameters - Function 1 - TOF MS FUNCTION\n\
Survey Start Mass\t\t50\n\
Function Parameters - Function 2 - ABC\n\
Survey Start Mass\t\t100\n";
    let ext = ExternInfo::parse(text).unwrap();
    assert_eq!(ext.function(2).unwrap().name, "ABC");
    assert!(ext.function(2).unwrap().entries.is_empty());
    assert_eq!(ext.function(1).unwrap().entry("StartMass"), Some("50"));
}

#[test]
fn test_msms_start_mass_flips_type() {
    let text = "Function Parameters - Function 1 - TOF SURVEY FUNCTION\n\
MSMS Start Mass\t\t50\n\
Function Parameters - Function 2 - TOF MS FUNCTION\n\
MSMS Start Mass\t\t50\n\
Ramp High Energy from\t\t10 to 30\n\
Function Parameters - Function 3 - TOF MS FUNCTION\n\
MSMS Start Mass\t\t50\n";
    let ext = ExternInfo::parse(text).unwrap();
    assert_eq!(ext.function(1).unwrap().ms_type.as_deref(), Some("MS1"));
    assert_eq!(ext.function(2).unwrap().ms_type.as_deref(), Some("MS2"));
    assert_eq!(ext.function(3).unwrap().ms_type.as_deref(), Some("MS1"));
}

#[test]
fn test_info_rows_rewrite_second_ms1() {
    let text = "Function Parameters - Function 1 - TOF MS FUNCTION\n\
Survey Start Time\t\t0.5\n\
Function Parameters - Function 2 - TOF MS FUNCTION\n\
Survey Start Time\t\t0.5\n";
    let ext = ExternInfo::parse(text).unwrap();
    let rows = ext.info_rows();
    assert_eq!(
        rows,
        vec![
            ("Type".to_string(), "MS1".to_string()),
            ("StartTime_1".to_string(), "0.5".to_string()),
            ("Type_1".to_string(), "MS1".to_string()),
            ("StartTime_2".to_string(), "0.5".to_string()),
            ("Type_2".to_string(), "MS2".to_string()),
        ]
    );
}

#[test]
fn test_single_function_keeps_global_type() {
    let text = "Function Parameters - Function 1 - TOF MS FUNCTION\n";
    let rows = ExternInfo::parse(text).unwrap().info_rows();
    assert_eq!(
        rows,
        vec![
            ("Type".to_string(), "MS1".to_string()),
            ("Type_1".to_string(), "MS1".to_string()),
        ]
    );
}

#[test]
fn test_parse_inlet() {
    let text = "Waters Acquity TUV Detector\r\n Wavelength Mode: Single\r\nChannel A\r\n Wavelength: 254 nm\r\n Sampling Rate: 20 points/sec\r\n";
    let rows = parse_inlet(text);
    assert_eq!(
        rows,
        vec![
            ("Type".to_string(), "Waters Acquity TUV".to_string()),
            ("WavelengthMode".to_string(), "Single".to_string()),
            ("Channel_A_Wavelength".to_string(), "254 nm".to_string()),
            ("Channel_A_SamplingRate".to_string(), "20 points/sec".to_string()),
        ]
    );
}

#[test]
fn test_read_inlet_missing_file() {
    let dir = tempdir().unwrap();
    assert!(read_inlet(dir.path()).unwrap().is_empty());
}

#[test]
fn test_mse_tof_ms_rule() {
    let functions = vec![
        info(1, 1, TOF_MS_FUNCTION),
        info(2, 1, TOF_MS_FUNCTION),
        info(3, 9, REFERENCE),
    ];
    assert_eq!(detect_mse(&functions, None), Some(Rule::MseTofMs));
}

#[test]
fn test_mse_two_survey_rule() {
    let records = vec![
        record(1, 0x12, MODE_MSN),
        record(2, 0x12, MODE_MSN),
        record(3, 0x12, MODE_CALIBRATE),
    ];
    let result = classify(Some(&records), None);
    assert_eq!(result.mse, Some(Rule::MseTwoSurvey));
    assert_eq!(result.ms_level(1), 1);
    assert_eq!(result.ms_level(2), 2);
    assert_eq!(result.ms_level(3), CALIBRATION_LEVEL);
    let second = result.function(2).unwrap();
    assert_eq!(second.trace.last(), Some(&Rule::MseTwoSurvey));
    assert_eq!(second.role, FunctionRole::Msn(2));
    assert!(result.cautions.is_empty());
}

#[test]
fn test_mse_two_survey_skips_reference() {
    let functions = vec![info(1, 1, TOF_MS_FUNCTION), info(2, 1, REFERENCE)];
    assert_eq!(detect_mse(&functions, None), None);
}

#[test]
fn test_mse_three_survey_rule() {
    let functions = vec![
        info(1, 1, UNKNOWN_FUNCTION_NAME),
        info(2, 1, UNKNOWN_FUNCTION_NAME),
        info(3, 1, UNKNOWN_FUNCTION_NAME),
    ];
    assert_eq!(detect_mse(&functions, None), Some(Rule::MseThreeSurvey));
}

#[test]
fn test_mse_collision_energy_rule() {
    let ext = ExternInfo::parse(MSE_EXTERN).unwrap();
    let functions = vec![
        info(1, 1, TOF_PARENT_FUNCTION),
        info(2, 2, TOF_PARENT_FUNCTION),
        info(3, 9, REFERENCE),
    ];
    assert_eq!(
        detect_mse(&functions, Some(&ext)),
        Some(Rule::MseCollisionEnergy)
    );
    assert_eq!(detect_mse(&functions, None), None);
}

#[test]
fn test_mse_collision_energy_ramp_below_survey() {
    let text = MSE_EXTERN.replace("20.0 to 40.0", "4.0 to 40.0");
    let ext = ExternInfo::parse(&text).unwrap();
    let functions = vec![
        info(1, 1, TOF_PARENT_FUNCTION),
        info(2, 2, TOF_PARENT_FUNCTION),
        info(3, 9, REFERENCE),
    ];
    assert_eq!(detect_mse(&functions, Some(&ext)), None);
}

#[test]
fn test_mse_collision_energy_pair_rescues_low_ramp() {
    let text = MSE_EXTERN.replace(
        "Ramp High Energy from\t\t20.0 to 40.0\r\n",
        "Ramp High Energy from\t\t4.0 to 40.0\r\n\
Parent Survey High CE\t\t25.0\r\n\
Parent Survey Low CE\t\t5.0\r\n",
    );
    let ext = ExternInfo::parse(&text).unwrap();
    let functions = vec![
        info(1, 1, TOF_PARENT_FUNCTION),
        info(2, 2, TOF_PARENT_FUNCTION),
        info(3, 9, REFERENCE),
    ];
    assert_eq!(
        detect_mse(&functions, Some(&ext)),
        Some(Rule::MseCollisionEnergy)
    );
}

#[test]
fn test_mse_collision_energy_from_first_function_with_energies() {
    let text = "Function Parameters - Function 1 - TOF PARENT FUNCTION\r\n\
Survey Start Mass\t\t50\r\n\
\r\n\
Function Parameters - Function 2 - TOF PARENT FUNCTION\r\n\
Parent Survey High CE\t\t30.0\r\n\
Parent Survey Low CE\t\t6.0\r\n\
\r\n\
Function Parameters - Function 3 - TOF PARENT FUNCTION\r\n\
Ramp High Energy from\t\t20.0 to 40.0\r\n\
\r\n\
Function Parameters - Function 4 - REFERENCE\r\n\
Interval\t\t30\r\n";
    let ext = ExternInfo::parse(text).unwrap();
    assert!(ext.function(1).unwrap().collision_energies().is_none());
    let functions = vec![
        info(1, 1, TOF_PARENT_FUNCTION),
        info(2, 2, TOF_PARENT_FUNCTION),
        info(3, 2, TOF_PARENT_FUNCTION),
        info(4, 9, REFERENCE),
    ];
    assert_eq!(
        detect_mse(&functions, Some(&ext)),
        Some(Rule::MseCollisionEnergy)
    );
}

#[test]
fn test_non_mse_run_untouched() {
    let records = vec![
        record(1, 0x12, MODE_MSN),
        record(2, 0x10, MODE_MSN),
        record(3, 0x12, MODE_CALIBRATE),
    ];
    let result = classify(Some(&records), None);
    assert!(!result.is_mse());
    assert_eq!(result.ms_level(1), 1);
    assert_eq!(result.ms_level(2), 2);
    assert_eq!(result.function(2).unwrap().trace, vec![Rule::FunctionTypeTable]);
    assert_eq!(result.function(1).unwrap().name, UNKNOWN_FUNCTION_NAME);
}

#[test]
fn test_lock_mass_count_cautions() {
    let result = classify(Some(&[record(1, 0x12, MODE_MSN)]), None);
    assert_eq!(result.cautions, vec!["no lock mass function found".to_string()]);

    let records = vec![
        record(1, 0x12, MODE_MSN),
        record(2, 0x12, MODE_CALIBRATE),
        record(3, 0x12, MODE_CALIBRATE),
    ];
    let result = classify(Some(&records), None);
    assert!(result
        .cautions
        .contains(&"more than one lock mass function found (count=2)".to_string()));
}

#[test]
fn test_extern_only_classification() {
    let text = "Function Parameters - Function 1 - TOF MS FUNCTION\n\
Function Parameters - Function 3 - REFERENCE\n";
    let ext = ExternInfo::parse(text).unwrap();
    let result = classify(None, Some(&ext));
    assert!(!result.from_functns);
    assert_eq!(result.function_count(), 3);
    assert_eq!(result.ms_level(1), 1);
    assert_eq!(result.function(1).unwrap().trace, vec![Rule::ExternType]);
    assert_eq!(result.mse, Some(Rule::MseTwoSurvey));
    assert_eq!(
        result.function(2).unwrap().trace,
        vec![Rule::ExternDefault, Rule::MseTwoSurvey]
    );
    assert_eq!(result.function(2).unwrap().name, UNKNOWN_FUNCTION_NAME);
    assert_eq!(result.function(3).unwrap().role, FunctionRole::Calibration);
}

#[test]
fn test_names_come_from_extern() {
    let ext = ExternInfo::parse(MSE_EXTERN).unwrap();
    let records = vec![
        record(1, 0x12, MODE_MSN),
        record(2, 0x10, MODE_MSN),
        record(3, 0x12, MODE_CALIBRATE),
    ];
    let result = classify(Some(&records), Some(&ext));
    assert!(result.from_functns);
    assert_eq!(result.function(2).unwrap().name, TOF_PARENT_FUNCTION);
    assert_eq!(result.mse, Some(Rule::MseCollisionEnergy));
}

#[test]
fn test_classify_dir_without_metadata() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        classify_dir(dir.path()),
        Err(ClassifyError::NoFunctions(_))
    ));
}

#[test]
fn test_classify_dir_extern_fallback() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(EXTERN_FILE), MSE_EXTERN).unwrap();
    let meta = classify_dir(dir.path()).unwrap();
    assert!(!meta.classification.from_functns);
    assert_eq!(meta.classification.function_count(), 3);
    assert!(meta.extern_info.is_some());
    assert!(meta.inlet.is_empty());
}
