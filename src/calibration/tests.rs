use super::*;
use proptest::prelude::*;

const HEADER: &str = "$$ Acquired Name: sample\r\n\
$$ Cal Function 1: -1.2e-3,1.000012,3.5e-8,0,0,0,T1\r\n\
$$ Cal Function 2: 0.5,2.0,0,0,0,T0\r\n\
$$ Cal Modification 1: 0.001,0.99995,T1\r\n\
$$ Cal MS1 Static Params: ignored\r\n";

#[test]
fn test_parse_untagged_line() {
    let set = CoefficientSet::parse("-1.2e-3,1.000012,3.5e-8,0,0,0,T1").unwrap();
    assert_eq!(set.tag, Some(1));
    assert_eq!(set.coefficients.len(), 6);
    assert_eq!(set.coefficients[1], 1.000012);
}

#[test]
fn test_parse_tagged_line() {
    let set = CoefficientSet::parse("<T0>0.5,2.0,0,</T0>").unwrap();
    assert_eq!(set.tag, Some(0));
    assert_eq!(set.coefficients, vec![0.5, 2.0, 0.0]);
}

#[test]
fn test_parse_without_tag() {
    let set = CoefficientSet::parse("1,2,3").unwrap();
    assert_eq!(set.tag, None);
    assert_eq!(set.coefficients, vec![1.0, 2.0, 3.0]);
}

#[test]
fn test_parse_rejects_bad_input() {
    assert!(matches!(
        CoefficientSet::parse("1,2,3,4,5,6,7,T1"),
        Err(CalibrationError::TooManyCoefficients(7))
    ));
    assert!(CoefficientSet::parse("1,abc,T1").is_err());
    assert!(CoefficientSet::parse("<T1>1,2,</T2>").is_err());
}

#[test]
fn test_table_parse() {
    let table = CalibrationTable::parse(HEADER);
    assert!(!table.is_empty());
    assert_eq!(table.max_function(), 2);
    assert_eq!(table.coefficients(2).unwrap().tag, Some(0));
    // past the last line falls back to the last entry
    assert_eq!(table.coefficients(5), table.coefficients(2));
    assert!(table.modification(1).is_some());
    assert!(table.modification(2).is_none());

    let rows = table.files_info_rows();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].0, "Cal Function 1");
    assert_eq!(rows[0].1, "-1.2e-3,1.000012,3.5e-8,0,0,0,T1");
    assert_eq!(rows[2].0, "Cal Modification 1");
}

#[test]
fn test_table_bad_function_number() {
    for text in ["$$ Cal Function x: 1,2,T1\n", "$$ Cal Function 1 1,2,T1\n"] {
        let table = CalibrationTable::parse(text);
        assert!(table.is_empty());
        assert_eq!(table.cautions().len(), 1);
    }
}

#[test]
fn test_table_keeps_first_six_coefficients() {
    let table = CalibrationTable::parse("$$ Cal Function 1: 0,1,0,0,0,0,7,T1\n");
    let set = table.coefficients(1).unwrap();
    assert_eq!(set.coefficients, vec![0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
    assert_eq!(set.tag, Some(1));
    assert_eq!(table.cautions().len(), 1);
    assert!(table.cautions()[0].contains("Too many calibration coefficients: 7"));
    assert_eq!(table.files_info_rows().len(), 1);
}

#[test]
fn test_table_reads_bad_coefficient_as_zero() {
    let table = CalibrationTable::parse(
        "$$ Cal Function 1: 0,1,abc,T1\n$$ Cal Function 2: <T1>0,1,</T2>\n",
    );
    assert_eq!(table.coefficients(1).unwrap().coefficients, vec![0.0, 1.0, 0.0]);
    // a broken tag drops the line
    assert_eq!(table.max_function(), 1);
    assert_eq!(table.cautions().len(), 2);
    let cal = table.for_function(1, 1, false).unwrap();
    assert!((cal.apply(400.0) - 400.0).abs() < 1e-9);
}

#[test]
fn test_empty_table_skips_calibration() {
    let table = CalibrationTable::parse("$$ nothing here\n");
    assert!(table.is_empty());
    assert!(table.for_function(1, 1, false).is_none());
}

#[test]
fn test_accurate_run_skips_below_level_9() {
    let table = CalibrationTable::parse(HEADER);
    assert!(table.for_function(1, 1, true).is_none());
    assert!(table.for_function(1, 9, true).is_some());
    assert!(table.for_function(1, 1, false).is_some());
}

#[test]
fn test_all_zero_set_becomes_identity() {
    let cal = Calibration::from_set(&CoefficientSet {
        tag: Some(1),
        coefficients: vec![0.0; 6],
    });
    assert!(cal.is_identity());
    assert_eq!(cal.apply(1234.5678), 1234.5678);
}

#[test]
fn test_t0_negates_second_coefficient() {
    let cal = Calibration::from_set(&CoefficientSet {
        tag: Some(0),
        coefficients: vec![0.5, 2.0],
    });
    assert_eq!(cal.coefficients()[1], -2.0);
    // polynomial branch: c0 - c1 * m
    assert!((cal.apply(100.0) - 200.5).abs() < 1e-12);
}

#[test]
fn test_square_root_branch() {
    let cal = Calibration::from_set(&CoefficientSet {
        tag: Some(1),
        coefficients: vec![0.0, 1.0],
    });
    assert!(!cal.is_identity());
    assert!((cal.apply(400.0) - 400.0).abs() < 1e-9);

    let cal = Calibration::from_set(&CoefficientSet {
        tag: Some(1),
        coefficients: vec![0.1, 1.0],
    });
    let expected = (0.1 + 20.0f64) * (0.1 + 20.0);
    assert!((cal.apply(400.0) - expected).abs() < 1e-9);
}

#[test]
fn test_modification() {
    let poly = Modification::from_set(&CoefficientSet {
        tag: Some(0),
        coefficients: vec![1.0, 2.0],
    })
    .unwrap();
    assert_eq!(poly.apply(10.0), 21.0);

    let sqrt = Modification::from_set(&CoefficientSet {
        tag: Some(1),
        coefficients: vec![0.0, 2.0],
    })
    .unwrap();
    assert!((sqrt.apply(9.0) - 36.0).abs() < 1e-12);

    // no-op sets and unknown tags are dropped
    for (tag, c) in [(Some(1), vec![0.0, 1.0, 0.0]), (Some(0), vec![0.0]), (Some(5), vec![1.0, 2.0])] {
        assert!(Modification::from_set(&CoefficientSet { tag, coefficients: c }).is_none());
    }
}

#[test]
fn test_function_calibration_layers_modification() {
    let table = CalibrationTable::parse(
        "$$ Cal Function 1: 0,1,T1\n$$ Cal Modification 1: 1.0,1.0,T0\n",
    );
    let cal = table.for_function(1, 1, false).unwrap();
    assert!(cal.modification.is_some());
    assert!((cal.apply(100.0) - 101.0).abs() < 1e-9);

    let mut values = vec![100.0, 400.0];
    cal.apply_all(&mut values);
    assert!((values[1] - 401.0).abs() < 1e-9);
}

proptest! {
    /// The identity coefficient set never moves an m/z value.
    #[test]
    fn prop_identity_calibration(mz in 32.0f64..32768.0) {
        let cal = FunctionCalibration {
            primary: Calibration::identity(),
            modification: None,
        };
        prop_assert_eq!(cal.apply(mz), mz);
    }

    /// The square-root form with `c1 = 1` reproduces m/z within rounding.
    #[test]
    fn prop_unit_square_root_calibration(mz in 32.0f64..32768.0) {
        let cal = Calibration::from_set(&CoefficientSet { tag: Some(1), coefficients: vec![0.0, 1.0] });
        prop_assert!((cal.apply(mz) - mz).abs() <= mz * 1e-12);
    }
}
