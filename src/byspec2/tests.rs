use super::*;
use crate::peaks::PeakArrays;
use crate::raw::{Trace, TraceKind};
use byteorder::{ByteOrder, LittleEndian};
use rusqlite::Connection;

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        .unwrap()
}

fn writer_with_file() -> Byspec2Writer {
    let mut writer = Byspec2Writer::open_in_memory().unwrap();
    writer
        .add_file(&FileRow {
            filename: "sample.raw".to_string(),
            location: "/data".to_string(),
            file_type: "Waters".to_string(),
            signature: None,
        })
        .unwrap();
    writer
}

fn scan(scan_number: i64, function: u32, ms_level: i32, rt: f64) -> ScanRow {
    let peaks = PeakArrays::new(vec![100.0, 200.5], vec![10.0, 30.0]);
    ScanRow {
        spectrum: SpectrumRow {
            ms_level,
            retention_time: rt,
            scan_number,
            native_id: format!("function={} process=0 scan={}", function, scan_number),
            valid: true,
            ..Default::default()
        },
        peaks: PeaksRow::uncompressed(&peaks),
        centroided: None,
    }
}

#[test]
fn test_schema_has_all_tables() {
    let writer = Byspec2Writer::open_in_memory().unwrap();
    for table in TABLES {
        assert_eq!(count(writer.connection(), table), 0, "{}", table);
    }
    let tables: i64 = writer
        .connection()
        .query_row("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'", [], |row| row.get(0))
        .unwrap();
    assert_eq!(tables, 8);
}

#[test]
fn test_schema_creation_is_idempotent() {
    let mut conn = Connection::open_in_memory().unwrap();
    create_schema(&mut conn).unwrap();
    let before: Vec<Vec<String>> = TABLES
        .iter()
        .map(|t| table_columns(&conn, t).unwrap())
        .collect();
    conn.execute("INSERT INTO Info(Key, Value) VALUES ('a', 'b')", [])
        .unwrap();

    create_schema(&mut conn).unwrap();
    let after: Vec<Vec<String>> = TABLES
        .iter()
        .map(|t| table_columns(&conn, t).unwrap())
        .collect();
    assert_eq!(before, after);
    assert_eq!(count(&conn, "Info"), 0);
}

#[test]
fn test_spectra_columns() {
    let writer = Byspec2Writer::open_in_memory().unwrap();
    let columns = table_columns(writer.connection(), "Spectra").unwrap();
    assert_eq!(columns.first().map(String::as_str), Some("Id"));
    assert_eq!(columns.last().map(String::as_str), Some("Valid"));
    assert!(columns.iter().any(|c| c == "ParentNativeId"));
    let peaks = table_columns(writer.connection(), "Peaks_MS1Centroided").unwrap();
    assert_eq!(peaks, table_columns(writer.connection(), "Peaks").unwrap());
}

#[test]
fn test_rows_require_files_row() {
    let mut writer = Byspec2Writer::open_in_memory().unwrap();
    let err = writer.write_scans(&[scan(1, 1, 1, 0.0)]).unwrap_err();
    assert!(matches!(err, Byspec2Error::InvalidData(_)));
    let err = writer
        .add_files_info(&[("Version".to_string(), SCHEMA_VERSION.to_string())])
        .unwrap_err();
    assert!(matches!(err, Byspec2Error::InvalidData(_)));
}

#[test]
fn test_files_info_and_info_rows() {
    let mut writer = writer_with_file();
    writer
        .add_files_info(&[
            ("Version".to_string(), SCHEMA_VERSION.to_string()),
            ("TypeWaters".to_string(), "1".to_string()),
        ])
        .unwrap();
    writer
        .add_info(&[("ProfileMode".to_string(), "1".to_string())])
        .unwrap();

    let conn = writer.connection();
    let version: String = conn
        .query_row("SELECT Value FROM FilesInfo WHERE Key = 'Version'", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, "1.0.1");
    let files_id: i64 = conn
        .query_row("SELECT FilesId FROM FilesInfo WHERE Key = 'TypeWaters'", [], |row| row.get(0))
        .unwrap();
    assert_eq!(files_id, 1);
    assert_eq!(count(conn, "Info"), 1);
}

#[test]
fn test_write_scans_links_peaks() {
    let mut writer = writer_with_file();
    writer
        .write_scans(&[scan(1, 1, 1, 0.5), scan(2, 1, 1, 1.5)])
        .unwrap();

    let conn = writer.connection();
    assert_eq!(count(conn, "Spectra"), 2);
    assert_eq!(count(conn, "Peaks"), 2);
    assert_eq!(count(conn, "Peaks_MS1Centroided"), 0);

    let (peaks_id, native_id, valid): (i64, String, i32) = conn
        .query_row(
            "SELECT PeaksId, NativeId, Valid FROM Spectra WHERE ScanNumber = 2",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(peaks_id, 2);
    assert_eq!(native_id, "function=1 process=0 scan=2");
    assert_eq!(valid, 1);

    let (mz, intensity, peaks_count, sum, codec): (Vec<u8>, Vec<u8>, i64, f64, i64) = conn
        .query_row(
            "SELECT PeaksMz, PeaksIntensity, PeaksCount, IntensitySum, CompressionInfoId FROM Peaks WHERE Id = 2",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
        )
        .unwrap();
    assert_eq!(mz.len(), 16);
    assert_eq!(LittleEndian::read_f64(&mz[8..16]), 200.5);
    assert_eq!(intensity.len(), 8);
    assert_eq!(LittleEndian::read_f32(&intensity[0..4]), 10.0);
    assert_eq!(peaks_count, 2);
    assert_eq!(sum, 40.0);
    assert_eq!(codec, UNCOMPRESSED_ID);

    let stats = writer.finish().unwrap();
    assert_eq!(stats.spectra_written, 2);
    assert_eq!(stats.peaks_written, 4);
    assert_eq!(stats.invalid_spectra, 0);
}

#[test]
fn test_invalid_scan_row() {
    let mut writer = writer_with_file();
    let mut broken = scan(1, 1, 1, 0.5);
    broken.spectrum.valid = false;
    broken.spectrum.comment = Some("Decode error: m/z word out of range".to_string());
    broken.peaks = PeaksRow::empty();
    writer.write_scans(&[broken]).unwrap();

    let (valid, comment, peaks_count): (i32, String, i64) = writer
        .connection()
        .query_row(
            "SELECT s.Valid, s.Comment, p.PeaksCount FROM Spectra s JOIN Peaks p ON p.Id = s.PeaksId",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(valid, 0);
    assert!(comment.contains("out of range"));
    assert_eq!(peaks_count, 0);
    assert_eq!(writer.stats().invalid_spectra, 1);
}

#[test]
fn test_centroided_companion_row() {
    let mut writer = writer_with_file();
    let mut row = scan(7, 1, 1, 3.0);
    row.centroided = Some(PeaksRow::uncompressed(&PeakArrays::new(vec![150.0], vec![40.0])));
    writer.write_scans(&[row]).unwrap();

    let peaks_count: i64 = writer
        .connection()
        .query_row("SELECT PeaksCount FROM Peaks_MS1Centroided WHERE Id = 7", [], |row| row.get(0))
        .unwrap();
    assert_eq!(peaks_count, 1);
    assert_eq!(writer.stats().centroided_written, 1);
}

#[test]
fn test_failed_batch_rolls_back() {
    let mut writer = writer_with_file();
    let err = writer
        .write_scans(&[scan(1, 1, 1, 0.0), scan(1, 1, 1, 1.0)])
        .unwrap_err();
    assert!(matches!(err, Byspec2Error::DatabaseError(_)));
    assert_eq!(count(writer.connection(), "Spectra"), 0);
    assert_eq!(count(writer.connection(), "Peaks"), 0);
    assert_eq!(writer.stats().spectra_written, 0);
}

#[test]
fn test_rejects_non_positive_scan_number() {
    let mut writer = writer_with_file();
    let err = writer.write_scans(&[scan(0, 1, 1, 0.0)]).unwrap_err();
    assert!(matches!(err, Byspec2Error::InvalidData(_)));
}

#[test]
fn test_spectra_by_time_order() {
    let mut writer = writer_with_file();
    writer
        .write_scans(&[scan(1, 1, 1, 0.0), scan(2, 1, 1, 2.0), scan(3, 2, 2, 1.0), scan(4, 2, 2, 2.0)])
        .unwrap();
    let keys = writer.spectra_by_time().unwrap();
    let order: Vec<i64> = keys.iter().map(|k| k.scan_number).collect();
    assert_eq!(order, vec![1, 3, 2, 4]);
    assert_eq!(keys[1].ms_level, 2);
    assert_eq!(keys[1].native_id, "function=2 process=0 scan=3");
}

#[test]
fn test_set_parents() {
    let mut writer = writer_with_file();
    writer
        .write_scans(&[scan(1, 1, 1, 0.0), scan(2, 2, 2, 1.0)])
        .unwrap();
    let child = writer.spectra_by_time().unwrap()[1].id;
    let updated = writer
        .set_parents(&[ParentLink {
            id: child,
            parent_scan_number: 1,
            parent_native_id: "function=1 process=0 scan=1".to_string(),
        }])
        .unwrap();
    assert_eq!(updated, 1);
    assert_eq!(writer.stats().parents_linked, 1);

    let (parent, native): (i64, String) = writer
        .connection()
        .query_row(
            "SELECT ParentScanNumber, ParentNativeId FROM Spectra WHERE ScanNumber = 2",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(parent, 1);
    assert_eq!(native, "function=1 process=0 scan=1");
    let survey_parent: Option<i64> = writer
        .connection()
        .query_row("SELECT ParentScanNumber FROM Spectra WHERE ScanNumber = 1", [], |row| row.get(0))
        .unwrap();
    assert_eq!(survey_parent, None);
}

#[test]
fn test_write_chromatograms() {
    let mut writer = writer_with_file();
    let mut tic = Trace::new("TIC1", TraceKind::Tic);
    tic.push(0.5, 100.0);
    tic.push(1.0, 250.0);
    let uv = Trace::new("Trace1_230", TraceKind::Absorption);
    writer.write_chromatograms(&[tic, uv]).unwrap();

    let (kind, x, y, n, meta): (String, Vec<u8>, Vec<u8>, i64, String) = writer
        .connection()
        .query_row(
            "SELECT ChromatogramType, DataX, DataY, DataCount, MetaText FROM Chromatogram WHERE Identifier = 'TIC1'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
        )
        .unwrap();
    assert_eq!(kind, "total ion current chromatogram");
    assert_eq!(LittleEndian::read_f64(&x[8..16]), 1.0);
    assert_eq!(LittleEndian::read_f32(&y[4..8]), 250.0);
    assert_eq!(n, 2);
    assert_eq!(meta, CHROMATOGRAM_META_TEXT);
    assert_eq!(writer.stats().chromatograms_written, 2);
}

#[test]
fn test_chromatogram_length_mismatch() {
    let mut writer = writer_with_file();
    let mut trace = Trace::new("TIC1", TraceKind::Tic);
    trace.times.push(1.0);
    let err = writer.write_chromatograms(&[trace]).unwrap_err();
    assert!(matches!(err, Byspec2Error::InvalidData(_)));
}

#[test]
fn test_compression_info_rows() {
    let mut writer = writer_with_file();
    writer
        .write_compression_info(&[CompressionInfoRow {
            id: PROFILE_COMPRESSION_ID,
            property: "pico:reader:waters:profile".to_string(),
            version: SCHEMA_VERSION.to_string(),
        }])
        .unwrap();
    let property: String = writer
        .connection()
        .query_row("SELECT Property FROM CompressionInfo WHERE Id = 3", [], |row| row.get(0))
        .unwrap();
    assert_eq!(property, "pico:reader:waters:profile");
}

#[test]
fn test_writer_stats_display() {
    let stats = WriterStats {
        spectra_written: 30,
        peaks_written: 90,
        invalid_spectra: 1,
        chromatograms_written: 1,
        ..Default::default()
    };
    assert_eq!(
        stats.to_string(),
        "Wrote 30 spectra (90 peaks, 1 invalid) and 1 chromatograms"
    );
}

#[test]
fn test_create_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.byspec2");
    let mut writer = Byspec2Writer::create(&path).unwrap();
    writer.add_file(&FileRow::default()).unwrap();
    writer.write_scans(&[scan(1, 1, 1, 0.0)]).unwrap();
    writer.finish().unwrap();

    let conn = Connection::open(&path).unwrap();
    assert_eq!(count(&conn, "Spectra"), 1);
}
