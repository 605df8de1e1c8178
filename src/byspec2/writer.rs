//! SQLite writer for the byspec2 schema.

use std::path::Path;

use log::{debug, info};
use rusqlite::{params, Connection, Statement};

use crate::peaks::{f32_blob, f64_blob};
use crate::raw::Trace;

use super::error::Byspec2Error;
use super::schema::create_schema;
use super::stats::WriterStats;
use super::types::{CompressionInfoRow, FileRow, ParentLink, PeaksRow, ScanRow, SpectrumKey};

/// `MetaText` of every chromatogram row.
pub const CHROMATOGRAM_META_TEXT: &str = "<RetentionTimeUnit>minute</RetentionTimeUnit>";

const INSERT_SPECTRUM: &str = "INSERT INTO Spectra(FilesId, MSLevel, ObservedMz, IsolationWindowLowerOffset, \
     IsolationWindowUpperOffset, RetentionTime, ScanNumber, NativeId, ChargeList, PeaksId, PrecursorIntensity, \
     FragmentationType, Comment, MetaText, DebugText, Valid) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)";

fn insert_peaks_sql(table: &str) -> String {
    format!(
        "INSERT INTO {}(Id, PeaksMz, PeaksIntensity, PeaksCount, IntensitySum, CompressionInfoId, Comment) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        table
    )
}

fn insert_peaks(stmt: &mut Statement<'_>, id: i64, row: &PeaksRow) -> Result<(), Byspec2Error> {
    stmt.execute(params![
        id,
        row.mz,
        row.intensity,
        row.count as i64,
        row.intensity_sum,
        row.compression_info_id,
        row.comment
    ])?;
    Ok(())
}

/// Owns the byspec2 connection for one conversion.
///
/// The schema is recreated when the writer is opened. Every bulk phase
/// ([`write_scans`](Self::write_scans), [`write_chromatograms`](Self::write_chromatograms),
/// [`set_parents`](Self::set_parents)) runs in its own transaction, which rolls
/// back when a statement fails.
pub struct Byspec2Writer {
    conn: Connection,
    files_id: Option<i64>,
    stats: WriterStats,
}

impl Byspec2Writer {
    /// Open (or create) a database file and recreate the schema.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, Byspec2Error> {
        let path = path.as_ref();
        info!("Creating byspec2 database {}", path.display());
        Self::with_connection(Connection::open(path)?)
    }

    /// In-memory database, for tests and dry runs.
    pub fn open_in_memory() -> Result<Self, Byspec2Error> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    /// Take ownership of an open connection and recreate the schema.
    pub fn with_connection(mut conn: Connection) -> Result<Self, Byspec2Error> {
        create_schema(&mut conn)?;
        Ok(Self {
            conn,
            files_id: None,
            stats: WriterStats::default(),
        })
    }

    /// Underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Counts so far.
    pub fn stats(&self) -> &WriterStats {
        &self.stats
    }

    fn files_id(&self) -> Result<i64, Byspec2Error> {
        self.files_id
            .ok_or_else(|| Byspec2Error::InvalidData("no Files row written yet".to_string()))
    }

    /// Insert the `Files` row; later rows reference its id.
    pub fn add_file(&mut self, file: &FileRow) -> Result<i64, Byspec2Error> {
        self.conn.execute(
            "INSERT INTO Files(Filename, Location, Type, Signature) VALUES (?1, ?2, ?3, ?4)",
            params![file.filename, file.location, file.file_type, file.signature],
        )?;
        let id = self.conn.last_insert_rowid();
        self.files_id = Some(id);
        Ok(id)
    }

    /// Append key/value rows to `FilesInfo`.
    pub fn add_files_info(&mut self, rows: &[(String, String)]) -> Result<(), Byspec2Error> {
        let files_id = self.files_id()?;
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare("INSERT INTO FilesInfo(FilesId, Key, Value) VALUES (?1, ?2, ?3)")?;
            for (key, value) in rows {
                stmt.execute(params![files_id, key, value])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Append key/value rows to `Info`.
    pub fn add_info(&mut self, rows: &[(String, String)]) -> Result<(), Byspec2Error> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare("INSERT INTO Info(Key, Value) VALUES (?1, ?2)")?;
            for (key, value) in rows {
                stmt.execute(params![key, value])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Insert the scans of one function in a single transaction.
    ///
    /// Each `Peaks` row (and optional `Peaks_MS1Centroided` row) is stored under
    /// the scan number, which is also written as `Spectra.PeaksId`.
    pub fn write_scans(&mut self, scans: &[ScanRow]) -> Result<(), Byspec2Error> {
        let files_id = self.files_id()?;
        let mut written = WriterStats::default();
        let tx = self.conn.transaction()?;
        {
            let mut peaks = tx.prepare(&insert_peaks_sql("Peaks"))?;
            let mut centroided = tx.prepare(&insert_peaks_sql("Peaks_MS1Centroided"))?;
            let mut spectra = tx.prepare(INSERT_SPECTRUM)?;
            for scan in scans {
                let s = &scan.spectrum;
                if s.scan_number < 1 {
                    return Err(Byspec2Error::InvalidData(format!(
                        "scan number {} of {} is not positive",
                        s.scan_number, s.native_id
                    )));
                }
                insert_peaks(&mut peaks, s.scan_number, &scan.peaks)?;
                if let Some(row) = &scan.centroided {
                    insert_peaks(&mut centroided, s.scan_number, row)?;
                    written.centroided_written += 1;
                }
                spectra.execute(params![
                    files_id,
                    s.ms_level,
                    s.observed_mz,
                    s.isolation_lower,
                    s.isolation_upper,
                    s.retention_time,
                    s.scan_number,
                    s.native_id,
                    s.charge_list,
                    s.scan_number,
                    s.precursor_intensity,
                    s.fragmentation_type,
                    s.comment,
                    s.meta_text,
                    s.debug_text,
                    s.valid as i32
                ])?;
                written.spectra_written += 1;
                written.peaks_written += scan.peaks.count;
                if !s.valid {
                    written.invalid_spectra += 1;
                }
            }
        }
        tx.commit()?;
        debug!("Committed {} spectra", written.spectra_written);
        self.stats.spectra_written += written.spectra_written;
        self.stats.peaks_written += written.peaks_written;
        self.stats.centroided_written += written.centroided_written;
        self.stats.invalid_spectra += written.invalid_spectra;
        Ok(())
    }

    /// Insert one row per trace: times as `f64` blobs, values as `f32` blobs.
    pub fn write_chromatograms(&mut self, traces: &[Trace]) -> Result<(), Byspec2Error> {
        let files_id = self.files_id()?;
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO Chromatogram(FilesId, Identifier, ChromatogramType, DataX, DataY, DataCount, MetaText) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for trace in traces {
                if trace.times.len() != trace.values.len() {
                    return Err(Byspec2Error::InvalidData(format!(
                        "chromatogram {}: {} times but {} values",
                        trace.identifier,
                        trace.times.len(),
                        trace.values.len()
                    )));
                }
                stmt.execute(params![
                    files_id,
                    trace.identifier,
                    trace.kind.cv_name(),
                    f64_blob(&trace.times),
                    f32_blob(&trace.values),
                    trace.len() as i64,
                    CHROMATOGRAM_META_TEXT
                ])?;
            }
        }
        tx.commit()?;
        self.stats.chromatograms_written += traces.len();
        Ok(())
    }

    /// Insert the codec tags referenced by the peak rows.
    pub fn write_compression_info(&mut self, rows: &[CompressionInfoRow]) -> Result<(), Byspec2Error> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO CompressionInfo(Id, Property, Version) VALUES (?1, ?2, ?3)")?;
            for row in rows {
                stmt.execute(params![row.id, row.property, row.version])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Every spectrum, ordered by `(RetentionTime, ScanNumber)`.
    pub fn spectra_by_time(&self) -> Result<Vec<SpectrumKey>, Byspec2Error> {
        let mut stmt = self.conn.prepare(
            "SELECT Id, MSLevel, ScanNumber, NativeId FROM Spectra ORDER BY RetentionTime, ScanNumber",
        )?;
        let keys = stmt
            .query_map([], |row| {
                Ok(SpectrumKey {
                    id: row.get(0)?,
                    ms_level: row.get(1)?,
                    scan_number: row.get(2)?,
                    native_id: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    /// Store `ParentScanNumber` and `ParentNativeId` in one transaction.
    pub fn set_parents(&mut self, links: &[ParentLink]) -> Result<usize, Byspec2Error> {
        let tx = self.conn.transaction()?;
        tx.execute_batch("CREATE INDEX IF NOT EXISTS idx_SpectraRetentionTime ON Spectra(RetentionTime)")?;
        let mut updated = 0;
        {
            let mut stmt = tx.prepare(
                "UPDATE Spectra SET ParentScanNumber = ?1, ParentNativeId = ?2 WHERE Id = ?3",
            )?;
            for link in links {
                updated += stmt.execute(params![
                    link.parent_scan_number,
                    link.parent_native_id,
                    link.id
                ])?;
            }
        }
        tx.commit()?;
        debug!("Linked {} spectra to a parent scan", updated);
        self.stats.parents_linked += updated;
        Ok(updated)
    }

    /// Close the connection and return the final counts.
    pub fn finish(self) -> Result<WriterStats, Byspec2Error> {
        let stats = self.stats;
        self.conn.close().map_err(|(_, e)| e)?;
        info!("{}", stats);
        Ok(stats)
    }
}
