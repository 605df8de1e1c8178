//! Canonical byspec2 table layout.

use rusqlite::Connection;

use super::error::Byspec2Error;

/// Tables of a byspec2 database, in creation order.
pub const TABLES: [&str; 8] = [
    "Files",
    "FilesInfo",
    "Info",
    "Spectra",
    "Peaks",
    "Peaks_MS1Centroided",
    "CompressionInfo",
    "Chromatogram",
];

/// Value of the `Version` key in `FilesInfo`.
pub const SCHEMA_VERSION: &str = "1.0.1";

const CREATE_FILES: &str = "CREATE TABLE Files(Id INTEGER PRIMARY KEY, Filename TEXT, Location TEXT, Type TEXT, Signature TEXT)";

const CREATE_FILES_INFO: &str = "CREATE TABLE FilesInfo(Id INTEGER PRIMARY KEY, FilesId INT, Key TEXT, Value TEXT, \
     FOREIGN KEY(FilesId) REFERENCES Files(Id))";

const CREATE_INFO: &str = "CREATE TABLE Info(Id INTEGER PRIMARY KEY, Key TEXT, Value TEXT)";

const CREATE_SPECTRA: &str = "CREATE TABLE Spectra(Id INTEGER PRIMARY KEY, FilesId INT, MSLevel INT, ObservedMz REAL, \
     IsolationWindowLowerOffset REAL, IsolationWindowUpperOffset REAL, RetentionTime REAL, ScanNumber INT, \
     NativeId TEXT, ChargeList TEXT, PeaksId INT, PrecursorIntensity REAL, FragmentationType TEXT, \
     ParentScanNumber INT, ParentNativeId TEXT, Comment TEXT, MetaText TEXT, DebugText TEXT, Valid INT DEFAULT 1, \
     FOREIGN KEY(FilesId) REFERENCES Files(Id), FOREIGN KEY(PeaksId) REFERENCES Peaks(Id))";

fn create_peaks(table: &str) -> String {
    format!(
        "CREATE TABLE {}(Id INTEGER PRIMARY KEY, PeaksMz BLOB, PeaksIntensity BLOB, SpectraIdList TEXT, \
         PeaksCount INT, MetaText TEXT, Comment TEXT, IntensitySum REAL, CompressionInfoId INT)",
        table
    )
}

const CREATE_COMPRESSION_INFO: &str = "CREATE TABLE CompressionInfo(Id INTEGER PRIMARY KEY, MzDict BLOB, IntensityDict BLOB, Property TEXT, Version TEXT)";

const CREATE_CHROMATOGRAM: &str = "CREATE TABLE Chromatogram(Id INTEGER PRIMARY KEY, FilesId INT, Identifier TEXT, \
     ChromatogramType TEXT, DataX BLOB, DataY BLOB, DataCount INT, MetaText TEXT, DebugText TEXT, \
     FOREIGN KEY(FilesId) REFERENCES Files(Id))";

/// Full DDL script: every table is dropped, then created.
pub fn schema_sql() -> String {
    let mut sql = String::new();
    for table in TABLES {
        sql.push_str(&format!("DROP TABLE IF EXISTS {};\n", table));
    }
    for stmt in [
        CREATE_FILES.to_string(),
        CREATE_FILES_INFO.to_string(),
        CREATE_INFO.to_string(),
        CREATE_SPECTRA.to_string(),
        create_peaks("Peaks"),
        create_peaks("Peaks_MS1Centroided"),
        CREATE_COMPRESSION_INFO.to_string(),
        CREATE_CHROMATOGRAM.to_string(),
    ] {
        sql.push_str(&stmt);
        sql.push_str(";\n");
    }
    sql
}

/// Drop and recreate all byspec2 tables in one transaction.
///
/// Running it twice leaves the same, empty schema.
pub fn create_schema(conn: &mut Connection) -> Result<(), Byspec2Error> {
    let tx = conn.transaction()?;
    tx.execute_batch(&schema_sql())?;
    tx.commit()?;
    Ok(())
}

/// Column names of `table`, in declaration order.
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>, Byspec2Error> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}
