//! Waters `.raw` directory scanning.
//!
//! A run directory holds, per acquisition function `N`:
//!
//! - `_FUNC00N.IDX`: one 22- or 30-byte record per scan (point count, flags,
//!   retention time in minutes, TIC)
//! - `_FUNC00N.DAT`: packed points of every scan, back to back
//! - `_FUNC00N.STS`: per-scan status records carrying the precursor m/z
//!
//! plus optional `_CHROMS.INF` / `_CHROnnn.DAT` detector traces.
//!
//! [`RawRun::open`] makes the run-wide decisions (IDX record size, Type1-6
//! points, STS offset shift) once; [`RawRun::open_function`] then loads one
//! function, picks its point layout and detects its peak mode.

mod chroms;
mod cursor;
mod error;
mod idx;
mod layout;
mod probe;
mod scanner;
mod sts;


pub use chroms::{
    parse_chroms_inf, read_auxiliary_traces, read_chro_dat, tic_trace, uv_function_traces,
    ChromChannel, Trace, TraceKind, CHANNEL_PREFIXES,
};
pub use cursor::ByteCursor;
pub use error::RawError;
pub use idx::{detect_record_size, parse_idx, IdxRecord, CENTROID_FLAG, IDX_RECORD_SIZES};
pub use layout::{
    chro_file_name, function_file_name, function_path, read_optional, read_required,
    FunctionFile, CHROMS_FILE,
};
pub use probe::{
    detect_centroid_mode, probe_cal_offset, probe_type1_6, probe_v3c, MAX_DELTA_JITTER,
    MAX_TYPE1_6_GAP, MAX_V3C_POINTS, MIN_CENTROID_LEN,
};
pub use scanner::{FunctionScans, RawRun, ScanHeader};
pub use sts::{
    detect_shift, parse_header, read_precursors, StsGeometry, StsHeader, NO_PRECURSOR,
    PRECURSOR_RANGE,
};
