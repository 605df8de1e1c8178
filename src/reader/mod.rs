//! # Waters Reader
//!
//! This module ties the decoding layers together into the two conversion
//! pipelines:
//!
//! - **Full conversion** ([`WatersConverter::convert`]): integrity pre-flight,
//!   classification, per-function decoding with calibration and centroiding,
//!   byspec2 persistence, the parent linking post-pass, then chromatograms and
//!   codec tags.
//! - **Chromatograms only** ([`WatersConverter::convert_chromatograms`]): the
//!   TIC, UV and detector traces without decoding any scan.
//!
//! [`WatersSource`] exposes the same decoding as random access through the
//! [`ScanSource`] trait.
//!
//! ## Peak routing
//!
//! [`CentroidProcessing`] decides per MS level whether profile scans are stored
//! as profile or centroided, whether a centroided companion row is written,
//! and which blobs are compressed. Scans the instrument already centroided are
//! stored as they are.
//!
//! ## Failures
//!
//! A scan that cannot be decoded is stored with `Valid = 0`, no peaks and the
//! error in `Comment`; the count lands in `FilesInfo` as `ScanErrors`. A function
//! whose files are missing or truncated is skipped. Everything else aborts the
//! conversion and leaves no output file.
//!
//! ## Example
//!
//! ```rust,no_run
//! use pico::reader::{CentroidProcessing, ReaderConfig, WatersConverter};
//!
//! let config = ReaderConfig {
//!     centroid_processing: CentroidProcessing::Ms1Profile,
//!     ..Default::default()
//! };
//! let stats = WatersConverter::with_config(config).convert("sample.raw", "sample.byspec2")?;
//! println!("{}", stats);
//! # Ok::<(), pico::reader::ReaderError>(())
//! ```

mod cancel;
mod chromatograms;
mod config;
mod convert;
mod diagnostics;
mod error;
mod parent;
mod source;
mod stats;


pub use cancel::CancellationToken;
pub use chromatograms::collect_traces;
pub use config::{CentroidProcessing, ReaderConfig};
pub use convert::{spectrum_meta_text, WatersConverter, FILE_TYPE};
pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticsSink, LogSink};
pub use error::ReaderError;
pub use parent::{link_parents, link_stored_parents, ParentTracker};
pub use source::{native_id, FunctionDecoder, RunContext, ScanInfo, ScanSource, WatersSource};
pub use stats::ConversionStats;
