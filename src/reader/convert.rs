//! Raw directory to byspec2 conversion.
//!
//! Functions are decoded on a producer thread (or the rayon pool with the
//! `parallel` feature) and handed over a bounded channel to the writer, which
//! commits them one transaction per function, in function order, numbering
//! scans as it goes. Output goes to a hidden file next to the target and is only
//! moved into place once every phase succeeded.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use chrono::Local;
use crossbeam_channel::{bounded, Sender};
use log::{debug, info, warn};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tempfile::{Builder, NamedTempFile};

use crate::byspec2::{
    Byspec2Writer, FileRow, PeaksRow, ScanRow, SpectrumRow, SCHEMA_VERSION, UNCOMPRESSED_ID,
};
use crate::centroid::{centroid, compress};
use crate::classify::{FunctionInfo, CALIBRATION_LEVEL};
use crate::integrity::{check_integrity, FindingKind};
use crate::peaks::PeakArrays;
use crate::raw::ScanHeader;

use super::cancel::CancellationToken;
use super::chromatograms::collect_traces;
use super::config::ReaderConfig;
use super::diagnostics::{Diagnostic, DiagnosticsSink, LogSink};
use super::error::ReaderError;
use super::parent::link_stored_parents;
use super::source::{is_function_local, native_id, RunContext};
use super::stats::ConversionStats;

/// `Files.Type` of Waters sources.
pub const FILE_TYPE: &str = "Waters";

const META_RT_SECONDS: &str = "<RetentionTimeUnit>second</RetentionTimeUnit>";

/// `MetaText` of a stored spectrum.
pub fn spectrum_meta_text(profile: bool, ms_level: i32) -> String {
    let mode = if profile {
        "profile spectrum"
    } else {
        "centroid spectrum"
    };
    let mut text = format!("{}<PeakMode>{}</PeakMode>", META_RT_SECONDS, mode);
    if ms_level == CALIBRATION_LEVEL {
        text.push_str("<Calibration>dynamic</Calibration>");
    }
    text
}

/// Scan failures that become an invalid row instead of stopping the conversion.
fn is_scan_local(e: &ReaderError) -> bool {
    matches!(
        e,
        ReaderError::ParseError(_)
            | ReaderError::PartialRead { .. }
            | ReaderError::AllocationFailure(_)
    )
}

/// Decoded rows of one function, scan numbers not yet assigned.
#[derive(Debug)]
struct FunctionBatch {
    function: u32,
    rows: Vec<ScanRow>,
    failures: usize,
}

#[derive(Debug)]
enum FunctionOutcome {
    Decoded(FunctionBatch),
    Skipped { function: u32, reason: String },
}

type Message = (usize, Result<FunctionOutcome, ReaderError>);

/// Converter from Waters `.raw` directories to byspec2 databases
pub struct WatersConverter {
    config: ReaderConfig,
    cancel: CancellationToken,
}

impl WatersConverter {
    /// Create a new converter with default configuration
    pub fn new() -> Self {
        Self::with_config(ReaderConfig::default())
    }

    /// Create a new converter with custom configuration
    pub fn with_config(config: ReaderConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Token that stops a running conversion.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Convert `input` to a byspec2 database at `output`, logging diagnostics.
    pub fn convert<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
    ) -> Result<ConversionStats, ReaderError> {
        self.convert_with_sink(input, output, &LogSink)
    }

    /// Convert `input` to a byspec2 database at `output`.
    ///
    /// On any error, including cancellation, `output` is left untouched.
    pub fn convert_with_sink<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
        sink: &dyn DiagnosticsSink,
    ) -> Result<ConversionStats, ReaderError> {
        let input = input.as_ref();
        let output = output.as_ref();
        info!("Converting {} to {}", input.display(), output.display());
        self.config.validate()?;
        let started = Local::now();

        self.preflight(input, sink)?;
        let context = RunContext::open(input, &self.config, sink)?;
        let staging = staging_file(output)?;
        let mut writer = Byspec2Writer::create(staging.path())?;
        let mut stats = ConversionStats::default();

        writer.add_file(&file_row(input))?;
        let mut files_info = self.files_info(&context);
        files_info.push(("ConversionTime".to_string(), started.to_rfc3339()));
        writer.add_files_info(&files_info)?;
        writer.add_info(&info_rows(&context))?;

        self.run_pipeline(&context, &mut writer, &mut stats, sink, &self.cancel.child())?;
        self.cancel.check()?;

        stats.parents_linked = link_stored_parents(&mut writer)?;
        debug!("{} spectra linked to a parent", stats.parents_linked);

        let traces = collect_traces(&context, sink);
        writer.write_chromatograms(&traces)?;
        stats.chromatograms = traces.len();

        if let Some(message) = stats.scan_errors_message() {
            warn!("{}", message);
            writer.add_files_info(&[("ScanErrors".to_string(), message)])?;
        }
        writer.write_compression_info(&self.config.centroid_processing.compression_info_rows())?;
        writer.finish()?;
        self.cancel.check()?;

        stats.output_file_size = persist(staging, output)?;
        info!("{}", stats);
        Ok(stats)
    }

    /// Write only the chromatograms of `input`, logging diagnostics.
    pub fn convert_chromatograms<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
    ) -> Result<ConversionStats, ReaderError> {
        self.convert_chromatograms_with_sink(input, output, &LogSink)
    }

    /// Write the `Files`, `FilesInfo`, `Info` and `Chromatogram` tables of `input`.
    ///
    /// No scan is decoded, so the integrity check of MS function files is skipped.
    pub fn convert_chromatograms_with_sink<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
        sink: &dyn DiagnosticsSink,
    ) -> Result<ConversionStats, ReaderError> {
        let input = input.as_ref();
        let output = output.as_ref();
        info!(
            "Extracting chromatograms of {} to {}",
            input.display(),
            output.display()
        );
        self.config.validate()?;
        let started = Local::now();

        let context = RunContext::open(input, &self.config, sink)?;
        let staging = staging_file(output)?;
        let mut writer = Byspec2Writer::create(staging.path())?;

        writer.add_file(&file_row(input))?;
        let mut files_info = self.files_info(&context);
        files_info.push(("ConversionTime".to_string(), started.to_rfc3339()));
        writer.add_files_info(&files_info)?;
        writer.add_info(&info_rows(&context))?;

        self.cancel.check()?;
        let traces = collect_traces(&context, sink);
        writer.write_chromatograms(&traces)?;
        writer.finish()?;
        self.cancel.check()?;

        let stats = ConversionStats {
            chromatograms: traces.len(),
            output_file_size: persist(staging, output)?,
            ..Default::default()
        };
        info!("{}", stats);
        Ok(stats)
    }

    /// Integrity check before anything is written.
    fn preflight(&self, input: &Path, sink: &dyn DiagnosticsSink) -> Result<(), ReaderError> {
        if !input.exists() {
            return Err(ReaderError::NotFound(input.display().to_string()));
        }
        if !input.is_dir() {
            return Err(ReaderError::InvalidPath(format!(
                "{} is not a directory",
                input.display()
            )));
        }
        if !self.config.check_integrity {
            return Ok(());
        }
        let report = check_integrity(input);
        for finding in report.findings() {
            if !finding.is_fatal() {
                sink.report(Diagnostic::caution(finding.to_string()));
                continue;
            }
            let message = format!("{}: {}", input.display(), finding);
            return Err(match finding.kind {
                FindingKind::Parse => ReaderError::ParseError(message),
                _ => ReaderError::NotFound(message),
            });
        }
        Ok(())
    }

    /// `FilesInfo` rows known before decoding.
    fn files_info(&self, context: &RunContext) -> Vec<(String, String)> {
        let classification = context.classification();
        let flag = |b: bool, yes: &str, no: &str| if b { yes } else { no }.to_string();
        let mut rows = vec![(
            "MSE".to_string(),
            flag(classification.is_mse(), "1", "0"),
        )];
        rows.extend(
            self.config
                .argv
                .iter()
                .enumerate()
                .map(|(i, arg)| (format!("argv_{}", i), arg.clone())),
        );
        rows.push(("Version".to_string(), SCHEMA_VERSION.to_string()));
        rows.push(("options".to_string(), self.config.options_string()));
        rows.push(("TypeWaters".to_string(), "True".to_string()));
        rows.push((
            "CalAccurate".to_string(),
            flag(classification.accurate, "True", "False"),
        ));
        rows.extend(context.calibration.files_info_rows().iter().cloned());
        rows
    }

    /// Decode every MS function and commit it in function order.
    fn run_pipeline(
        &self,
        context: &RunContext,
        writer: &mut Byspec2Writer,
        stats: &mut ConversionStats,
        sink: &dyn DiagnosticsSink,
        cancel: &CancellationToken,
    ) -> Result<(), ReaderError> {
        let functions: Vec<&FunctionInfo> = context.ms_functions().collect();
        info!("Decoding {} functions", functions.len());
        let (tx, rx) = bounded::<Message>(self.config.channel_capacity);

        thread::scope(|scope| {
            let producer = scope.spawn(move || self.produce(context, &functions, tx, sink, cancel));

            let mut pending: BTreeMap<usize, Result<FunctionOutcome, ReaderError>> = BTreeMap::new();
            let mut next = 0usize;
            let mut next_scan = 1i64;
            let mut result = Ok(());
            for (order, outcome) in rx.iter() {
                pending.insert(order, outcome);
                while let Some(outcome) = pending.remove(&next) {
                    next += 1;
                    result = outcome.and_then(|outcome| {
                        self.commit(outcome, writer, stats, &mut next_scan, sink, cancel)
                    });
                    if result.is_err() {
                        cancel.cancel();
                        break;
                    }
                }
                if result.is_err() {
                    break;
                }
            }
            drop(rx);
            if let Err(panic) = producer.join() {
                std::panic::resume_unwind(panic);
            }
            result
        })
    }

    fn produce(
        &self,
        context: &RunContext,
        functions: &[&FunctionInfo],
        tx: Sender<Message>,
        sink: &dyn DiagnosticsSink,
        cancel: &CancellationToken,
    ) {
        if self.config.parallel {
            self.produce_parallel(context, functions, tx, sink, cancel);
            return;
        }
        for (order, info) in functions.iter().enumerate() {
            let outcome = self.decode_function(context, info, sink, cancel);
            let failed = outcome.is_err();
            if tx.send((order, outcome)).is_err() || failed {
                break;
            }
        }
    }

    #[cfg(feature = "parallel")]
    fn produce_parallel(
        &self,
        context: &RunContext,
        functions: &[&FunctionInfo],
        tx: Sender<Message>,
        sink: &dyn DiagnosticsSink,
        cancel: &CancellationToken,
    ) {
        functions
            .par_iter()
            .enumerate()
            .for_each_with(tx, |tx, (order, info)| {
                let outcome = self.decode_function(context, info, sink, cancel);
                // A closed channel means the writer stopped; cancellation ends the rest.
                let _ = tx.send((order, outcome));
            });
    }

    // Rejected by `ReaderConfig::validate` without the feature.
    #[cfg(not(feature = "parallel"))]
    fn produce_parallel(
        &self,
        _context: &RunContext,
        _functions: &[&FunctionInfo],
        _tx: Sender<Message>,
        _sink: &dyn DiagnosticsSink,
        _cancel: &CancellationToken,
    ) {
    }

    /// Load one function and turn every scan into rows.
    fn decode_function(
        &self,
        context: &RunContext,
        info: &FunctionInfo,
        sink: &dyn DiagnosticsSink,
        cancel: &CancellationToken,
    ) -> Result<FunctionOutcome, ReaderError> {
        cancel.check()?;
        let function = info.number();
        let decoder = match context.decoder(info, &self.config) {
            Ok(decoder) => decoder,
            Err(e) if is_function_local(&e) => {
                return Ok(FunctionOutcome::Skipped {
                    function,
                    reason: e.to_string(),
                })
            }
            Err(e) => return Err(e),
        };
        let total = decoder.scan_count();
        sink.report(Diagnostic::FunctionOpened {
            function,
            layout: decoder.scans.layout,
            centroid_mode: decoder.scans.centroid_mode,
            scans: total,
        });

        let mse = context.classification().is_mse();
        let mut rows = Vec::with_capacity(total);
        let mut failures = 0;
        let mut scratch = Vec::new();
        let mut peaks = PeakArrays::default();
        for index in 0..total {
            cancel.check()?;
            let header = decoder.header(index)?;
            let row = match decoder.decode(index, &mut scratch, &mut peaks) {
                Ok(()) => self.scan_row(info, &header, &peaks, mse)?,
                Err(e) if is_scan_local(&e) => {
                    failures += 1;
                    sink.report(Diagnostic::ScanFailed {
                        function,
                        scan: index + 1,
                        message: e.to_string(),
                    });
                    invalid_row(info, &header, &e)
                }
                Err(e) => return Err(e),
            };
            rows.push(row);
            if (index + 1) % self.config.progress_interval == 0 {
                sink.report(Diagnostic::Progress {
                    function,
                    done: index + 1,
                    total,
                });
            }
        }
        Ok(FunctionOutcome::Decoded(FunctionBatch {
            function,
            rows,
            failures,
        }))
    }

    /// Route decoded peaks into `Peaks` and `Peaks_MS1Centroided` rows.
    fn scan_row(
        &self,
        info: &FunctionInfo,
        header: &ScanHeader,
        peaks: &PeakArrays,
        mse: bool,
    ) -> Result<ScanRow, ReaderError> {
        let mode = self.config.centroid_processing;
        let options = &self.config.centroid_options;
        let level = info.ms_level;

        let (stored, centroided, profile) = if header.centroid {
            (encode_peaks(peaks, mode.centroid_codec())?, None, false)
        } else if mode.keeps_profile(level) {
            let companion = if mode.writes_centroided_companion(level) {
                Some(encode_peaks(&centroid(peaks, options)?, mode.centroid_codec())?)
            } else {
                None
            };
            (encode_peaks(peaks, mode.profile_codec())?, companion, true)
        } else {
            let picked = centroid(peaks, options)?;
            (encode_peaks(&picked, mode.centroid_codec())?, None, false)
        };

        let fragment = level > 1 && level != CALIBRATION_LEVEL;
        let debug_text = (fragment && header.precursor_mz.is_none() && !mse)
            .then(|| "precursor m/z unavailable".to_string());
        Ok(ScanRow {
            spectrum: SpectrumRow {
                ms_level: level,
                observed_mz: if fragment { header.precursor_mz } else { None },
                retention_time: header.retention_time,
                native_id: native_id(info.number(), header.index + 1),
                meta_text: Some(spectrum_meta_text(profile, level)),
                debug_text,
                valid: true,
                ..Default::default()
            },
            peaks: stored,
            centroided,
        })
    }

    /// Number and store one decoded function.
    fn commit(
        &self,
        outcome: FunctionOutcome,
        writer: &mut Byspec2Writer,
        stats: &mut ConversionStats,
        next_scan: &mut i64,
        sink: &dyn DiagnosticsSink,
        cancel: &CancellationToken,
    ) -> Result<(), ReaderError> {
        cancel.check()?;
        let mut batch = match outcome {
            FunctionOutcome::Decoded(batch) => batch,
            FunctionOutcome::Skipped { function, reason } => {
                warn!("function {} skipped: {}", function, reason);
                sink.report(Diagnostic::FunctionSkipped {
                    function,
                    reason: reason.clone(),
                });
                stats.functions_skipped.push((function, reason));
                return Ok(());
            }
        };
        for row in &mut batch.rows {
            row.spectrum.scan_number = *next_scan;
            *next_scan += 1;
        }
        writer.write_scans(&batch.rows)?;

        for row in &batch.rows {
            stats.count_spectrum(row.spectrum.ms_level, row.peaks.count);
        }
        stats.scan_errors += batch.failures;
        stats.functions_converted += 1;
        debug!(
            "function {}: committed {} scans ({} failed)",
            batch.function,
            batch.rows.len(),
            batch.failures
        );
        Ok(())
    }
}

impl Default for WatersConverter {
    fn default() -> Self {
        Self::new()
    }
}

/// Placeholder row of a scan that failed to decode.
fn invalid_row(info: &FunctionInfo, header: &ScanHeader, error: &ReaderError) -> ScanRow {
    ScanRow {
        spectrum: SpectrumRow {
            ms_level: info.ms_level,
            retention_time: header.retention_time,
            native_id: native_id(info.number(), header.index + 1),
            comment: Some(error.to_string()),
            meta_text: Some(META_RT_SECONDS.to_string()),
            valid: false,
            ..Default::default()
        },
        peaks: PeaksRow::empty(),
        centroided: None,
    }
}

fn encode_peaks(peaks: &PeakArrays, codec: i64) -> Result<PeaksRow, ReaderError> {
    if codec == UNCOMPRESSED_ID {
        return Ok(PeaksRow::uncompressed(peaks));
    }
    let packed = compress(peaks)?;
    Ok(PeaksRow {
        mz: packed.mz,
        intensity: packed.intensity,
        count: peaks.len(),
        intensity_sum: peaks.intensity_sum(),
        compression_info_id: codec,
        comment: None,
    })
}

fn file_row(input: &Path) -> FileRow {
    let filename = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    let location = input
        .parent()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    FileRow {
        filename,
        location,
        file_type: FILE_TYPE.to_string(),
        signature: None,
    }
}

fn info_rows(context: &RunContext) -> Vec<(String, String)> {
    let mut rows = context
        .metadata
        .extern_info
        .as_ref()
        .map(|ext| ext.info_rows())
        .unwrap_or_default();
    rows.extend(context.metadata.inlet.iter().cloned());
    rows
}

/// Hidden temporary database in the output directory.
fn staging_file(output: &Path) -> Result<NamedTempFile, ReaderError> {
    if output.is_dir() {
        return Err(ReaderError::InvalidPath(format!(
            "{} is a directory",
            output.display()
        )));
    }
    let parent: PathBuf = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !parent.is_dir() {
        return Err(ReaderError::InvalidPath(format!(
            "output directory {} does not exist",
            parent.display()
        )));
    }
    Ok(Builder::new()
        .prefix(".pico-")
        .suffix(".byspec2")
        .tempfile_in(&parent)?)
}

/// Move the finished database into place and return its size.
fn persist(staging: NamedTempFile, output: &Path) -> Result<u64, ReaderError> {
    staging.persist(output).map_err(|e| ReaderError::IoError(e.error))?;
    Ok(fs::metadata(output)?.len())
}
