//! Structured diagnostics emitted during one conversion.
//!
//! The converter reports through a [`DiagnosticsSink`] passed to the call, so
//! nothing outlives the conversion. [`LogSink`] forwards to the `log` facade;
//! [`CollectingSink`] keeps everything in memory.

use std::sync::Mutex;

use log::{debug, info, warn};
use serde::Serialize;

use crate::classify::{CentroidMode, FunctionRole, Rule};
use crate::codec::PointLayout;

/// One diagnostic event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Classification result of a function
    FunctionClassified {
        /// 1-based function number
        function: u32,
        /// Resolved MS level
        ms_level: i32,
        /// Resolved role
        role: FunctionRole,
        /// Rules that fired
        rules: Vec<Rule>,
    },
    /// Layout and peak mode picked for a function
    FunctionOpened {
        /// 1-based function number
        function: u32,
        /// Point layout
        layout: PointLayout,
        /// Detected peak mode
        centroid_mode: CentroidMode,
        /// Number of scans
        scans: usize,
    },
    /// A function was not converted
    FunctionSkipped {
        /// 1-based function number
        function: u32,
        /// Why
        reason: String,
    },
    /// A scan failed to decode and was stored as invalid
    ScanFailed {
        /// 1-based function number
        function: u32,
        /// 1-based scan number inside the function
        scan: usize,
        /// Error text
        message: String,
    },
    /// Non-fatal inconsistency
    Caution {
        /// What was found
        message: String,
    },
    /// Scans of a function decoded so far
    Progress {
        /// 1-based function number
        function: u32,
        /// Scans done
        done: usize,
        /// Scans expected
        total: usize,
    },
}

impl Diagnostic {
    /// A [`Diagnostic::Caution`].
    pub fn caution(message: impl Into<String>) -> Self {
        Diagnostic::Caution {
            message: message.into(),
        }
    }
}

/// Receiver of diagnostics; shared between decode workers.
pub trait DiagnosticsSink: Send + Sync {
    /// Handle one event.
    fn report(&self, diagnostic: Diagnostic);
}

/// Forwards every diagnostic to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticsSink for LogSink {
    fn report(&self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::FunctionClassified {
                function,
                ms_level,
                role,
                rules,
            } => info!(
                "function {}: MS level {} ({}) via {:?}",
                function, ms_level, role, rules
            ),
            Diagnostic::FunctionOpened {
                function,
                layout,
                centroid_mode,
                scans,
            } => info!(
                "function {}: {} scans, {:?} points, {:?}",
                function, scans, layout, centroid_mode
            ),
            Diagnostic::FunctionSkipped { function, reason } => {
                warn!("function {} skipped: {}", function, reason)
            }
            Diagnostic::ScanFailed {
                function,
                scan,
                message,
            } => warn!("function {} scan {}: {}", function, scan, message),
            Diagnostic::Caution { message } => warn!("caution: {}", message),
            Diagnostic::Progress {
                function,
                done,
                total,
            } => {
                let pct = if total > 0 {
                    done as f64 / total as f64 * 100.0
                } else {
                    100.0
                };
                debug!(
                    "Progress: function {} {}/{} scans ({:.1}%)",
                    function, done, total, pct
                )
            }
        }
    }
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the events received so far.
    pub fn events(&self) -> Vec<Diagnostic> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Drain the events received so far.
    pub fn take(&self) -> Vec<Diagnostic> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }
}

impl DiagnosticsSink for CollectingSink {
    fn report(&self, diagnostic: Diagnostic) {
        if let Ok(mut events) = self.events.lock() {
            events.push(diagnostic);
        }
    }
}
