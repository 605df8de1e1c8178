use std::fmt;

use serde::Serialize;

#[cfg(feature = "colorized_output")]
use console::style;

use crate::raw::{chro_file_name, function_file_name, FunctionFile, CHROMS_FILE};

/// Kind of missing or corrupt content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FindingKind {
    /// Raw directory missing, empty or unreadable
    FileIo,
    /// `_extern.inf` could not be parsed
    Parse,
    /// No `_extern.inf`
    MissingExternInf,
    /// `_FUNCTNS.INF` missing or unreadable
    MissingFunctionsInf,
    /// No `_HEADER.TXT`
    MissingHeaderTxt,
    /// Function without its DAT file
    MissingDat,
    /// Function without its IDX file
    MissingIdx,
    /// Function without its STS file
    MissingSts,
    /// `_CHROnnn.DAT` files without `_CHROMS.INF`
    MissingChromInf,
    /// `_CHROMS.INF` could not be parsed
    ChromParseError,
    /// Channel without its `_CHROnnn.DAT` file
    MissingChromDat,
}

/// One problem found by the integrity check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    /// What is wrong
    pub kind: FindingKind,
    /// Function or chromatogram number, 0 when not file specific
    pub number: u32,
    /// MS level of the function, when known
    pub ms_level: Option<i32>,
    /// Underlying error text
    pub detail: Option<String>,
}

impl Finding {
    /// Finding that is not tied to a function.
    pub fn new(kind: FindingKind) -> Self {
        Self {
            kind,
            number: 0,
            ms_level: None,
            detail: None,
        }
    }

    /// Finding about function or chromatogram `number`.
    pub fn file(kind: FindingKind, number: u32, ms_level: Option<i32>) -> Self {
        Self {
            kind,
            number,
            ms_level,
            detail: None,
        }
    }

    /// Attach error text.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Fatal findings stop a conversion.
    ///
    /// Missing function files are fatal only for MS levels 1 to 8; UV traces and
    /// the lock-mass channel can be lost without losing the run.
    pub fn is_fatal(&self) -> bool {
        match self.kind {
            FindingKind::FileIo | FindingKind::Parse | FindingKind::MissingExternInf => true,
            FindingKind::MissingDat | FindingKind::MissingIdx | FindingKind::MissingSts => {
                self.ms_level.is_some_and(|l| (1..=8).contains(&l))
            }
            _ => false,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FindingKind::FileIo => write!(f, "missing or unreadable raw directory")?,
            FindingKind::Parse => write!(f, "corrupt _extern.inf file")?,
            FindingKind::MissingExternInf => write!(f, "missing _extern.inf file")?,
            FindingKind::MissingFunctionsInf => write!(f, "missing or corrupt _FUNCTNS.INF file")?,
            FindingKind::MissingHeaderTxt => write!(f, "missing _HEADER.TXT file")?,
            FindingKind::MissingDat => {
                write!(f, "missing {} file", function_file_name(self.number, FunctionFile::Dat))?
            }
            FindingKind::MissingIdx => {
                write!(f, "missing {} file", function_file_name(self.number, FunctionFile::Idx))?
            }
            FindingKind::MissingSts => {
                write!(f, "missing {} file", function_file_name(self.number, FunctionFile::Sts))?
            }
            FindingKind::MissingChromInf => write!(f, "missing {} file", CHROMS_FILE)?,
            FindingKind::ChromParseError => write!(f, "corrupt {} file", CHROMS_FILE)?,
            FindingKind::MissingChromDat => write!(f, "missing {} file", chro_file_name(self.number))?,
        }
        if let Some(level) = self.ms_level {
            write!(f, " (MS level {})", level)?;
        }
        if let Some(detail) = &self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}

/// Overall outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IntegrityResult {
    /// Nothing missing
    Success,
    /// Only non-critical content missing
    Warning,
    /// At least one fatal finding
    Error,
}

impl fmt::Display for IntegrityResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityResult::Success => write!(f, "Success"),
            IntegrityResult::Warning => write!(f, "Warning"),
            IntegrityResult::Error => write!(f, "Error"),
        }
    }
}

/// Integrity check result status
#[derive(Debug, Clone, Serialize)]
pub enum CheckStatus {
    /// Check passed
    Ok,
    /// Non-critical content missing
    Warning(Finding),
    /// Fatal content missing
    Failed(Finding),
}

impl CheckStatus {
    fn is_ok(&self) -> bool {
        matches!(self, CheckStatus::Ok)
    }

    fn is_failed(&self) -> bool {
        matches!(self, CheckStatus::Failed(_))
    }

    fn is_warning(&self) -> bool {
        matches!(self, CheckStatus::Warning(_))
    }
}

/// Individual integrity check result
#[derive(Debug, Clone, Serialize)]
pub struct IntegrityCheck {
    /// What was checked
    pub name: String,
    /// Outcome
    pub status: CheckStatus,
}

impl IntegrityCheck {
    pub(crate) fn ok(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Ok,
        }
    }

    /// Warning or failure, depending on how severe the finding is.
    pub(crate) fn finding(name: impl Into<String>, finding: Finding) -> Self {
        let status = if finding.is_fatal() {
            CheckStatus::Failed(finding)
        } else {
            CheckStatus::Warning(finding)
        };
        Self {
            name: name.into(),
            status,
        }
    }
}

/// Complete integrity report for a raw directory
#[derive(Debug, Serialize)]
pub struct IntegrityReport {
    /// Individual checks in the order they ran
    pub checks: Vec<IntegrityCheck>,
    /// Directory that was checked
    pub dir: String,
}

impl IntegrityReport {
    /// Empty report for `dir`.
    pub fn new(dir: impl Into<String>) -> Self {
        Self {
            checks: Vec::new(),
            dir: dir.into(),
        }
    }

    /// Add a check result
    pub fn add_check(&mut self, check: IntegrityCheck) {
        self.checks.push(check);
    }

    /// All findings, fatal or not
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.checks.iter().filter_map(|c| match &c.status {
            CheckStatus::Ok => None,
            CheckStatus::Warning(f) | CheckStatus::Failed(f) => Some(f),
        })
    }

    /// True when any check failed
    pub fn has_failures(&self) -> bool {
        self.checks.iter().any(|c| c.status.is_failed())
    }

    /// True when any check produced a warning
    pub fn has_warnings(&self) -> bool {
        self.checks.iter().any(|c| c.status.is_warning())
    }

    /// Count of passed checks
    pub fn success_count(&self) -> usize {
        self.checks.iter().filter(|c| c.status.is_ok()).count()
    }

    /// Count of warnings
    pub fn warning_count(&self) -> usize {
        self.checks.iter().filter(|c| c.status.is_warning()).count()
    }

    /// Count of failures
    pub fn failure_count(&self) -> usize {
        self.checks.iter().filter(|c| c.status.is_failed()).count()
    }

    /// Tri-state outcome
    pub fn result(&self) -> IntegrityResult {
        if self.has_failures() {
            IntegrityResult::Error
        } else if self.has_warnings() {
            IntegrityResult::Warning
        } else {
            IntegrityResult::Success
        }
    }

    fn verdict(&self) -> &'static str {
        match self.result() {
            IntegrityResult::Error => "Error (fatal): missing or corrupt content",
            IntegrityResult::Warning => "Warning: missing or corrupt non-critical content",
            IntegrityResult::Success => "Success: integrity check completed",
        }
    }

    /// Format the report with colors (requires console feature)
    pub fn format_colored(&self) -> String {
        #[cfg(feature = "colorized_output")]
        {
            use console::Emoji;

            static OK: Emoji<'_, '_> = Emoji("✓", "[OK]");
            static WARN: Emoji<'_, '_> = Emoji("⚠", "[WARN]");
            static FAIL: Emoji<'_, '_> = Emoji("✗", "[FAIL]");

            let mut output = String::new();
            output.push_str(&format!("{}\n", style("Raw Integrity Report").bold().cyan()));
            output.push_str(&format!("{}\n", style("====================").cyan()));
            output.push_str(&format!("{}: {}\n\n", style("Directory").bold(), self.dir));

            for check in &self.checks {
                match &check.status {
                    CheckStatus::Ok => {
                        output.push_str(&format!("[{}] {}\n", OK, style(&check.name).green()));
                    }
                    CheckStatus::Warning(finding) => {
                        output.push_str(&format!(
                            "[{}] {} - {}: {}\n",
                            WARN,
                            style(&check.name).yellow(),
                            style("WARNING").yellow().bold(),
                            finding
                        ));
                    }
                    CheckStatus::Failed(finding) => {
                        output.push_str(&format!(
                            "[{}] {} - {}: {}\n",
                            FAIL,
                            style(&check.name).red(),
                            style("FAILED").red().bold(),
                            finding
                        ));
                    }
                }
            }

            output.push('\n');
            output.push_str(&format!(
                "{}: {} passed, {} warnings, {} failed\n",
                style("Summary").bold(),
                style(self.success_count()).green(),
                style(self.warning_count()).yellow(),
                style(self.failure_count()).red()
            ));
            output.push('\n');
            let verdict = match self.result() {
                IntegrityResult::Error => style(self.verdict()).red().bold(),
                IntegrityResult::Warning => style(self.verdict()).yellow().bold(),
                IntegrityResult::Success => style(self.verdict()).green().bold(),
            };
            output.push_str(&format!("{}\n", verdict));
            output
        }

        #[cfg(not(feature = "colorized_output"))]
        {
            format!("{}", self)
        }
    }
}

impl fmt::Display for IntegrityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Raw Integrity Report")?;
        writeln!(f, "====================")?;
        writeln!(f, "Directory: {}", self.dir)?;
        writeln!(f)?;

        for check in &self.checks {
            match &check.status {
                CheckStatus::Ok => writeln!(f, "[✓] {}", check.name)?,
                CheckStatus::Warning(finding) => {
                    writeln!(f, "[⚠] {} - WARNING: {}", check.name, finding)?
                }
                CheckStatus::Failed(finding) => {
                    writeln!(f, "[✗] {} - FAILED: {}", check.name, finding)?
                }
            }
        }

        writeln!(f)?;
        writeln!(
            f,
            "Summary: {} passed, {} warnings, {} failed",
            self.success_count(),
            self.warning_count(),
            self.failure_count()
        )?;
        writeln!(f)?;
        writeln!(f, "{}", self.verdict())
    }
}
