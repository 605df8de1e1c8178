//! TIC, UV and detector traces of a run.

use log::debug;

use crate::raw::{
    function_path, parse_idx, read_auxiliary_traces, read_required, tic_trace, uv_function_traces,
    FunctionFile, RawError, Trace,
};

use super::diagnostics::{Diagnostic, DiagnosticsSink};
use super::source::RunContext;

/// Collect every chromatogram: the TIC of function 1, one trace per wavelength
/// of each UV function, then the `_CHROMS.INF` channels.
///
/// A trace source that cannot be read is reported as a caution and left out.
pub fn collect_traces(context: &RunContext, sink: &dyn DiagnosticsSink) -> Vec<Trace> {
    let mut traces = Vec::new();
    let dir = context.dir();
    let idx_size = context.run.idx_record_size;

    if context.classification().ms_level(1) >= 1 {
        let path = function_path(dir, 1, FunctionFile::Idx);
        let tic = read_required(&path)
            .and_then(|bytes| parse_idx(&path.display().to_string(), &bytes, idx_size))
            .map(|records| tic_trace(&records));
        match tic {
            Ok(trace) => traces.push(trace),
            Err(e) => sink.report(Diagnostic::caution(format!("no TIC trace: {}", e))),
        }
    }

    let mut uv_traces = 0;
    for info in context.uv_functions() {
        let function = info.number();
        let read = |kind| read_required(&function_path(dir, function, kind));
        let result = read(FunctionFile::Idx)
            .and_then(|idx| Ok((idx, read(FunctionFile::Dat)?)))
            .and_then(|(idx, dat)| uv_function_traces(&idx, &dat, idx_size, uv_traces));
        match result {
            Ok(found) => {
                debug!("function {}: {} UV traces", function, found.len());
                uv_traces += found.len();
                traces.extend(found);
            }
            Err(e) => sink.report(Diagnostic::caution(format!(
                "UV function {} skipped: {}",
                function, e
            ))),
        }
    }

    match read_auxiliary_traces(dir, uv_traces) {
        Ok(found) => traces.extend(found),
        Err(e) => sink.report(Diagnostic::caution(format!(
            "detector channels skipped: {}",
            auxiliary_error(e)
        ))),
    }
    traces
}

fn auxiliary_error(e: RawError) -> String {
    match e {
        RawError::NotFound(file) => format!("missing {}", file),
        other => other.to_string(),
    }
}
