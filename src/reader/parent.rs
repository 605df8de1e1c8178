//! Parent scan assignment.
//!
//! Spectra are visited in `(retention time, scan number)` order. The parent of a
//! level `n` spectrum is the latest spectrum already visited at level `n - 1`;
//! lock-mass spectra neither get nor provide a parent.

use std::collections::HashMap;

use crate::byspec2::{Byspec2Writer, ParentLink, SpectrumKey};
use crate::classify::CALIBRATION_LEVEL;

use super::error::ReaderError;

/// Latest spectrum per MS level.
#[derive(Debug, Default)]
pub struct ParentTracker {
    last: HashMap<i32, (i64, String)>,
}

impl ParentTracker {
    /// Empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Visit the next spectrum and return its parent scan number and native id.
    pub fn observe(&mut self, ms_level: i32, scan_number: i64, native_id: &str) -> Option<(i64, String)> {
        if ms_level == CALIBRATION_LEVEL {
            return None;
        }
        let parent = if ms_level > 1 {
            self.last.get(&(ms_level - 1)).cloned()
        } else {
            None
        };
        self.last.insert(ms_level, (scan_number, native_id.to_string()));
        parent
    }
}

/// Parent links for spectra already sorted by `(RetentionTime, ScanNumber)`.
pub fn link_parents(keys: &[SpectrumKey]) -> Vec<ParentLink> {
    let mut tracker = ParentTracker::new();
    keys.iter()
        .filter_map(|key| {
            tracker
                .observe(key.ms_level, key.scan_number, &key.native_id)
                .map(|(parent_scan_number, parent_native_id)| ParentLink {
                    id: key.id,
                    parent_scan_number,
                    parent_native_id,
                })
        })
        .collect()
}

/// Run the post-pass over everything stored so far.
pub fn link_stored_parents(writer: &mut Byspec2Writer) -> Result<usize, ReaderError> {
    let keys = writer.spectra_by_time()?;
    let links = link_parents(&keys);
    Ok(writer.set_parents(&links)?)
}
