//! Per-entry metadata: size for files, creation time for everything.
//!
//! Never aborts a scan. An entry that can no longer be stat-ed comes back as
//! an enumeration warning. An unreadable creation time leaves `created_at`
//! empty; the record is kept and a metadata warning rides along with it.

use std::fs;
use std::io;
use std::time::SystemTime;

use chrono::{DateTime, Local};
use rayon::prelude::*;
use tracing::{debug, warn};

use super::entry::{format_of, InventoryRecord, WalkEntry};
use crate::error::{Error, Result, ScanWarning};

pub const CREATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    Sequential,
    /// worker pool size, 0 = one per hardware thread
    Parallel { threads: usize },
}

/// A record plus the non-fatal problem hit while reading it, if any.
pub type Extracted = (InventoryRecord, Option<ScanWarning>);

pub fn extract(entry: &WalkEntry) -> Result<Extracted, ScanWarning> {
    let path = entry.path();
    let metadata = fs::metadata(&path).map_err(|e| ScanWarning::enumeration(&path, e.to_string()))?;
    Ok(build_record(entry, metadata.len(), metadata.created()))
}

/// Turn what a stat returned into a record. `len` is ignored for folders.
fn build_record(entry: &WalkEntry, len: u64, created: io::Result<SystemTime>) -> Extracted {
    let path = entry.path();
    let warning = match &created {
        Err(e) => {
            debug!(path = %path.display(), "creation time unavailable: {e}");
            Some(ScanWarning::metadata(&path, e))
        }
        Ok(_) => None,
    };

    let size_bytes = if entry.is_dir { None } else { Some(len) };
    let format = if entry.is_dir { String::new() } else { format_of(&path) };

    let record = InventoryRecord {
        entry_type: entry.entry_type(),
        format,
        name: entry.name.to_string_lossy().into_owned(),
        path: path.to_string_lossy().into_owned(),
        directory: entry.parent.to_string_lossy().into_owned(),
        size_bytes,
        created_at: format_created(created),
    };
    (record, warning)
}

pub fn format_created(created: io::Result<SystemTime>) -> Option<String> {
    let time = created.ok()?;
    let local: DateTime<Local> = time.into();
    Some(local.format(CREATED_FORMAT).to_string())
}

/// Extract every entry. Results come back sorted by path regardless of mode.
pub fn extract_all(
    entries: &[WalkEntry],
    mode: Extraction,
) -> Result<(Vec<InventoryRecord>, Vec<ScanWarning>)> {
    let results: Vec<Result<Extracted, ScanWarning>> = match mode {
        Extraction::Sequential => entries.iter().map(extract).collect(),
        Extraction::Parallel { threads } => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(|i| format!("tally-stat-{i}"))
                .build()
                .map_err(|e| Error::config(format!("cannot start worker pool: {e}")))?;

            debug!(threads = pool.current_num_threads(), entries = entries.len(), "parallel extraction");
            // install() returns once every task is done
            pool.install(|| entries.par_iter().map(extract).collect())
        }
    };

    let mut records = Vec::with_capacity(results.len());
    let mut warnings = Vec::new();
    for result in results {
        match result {
            Ok((record, warning)) => {
                records.push(record);
                warnings.extend(warning);
            }
            Err(warning) => {
                warn!("skipping entry: {warning}");
                warnings.push(warning);
            }
        }
    }

    records.sort_by(|a, b| a.path.cmp(&b.path));
    Ok((records, warnings))
}
