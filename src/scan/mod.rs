pub mod cancel;
pub mod entry;
pub mod filter;
pub mod metadata;
pub mod progress;
pub mod reconcile;
pub mod walker;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result, ScanWarning, WarningKind};
use crate::store::Store;
use cancel::CancelToken;
use entry::{InventoryRecord, WalkEntry};
use metadata::Extraction;
use progress::{Phase, ProgressSink};
use reconcile::{LookupStrategy, ReconcileStats};
use walker::{TreeWalker, WalkOptions};

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub roots: Vec<PathBuf>,
    pub walk: WalkOptions,
    pub extraction: Extraction,
    pub lookup: LookupStrategy,
}

impl ScanOptions {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        ScanOptions {
            roots,
            walk: WalkOptions::default(),
            extraction: Extraction::Sequential,
            lookup: LookupStrategy::Preload,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub database: PathBuf,
    pub roots: Vec<PathBuf>,
    /// entries the walker yielded after filtering
    pub discovered: usize,
    /// dropped by reconciliation (stored earlier, or repeated in this pass)
    pub already_known: usize,
    pub inserted: usize,
    /// rejected by the store's path constraint
    pub ignored: usize,
    pub new_bytes: u64,
    pub warnings: Vec<ScanWarning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_memory_bytes: Option<usize>,
}

impl ScanReport {
    fn empty(database: &Path, roots: Vec<PathBuf>) -> Self {
        ScanReport {
            database: database.to_path_buf(),
            roots,
            discovered: 0,
            already_known: 0,
            inserted: 0,
            ignored: 0,
            new_bytes: 0,
            warnings: Vec::new(),
            duration_ms: None,
            peak_memory_bytes: None,
        }
    }

    /// Entries dropped from the pass because they could not be read.
    pub fn skipped(&self) -> usize {
        self.count_warnings(WarningKind::Enumeration)
    }

    /// Entries stored without a creation time.
    pub fn missing_created(&self) -> usize {
        self.count_warnings(WarningKind::Metadata)
    }

    fn count_warnings(&self, kind: WarningKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }

    fn sample_memory(&mut self) {
        if let Some(usage) = memory_stats::memory_stats() {
            let current = usage.physical_mem;
            self.peak_memory_bytes = Some(self.peak_memory_bytes.map_or(current, |p| p.max(current)));
        }
    }
}

/// One reconciliation pass: walk every root, keep what the inventory does
/// not know yet, read its metadata and write it in a single transaction.
///
/// Nothing is written unless every phase succeeds. Per-entry problems end up
/// in `ScanReport::warnings`.
pub fn run(
    store: &mut Store,
    options: &ScanOptions,
    cancel: &CancelToken,
    progress: &dyn ProgressSink,
) -> Result<ScanReport> {
    let start = Instant::now();

    if options.roots.is_empty() {
        return Err(Error::config("no scan roots given"));
    }

    let roots = options
        .roots
        .iter()
        .map(|root| {
            fs::canonicalize(root).map_err(|source| Error::RootUnavailable {
                path: root.clone(),
                source,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut report = ScanReport::empty(store.path(), roots.clone());
    let walker = TreeWalker::new(options.walk.clone());

    let fresh = {
        let mut index = reconcile::index_for(store, options.lookup)?;
        let mut stats = ReconcileStats::default();
        let mut fresh: Vec<WalkEntry> = Vec::new();

        progress.phase(Phase::Walking, 0);
        let mut seen = 0usize;

        for root in &roots {
            let mut walk = walker.walk(root, cancel)?;
            let counted = walk.by_ref().inspect(|_| {
                seen += 1;
                progress.entries_seen(seen);
            });

            fresh.extend(reconcile::reconcile(counted, index.as_mut(), &mut stats)?);
            report.warnings.extend(walk.take_warnings());

            if walk.was_cancelled() {
                info!(root = %root.display(), "scan cancelled during walk");
                return Err(Error::Cancelled);
            }
            debug!(root = %root.display(), discovered = stats.discovered, "root walked");
        }

        report.discovered = stats.discovered;
        report.already_known = stats.already_known;
        fresh
    };
    report.sample_memory();

    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    progress.phase(Phase::Extracting, fresh.len());
    let (records, warnings) = metadata::extract_all(&fresh, options.extraction)?;
    report.warnings.extend(warnings);
    report.sample_memory();

    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    progress.phase(Phase::Writing, records.len());
    let summary = store.insert_batch(&records)?;
    report.inserted = summary.inserted;
    report.ignored = summary.ignored;
    report.new_bytes = total_bytes(&records);

    report.duration_ms = Some(start.elapsed().as_millis());
    progress.finished(report.inserted, report.new_bytes);

    info!(
        discovered = report.discovered,
        inserted = report.inserted,
        warnings = report.warnings.len(),
        "scan complete"
    );
    Ok(report)
}

#[derive(Debug, PartialEq, Eq)]
pub enum AddOutcome {
    Added(InventoryRecord),
    AlreadyPresent,
}

/// Add one file or folder by path.
pub fn add_path(store: &mut Store, path: &Path) -> Result<AddOutcome> {
    let metadata = fs::metadata(path).map_err(|e| Error::io(path, e))?;
    let path = fs::canonicalize(path).map_err(|e| Error::io(path, e))?;
    if path.to_str().is_none() {
        return Err(Error::config(format!("{} is not valid UTF-8", path.display())));
    }

    let entry = WalkEntry::from_path(&path, metadata.is_dir())
        .ok_or_else(|| Error::config(format!("{} has no file name", path.display())))?;

    if store.contains_path(&entry.path_key())? {
        return Ok(AddOutcome::AlreadyPresent);
    }

    let (record, warning) = metadata::extract(&entry)
        .map_err(|w| Error::io(&path, std::io::Error::other(w.message)))?;
    if let Some(warning) = warning {
        warn!("{warning}");
    }

    let summary = store.insert_batch(std::slice::from_ref(&record))?;
    if summary.inserted == 0 {
        return Ok(AddOutcome::AlreadyPresent);
    }
    Ok(AddOutcome::Added(record))
}

fn total_bytes(records: &[InventoryRecord]) -> u64 {
    records
        .iter()
        .filter_map(|r| r.size_bytes)
        .fold(0u64, |acc, s| acc.saturating_add(s))
}
