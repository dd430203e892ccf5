//! Reconciliation: keep only entries the inventory has not seen yet.
//!
//! Two ways to answer "is this path known?", behind `PathIndex`:
//!
//! - `PreloadedIndex` reads every stored path into a `HashSet` once. One
//!   query per run, O(n + m) overall, memory proportional to the inventory.
//! - `PointLookupIndex` asks the store per entry. No upfront load and flat
//!   memory, but one query per discovered entry. Worth it only when the
//!   inventory is huge and the scanned tree is small.
//!
//! Either way the index also remembers what this pass has accepted, so a
//! path seen twice in one pass (overlapping roots, followed links) is only
//! accepted the first time.

use std::collections::HashSet;

use serde::Deserialize;

use super::entry::WalkEntry;
use crate::error::Result;
use crate::store::Store;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LookupStrategy {
    #[default]
    Preload,
    #[serde(alias = "point")]
    PointLookup,
}

impl std::str::FromStr for LookupStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "preload" => Ok(LookupStrategy::Preload),
            "point" | "point-lookup" => Ok(LookupStrategy::PointLookup),
            other => Err(format!("unknown lookup strategy '{other}' (expected preload or point)")),
        }
    }
}

pub trait PathIndex {
    /// Returns true the first time a path that is not in the inventory is
    /// offered, false afterwards and for stored paths.
    fn accept(&mut self, path: &str) -> Result<bool>;
}

pub struct PreloadedIndex {
    known: HashSet<String>,
}

impl PreloadedIndex {
    pub fn load(store: &Store) -> Result<Self> {
        Ok(PreloadedIndex { known: store.known_paths()? })
    }
}

impl PathIndex for PreloadedIndex {
    fn accept(&mut self, path: &str) -> Result<bool> {
        if self.known.contains(path) {
            return Ok(false);
        }
        Ok(self.known.insert(path.to_string()))
    }
}

pub struct PointLookupIndex<'a> {
    store: &'a Store,
    accepted: HashSet<String>,
}

impl<'a> PointLookupIndex<'a> {
    pub fn new(store: &'a Store) -> Self {
        PointLookupIndex { store, accepted: HashSet::new() }
    }
}

impl PathIndex for PointLookupIndex<'_> {
    fn accept(&mut self, path: &str) -> Result<bool> {
        if self.accepted.contains(path) || self.store.contains_path(path)? {
            return Ok(false);
        }
        self.accepted.insert(path.to_string());
        Ok(true)
    }
}

pub fn index_for<'a>(store: &'a Store, strategy: LookupStrategy) -> Result<Box<dyn PathIndex + 'a>> {
    Ok(match strategy {
        LookupStrategy::Preload => Box::new(PreloadedIndex::load(store)?),
        LookupStrategy::PointLookup => Box::new(PointLookupIndex::new(store)),
    })
}

/// Counts from one reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub discovered: usize,
    pub already_known: usize,
}

/// Filter `entries` down to the ones `index` has not seen, preserving order.
pub fn reconcile<I>(
    entries: I,
    index: &mut dyn PathIndex,
    stats: &mut ReconcileStats,
) -> Result<Vec<WalkEntry>>
where
    I: IntoIterator<Item = WalkEntry>,
{
    let mut fresh = Vec::new();
    for entry in entries {
        stats.discovered += 1;
        if index.accept(&entry.path_key())? {
            fresh.push(entry);
        } else {
            stats.already_known += 1;
        }
    }
    Ok(fresh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::entry::{EntryType, InventoryRecord};
    use std::path::Path;

    fn entry(path: &str) -> WalkEntry {
        WalkEntry::from_path(Path::new(path), false).unwrap()
    }

    fn stored(path: &str) -> InventoryRecord {
        let p = Path::new(path);
        InventoryRecord {
            entry_type: EntryType::File,
            format: String::new(),
            name: p.file_name().unwrap().to_string_lossy().into_owned(),
            path: path.to_string(),
            directory: p.parent().unwrap().to_string_lossy().into_owned(),
            size_bytes: Some(0),
            created_at: None,
        }
    }

    fn run(index: &mut dyn PathIndex, paths: &[&str]) -> (Vec<String>, ReconcileStats) {
        let mut stats = ReconcileStats::default();
        let fresh = reconcile(paths.iter().map(|p| entry(p)), index, &mut stats).unwrap();
        (fresh.iter().map(WalkEntry::path_key).collect(), stats)
    }

    #[test]
    fn known_paths_are_dropped() {
        let mut store = Store::open_in_memory().unwrap();
        store.insert_batch(&[stored("/a/1.txt")]).unwrap();
        let mut index = PreloadedIndex::load(&store).unwrap();
        let (fresh, stats) = run(&mut index, &["/a/1.txt", "/a/2.txt"]);
        assert_eq!(fresh, ["/a/2.txt"]);
        assert_eq!(stats, ReconcileStats { discovered: 2, already_known: 1 });
    }

    #[test]
    fn first_occurrence_wins_within_a_pass() {
        let store = Store::open_in_memory().unwrap();
        let mut index = PreloadedIndex::load(&store).unwrap();
        let (fresh, stats) = run(&mut index, &["/a/1.txt", "/a/2.txt", "/a/1.txt"]);
        assert_eq!(fresh, ["/a/1.txt", "/a/2.txt"]);
        assert_eq!(stats.already_known, 1);
    }

    #[test]
    fn point_lookup_matches_preload() {
        let mut store = Store::open_in_memory().unwrap();
        store.insert_batch(&[stored("/a/1.txt"), stored("/a/3.txt")]).unwrap();
        let input = ["/a/1.txt", "/a/2.txt", "/a/3.txt", "/a/2.txt", "/a/4.txt"];

        let mut preload = PreloadedIndex::load(&store).unwrap();
        let mut point = PointLookupIndex::new(&store);

        let (a, stats_a) = run(&mut preload, &input);
        let (b, stats_b) = run(&mut point, &input);
        assert_eq!(a, ["/a/2.txt", "/a/4.txt"]);
        assert_eq!(a, b);
        assert_eq!(stats_a, stats_b);
    }

    #[test]
    fn index_for_builds_either_strategy() {
        let store = Store::open_in_memory().unwrap();
        for strategy in [LookupStrategy::Preload, LookupStrategy::PointLookup] {
            let mut index = index_for(&store, strategy).unwrap();
            assert!(index.accept("/x").unwrap());
            assert!(!index.accept("/x").unwrap());
        }
    }

    #[test]
    fn strategy_parses_from_text() {
        assert_eq!("preload".parse::<LookupStrategy>(), Ok(LookupStrategy::Preload));
        assert_eq!("point".parse::<LookupStrategy>(), Ok(LookupStrategy::PointLookup));
        assert!("hash".parse::<LookupStrategy>().is_err());
    }
}
