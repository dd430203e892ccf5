//! Tree walker.
//!
//! Lazily yields `WalkEntry` values (parent, name, is_dir) under a root.
//! Filters run here, before anything is stat-ed beyond what the directory
//! listing already tells us. Entries that vanish or cannot be read are
//! recorded as warnings and skipped; only an unreadable root is fatal.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};
use walkdir::{DirEntry, FilterEntry, WalkDir};

use super::cancel::CancelToken;
use super::entry::WalkEntry;
use super::filter::{ExclusionRules, FormatFilter};
use crate::error::{Error, Result, ScanWarning};

#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// false: direct children of the root only
    pub recursive: bool,
    /// yield folders as entries (they are descended into either way)
    pub record_folders: bool,
    pub follow_links: bool,
    pub exclusions: ExclusionRules,
    pub formats: FormatFilter,
}

impl Default for WalkOptions {
    fn default() -> Self {
        WalkOptions {
            recursive: true,
            record_folders: false,
            follow_links: false,
            exclusions: ExclusionRules::none(),
            formats: FormatFilter::all(),
        }
    }
}

pub struct TreeWalker {
    options: WalkOptions,
}

impl TreeWalker {
    pub fn new(options: WalkOptions) -> Self {
        TreeWalker { options }
    }

    /// Start a walk. Fails only if the root itself cannot be listed.
    pub fn walk<'a>(&'a self, root: &Path, cancel: &'a CancelToken) -> Result<Walk<'a>> {
        let metadata = fs::metadata(root).map_err(|source| Error::RootUnavailable {
            path: root.to_path_buf(),
            source,
        })?;

        if !metadata.is_dir() {
            return Err(Error::NotADirectory { path: root.to_path_buf() });
        }

        // metadata succeeds on unreadable dirs, read_dir does not
        fs::read_dir(root).map_err(|source| Error::RootUnavailable {
            path: root.to_path_buf(),
            source,
        })?;

        let max_depth = if self.options.recursive { usize::MAX } else { 1 };
        let exclusions = &self.options.exclusions;

        let prune: Box<dyn FnMut(&DirEntry) -> bool + 'a> = Box::new(move |e: &DirEntry| {
            !(e.file_type().is_dir() && exclusions.excludes_dir(e.path()))
        });

        let inner = WalkDir::new(root)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(self.options.follow_links)
            .into_iter()
            .filter_entry(prune);

        debug!(root = %root.display(), recursive = self.options.recursive, "walk started");

        Ok(Walk {
            inner,
            options: &self.options,
            cancel,
            warnings: Vec::new(),
            cancelled: false,
        })
    }
}

pub struct Walk<'a> {
    inner: FilterEntry<walkdir::IntoIter, Box<dyn FnMut(&DirEntry) -> bool + 'a>>,
    options: &'a WalkOptions,
    cancel: &'a CancelToken,
    warnings: Vec<ScanWarning>,
    cancelled: bool,
}

impl Walk<'_> {
    /// True if the walk stopped early because the token was tripped.
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn take_warnings(&mut self) -> Vec<ScanWarning> {
        std::mem::take(&mut self.warnings)
    }

    fn record_error(&mut self, err: walkdir::Error) {
        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
        warn!(path = %path.display(), "skipping entry: {err}");
        self.warnings.push(ScanWarning::enumeration(path, err.to_string()));
    }
}

impl Iterator for Walk<'_> {
    type Item = WalkEntry;

    fn next(&mut self) -> Option<WalkEntry> {
        if self.cancelled {
            return None;
        }

        loop {
            let dent = match self.inner.next()? {
                Ok(dent) => dent,
                Err(err) => {
                    self.record_error(err);
                    continue;
                }
            };

            let path = dent.path();

            if path.to_str().is_none() {
                warn!(path = %path.display(), "skipping entry: path is not valid UTF-8");
                self.warnings
                    .push(ScanWarning::enumeration(path, "path is not valid UTF-8"));
                continue;
            }

            // an unfollowed link to a directory is still a folder, it is just not descended
            let is_dir = if dent.path_is_symlink() && !dent.file_type().is_dir() {
                fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
            } else {
                dent.file_type().is_dir()
            };

            if is_dir {
                // checked before the walker descends into it
                if self.cancel.is_cancelled() {
                    debug!(at = %path.display(), "walk cancelled");
                    self.cancelled = true;
                    return None;
                }
                if !self.options.record_folders || self.options.exclusions.excludes_dir(path) {
                    continue;
                }
            } else if self.options.exclusions.excludes_file(path)
                || !self.options.formats.accepts(path)
            {
                continue;
            }

            match WalkEntry::from_path(path, is_dir) {
                Some(entry) => return Some(entry),
                None => continue,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("a.tmp"), b"a").unwrap();
        fs::write(root.join("b.txt"), b"b").unwrap();
        fs::create_dir_all(root.join("sub/deeper")).unwrap();
        fs::write(root.join("sub/c.mkv"), b"c").unwrap();
        fs::write(root.join("sub/deeper/d.mp4"), b"d").unwrap();
        dir
    }

    fn collect(options: WalkOptions, root: &Path) -> HashSet<PathBuf> {
        let walker = TreeWalker::new(options);
        let cancel = CancelToken::new();
        walker.walk(root, &cancel).unwrap().map(|e| e.path()).collect()
    }

    #[test]
    fn non_recursive_yields_direct_children_only() {
        let dir = tree();
        let options = WalkOptions { recursive: false, record_folders: true, ..Default::default() };
        let got = collect(options, dir.path());

        let expected: HashSet<PathBuf> = ["a.tmp", "b.txt", "sub"]
            .iter()
            .map(|n| dir.path().join(n))
            .collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn recursive_yields_all_descendants() {
        let dir = tree();
        let options = WalkOptions { record_folders: true, ..Default::default() };
        let got = collect(options, dir.path());

        let expected: HashSet<PathBuf> =
            ["a.tmp", "b.txt", "sub", "sub/deeper", "sub/c.mkv", "sub/deeper/d.mp4"]
                .iter()
                .map(|n| dir.path().join(n))
                .collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn folders_are_descended_but_not_yielded_by_default() {
        let dir = tree();
        let got = collect(WalkOptions::default(), dir.path());
        assert_eq!(got.len(), 4);
        assert!(got.contains(&dir.path().join("sub/deeper/d.mp4")));
        assert!(!got.contains(&dir.path().join("sub")));
    }

    #[test]
    fn excluded_folder_prunes_subtree() {
        let dir = tree();
        let options = WalkOptions {
            record_folders: true,
            exclusions: ExclusionRules::new(Vec::<String>::new(), ["deeper"]),
            ..Default::default()
        };
        let got = collect(options, dir.path());
        assert!(!got.contains(&dir.path().join("sub/deeper")));
        assert!(!got.contains(&dir.path().join("sub/deeper/d.mp4")));
        assert!(got.contains(&dir.path().join("sub/c.mkv")));
    }

    #[test]
    fn format_allowlist_applies_to_files() {
        let dir = tree();
        let options = WalkOptions {
            formats: FormatFilter::only([".mkv", ".mp4"]),
            ..Default::default()
        };
        let got = collect(options, dir.path());
        assert_eq!(got.len(), 2);
    }

    #[test]
    fn missing_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let walker = TreeWalker::new(WalkOptions::default());
        let cancel = CancelToken::new();
        let result = walker.walk(&dir.path().join("nope"), &cancel);
        assert!(matches!(result, Err(Error::RootUnavailable { .. })));
    }

    #[test]
    fn file_root_is_rejected() {
        let dir = tree();
        let walker = TreeWalker::new(WalkOptions::default());
        let cancel = CancelToken::new();
        let result = walker.walk(&dir.path().join("b.txt"), &cancel);
        assert!(matches!(result, Err(Error::NotADirectory { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn unfollowed_directory_link_is_a_folder() {
        let dir = tree();
        fs::create_dir(dir.path().join("real.mkv")).unwrap();
        fs::write(dir.path().join("real.mkv/inner.txt"), b"i").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.mkv"), dir.path().join("alias.mkv")).unwrap();

        let files = collect(WalkOptions::default(), dir.path());
        assert!(!files.contains(&dir.path().join("alias.mkv")));
        assert!(files.contains(&dir.path().join("real.mkv/inner.txt")));

        let walker = TreeWalker::new(WalkOptions { record_folders: true, ..Default::default() });
        let cancel = CancelToken::new();
        let entries: Vec<WalkEntry> = walker.walk(dir.path(), &cancel).unwrap().collect();

        let alias = entries.iter().find(|e| e.name == "alias.mkv").unwrap();
        assert!(alias.is_dir);
        assert!(!entries.iter().any(|e| e.path().starts_with(dir.path().join("alias.mkv/inner.txt"))));
    }

    #[cfg(unix)]
    #[test]
    fn excluded_directory_link_is_not_yielded() {
        let dir = tree();
        std::os::unix::fs::symlink(dir.path().join("sub"), dir.path().join("skipme")).unwrap();

        let options = WalkOptions {
            record_folders: true,
            exclusions: ExclusionRules::new(Vec::<String>::new(), ["skipme"]),
            ..Default::default()
        };
        let got = collect(options, dir.path());
        assert!(!got.contains(&dir.path().join("skipme")));
        assert!(got.contains(&dir.path().join("sub")));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_names_are_skipped_with_warning() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tree();
        fs::write(dir.path().join(OsStr::from_bytes(b"bad\xff.mkv")), b"x").unwrap();
        fs::write(dir.path().join(OsStr::from_bytes(b"bad\xfe.mkv")), b"y").unwrap();

        let walker = TreeWalker::new(WalkOptions::default());
        let cancel = CancelToken::new();
        let mut walk = walker.walk(dir.path(), &cancel).unwrap();
        let got: Vec<WalkEntry> = walk.by_ref().collect();

        assert_eq!(got.len(), 4);
        let warnings = walk.take_warnings();
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().all(|w| w.kind == crate::error::WarningKind::Enumeration));
    }

    #[test]
    fn cancelled_token_stops_at_first_directory() {
        let dir = tree();
        let walker = TreeWalker::new(WalkOptions { record_folders: true, ..Default::default() });
        let cancel = CancelToken::new();
        cancel.cancel();

        let mut walk = walker.walk(dir.path(), &cancel).unwrap();
        let got: Vec<_> = walk.by_ref().collect();
        assert!(walk.was_cancelled());
        assert!(got.iter().all(|e| !e.is_dir));
        assert!(!got.iter().any(|e| e.path().starts_with(dir.path().join("sub"))));
    }
}
