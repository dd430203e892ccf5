//! Entry filters applied by the walker before any metadata is read.
//!
//! - `ExclusionRules`: extension blocklist (files) and path substring blocklist (everything)
//! - `FormatFilter`: optional extension allowlist for files

use std::collections::HashSet;
use std::path::Path;

use super::entry::format_of;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionRules {
    extensions: HashSet<String>,
    path_substrings: Vec<String>,
}

impl ExclusionRules {
    pub fn new<E, P>(extensions: E, path_substrings: P) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        ExclusionRules {
            extensions: extensions.into_iter().map(|e| normalize_extension(e.as_ref())).collect(),
            path_substrings: path_substrings
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty())
                .collect(),
        }
    }

    pub fn none() -> Self {
        ExclusionRules::default()
    }

    pub fn excludes_file(&self, path: &Path) -> bool {
        if !self.extensions.is_empty() && self.extensions.contains(&format_of(path)) {
            return true;
        }
        self.excludes_path(path)
    }

    /// Folders are only matched by path; an excluded folder prunes its subtree.
    pub fn excludes_dir(&self, path: &Path) -> bool {
        self.excludes_path(path)
    }

    fn excludes_path(&self, path: &Path) -> bool {
        if self.path_substrings.is_empty() {
            return false;
        }
        let text = path.to_string_lossy();
        self.path_substrings.iter().any(|needle| text.contains(needle.as_str()))
    }
}

/// Extension allowlist. `None` means every format is accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatFilter {
    allowed: Option<HashSet<String>>,
}

impl FormatFilter {
    pub fn all() -> Self {
        FormatFilter { allowed: None }
    }

    pub fn only<I>(formats: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let allowed: HashSet<String> = formats
            .into_iter()
            .map(|f| normalize_extension(f.as_ref()))
            .collect();

        if allowed.is_empty() {
            FormatFilter::all()
        } else {
            FormatFilter { allowed: Some(allowed) }
        }
    }

    pub fn accepts(&self, path: &Path) -> bool {
        match &self.allowed {
            Some(allowed) => allowed.contains(&format_of(path)),
            None => true,
        }
    }
}

/// "TMP", "tmp" and ".tmp" all mean ".tmp".
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ExclusionRules {
        ExclusionRules::new([".tmp", "INI"], ["$RECYCLE.BIN"])
    }

    #[test]
    fn extension_blocklist_is_case_insensitive() {
        let rules = rules();
        assert!(rules.excludes_file(Path::new("/d/a.tmp")));
        assert!(rules.excludes_file(Path::new("/d/desktop.INI")));
        assert!(!rules.excludes_file(Path::new("/d/b.txt")));
    }

    #[test]
    fn path_substring_matches_anywhere() {
        let rules = rules();
        assert!(rules.excludes_file(Path::new("/d/$RECYCLE.BIN/S-1-5/old.txt")));
        assert!(rules.excludes_dir(Path::new("/d/$RECYCLE.BIN")));
        assert!(!rules.excludes_dir(Path::new("/d/films")));
    }

    #[test]
    fn extension_rules_do_not_apply_to_folders() {
        let rules = rules();
        assert!(!rules.excludes_dir(Path::new("/d/backup.tmp")));
    }

    #[test]
    fn empty_rules_exclude_nothing() {
        let rules = ExclusionRules::new(Vec::<String>::new(), [""]);
        assert_eq!(rules, ExclusionRules::none());
        assert!(!rules.excludes_file(Path::new("/d/a.tmp")));
    }

    #[test]
    fn format_filter_allowlist() {
        let filter = FormatFilter::only(["mkv", ".MP4"]);
        assert!(filter.accepts(Path::new("/films/a.mkv")));
        assert!(filter.accepts(Path::new("/films/b.mp4")));
        assert!(!filter.accepts(Path::new("/films/c.srt")));
        assert!(FormatFilter::all().accepts(Path::new("/films/c.srt")));
    }

    #[test]
    fn empty_allowlist_means_all() {
        let filter = FormatFilter::only(Vec::<String>::new());
        assert_eq!(filter, FormatFilter::all());
    }
}
