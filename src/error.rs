//! Error types.
//!
//! Two tiers:
//! - `Error`: per-run failures. Returned to the caller, the pass is aborted.
//! - `ScanWarning`: per-entry problems. Collected in the report, the walk continues.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Database could not be opened or its schema could not be created.
    #[error("cannot open inventory {path}: {source}")]
    StoreConnection {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// `update` was asked to work on a database that does not exist.
    #[error("inventory not found: {path}")]
    StoreMissing { path: PathBuf },

    /// A scan root could not be opened.
    #[error("cannot open scan root {path}: {source}")]
    RootUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("scan root is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Insert or commit failed, the whole pass was rolled back.
    #[error("failed to write inventory: {0}")]
    Write(#[source] rusqlite::Error),

    /// Reading from the inventory failed after it was opened.
    #[error("failed to query inventory: {0}")]
    Query(#[source] rusqlite::Error),

    #[error("scan cancelled")]
    Cancelled,

    #[error("invalid configuration: {message}")]
    Config { message: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Config { message: message.into() }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Entry vanished or could not be read during enumeration.
    Enumeration,
    /// Entry was found but its metadata could not be read.
    Metadata,
}

/// Non-fatal problem with a single entry.
#[derive(Debug, Clone, Serialize)]
pub struct ScanWarning {
    pub path: PathBuf,
    pub message: String,
    pub kind: WarningKind,
}

impl ScanWarning {
    pub fn enumeration(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ScanWarning {
            path: path.into(),
            message: message.into(),
            kind: WarningKind::Enumeration,
        }
    }

    pub fn metadata(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        ScanWarning {
            path: path.into(),
            message: error.to_string(),
            kind: WarningKind::Metadata,
        }
    }
}

impl std::fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.as_os_str().is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path.display(), self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_display_includes_path() {
        let warning = ScanWarning::enumeration("/films/gone.mkv", "No such file or directory");
        assert_eq!(warning.to_string(), "/films/gone.mkv: No such file or directory");
        assert_eq!(warning.kind, WarningKind::Enumeration);
    }

    #[test]
    fn warning_display_without_path() {
        let warning = ScanWarning::enumeration("", "walk aborted");
        assert_eq!(warning.to_string(), "walk aborted");
    }

    #[test]
    fn metadata_warning_carries_io_message() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let warning = ScanWarning::metadata("/x", &io);
        assert_eq!(warning.kind, WarningKind::Metadata);
        assert!(warning.message.contains("denied"));
    }
}
