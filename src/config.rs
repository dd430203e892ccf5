//! Configuration: an optional TOML file merged with command line flags.
//!
//! ```toml
//! database = "/srv/inventory/drives.db"
//! threads = 0
//! lookup = "preload"        # or "point"
//! timeout = "2h"
//!
//! [exclude]
//! extensions = [".ini", ".tmp"]
//! paths = ["$RECYCLE.BIN"]
//!
//! [video]
//! formats = [".mkv", ".mp4"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cli::{DbArgs, ScanArgs};
use crate::error::{Error, Result};
use crate::scan::filter::{ExclusionRules, FormatFilter};
use crate::scan::metadata::Extraction;
use crate::scan::reconcile::LookupStrategy;
use crate::scan::walker::WalkOptions;
use crate::scan::ScanOptions;

const APP_NAME: &str = "tally";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub database: Option<PathBuf>,
    pub threads: usize,
    pub lookup: LookupStrategy,
    pub timeout: Option<String>,
    pub exclude: ExcludeSection,
    pub video: VideoSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExcludeSection {
    pub extensions: Vec<String>,
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VideoSection {
    pub formats: Vec<String>,
}

impl Default for FileConfig {
    fn default() -> Self {
        FileConfig {
            database: None,
            threads: 0,
            lookup: LookupStrategy::Preload,
            timeout: None,
            exclude: ExcludeSection::default(),
            video: VideoSection::default(),
        }
    }
}

impl Default for ExcludeSection {
    fn default() -> Self {
        ExcludeSection {
            extensions: vec![".ini".into(), ".tmp".into()],
            paths: vec!["$RECYCLE.BIN".into(), "$IQY2E5Z".into()],
        }
    }
}

impl Default for VideoSection {
    fn default() -> Self {
        VideoSection {
            formats: vec![".mkv".into(), ".mp4".into()],
        }
    }
}

impl FileConfig {
    /// Load from an explicit path (must exist) or the default location
    /// (silently falls back to defaults when absent).
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.is_file() => path,
                _ => return Ok(FileConfig::default()),
            },
        };

        let text = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        FileConfig::parse(&text).map_err(|e| match e {
            Error::Config { message } => Error::config(format!("{}: {message}", path.display())),
            other => other,
        })
    }

    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::config(e.to_string()))
    }

    pub fn timeout(&self) -> Result<Option<Duration>> {
        self.timeout
            .as_deref()
            .map(|s| humantime::parse_duration(s).map_err(|e| Error::config(format!("timeout '{s}': {e}"))))
            .transpose()
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join("config.toml"))
}

/// `~/.local/share/tally/tally.db` or the platform equivalent. Creates the directory.
pub fn default_db_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", APP_NAME)
        .ok_or_else(|| Error::config("could not determine data directory"))?;
    let data_dir = dirs.data_dir().to_path_buf();

    fs::create_dir_all(&data_dir).map_err(|e| Error::io(&data_dir, e))?;
    Ok(data_dir.join(format!("{APP_NAME}.db")))
}

/// Flag, then config file, then platform default.
pub fn resolve_db_path(args: &DbArgs, file: &FileConfig) -> Result<PathBuf> {
    match args.db.as_ref().or(file.database.as_ref()) {
        Some(path) => Ok(path.clone()),
        None => default_db_path(),
    }
}

pub struct Config {
    pub database: PathBuf,
    pub scan: ScanOptions,
    pub timeout: Option<Duration>,
    pub json_output: bool,
    pub verbose: bool,
}

impl Config {
    pub fn from_scan_args(args: &ScanArgs, file: &FileConfig) -> Result<Self> {
        let exclusions = if args.no_exclude {
            ExclusionRules::none()
        } else {
            let extensions = args.exclude_ext.as_ref().unwrap_or(&file.exclude.extensions);
            let paths = args.exclude_path.as_ref().unwrap_or(&file.exclude.paths);
            ExclusionRules::new(extensions, paths.iter().cloned())
        };

        let formats = match (&args.format, args.video) {
            (Some(formats), _) => FormatFilter::only(formats),
            (None, true) => FormatFilter::only(&file.video.formats),
            (None, false) => FormatFilter::all(),
        };

        let extraction = if args.parallel {
            Extraction::Parallel { threads: args.threads.unwrap_or(file.threads) }
        } else {
            Extraction::Sequential
        };

        let timeout = match args.timeout {
            Some(timeout) => Some(timeout),
            None => file.timeout()?,
        };

        Ok(Config {
            database: resolve_db_path(&args.db, file)?,
            scan: ScanOptions {
                roots: args.roots.clone(),
                walk: WalkOptions {
                    recursive: !args.no_recurse,
                    record_folders: args.folders,
                    follow_links: args.follow_links,
                    exclusions,
                    formats,
                },
                extraction,
                lookup: args.lookup.unwrap_or(file.lookup),
            },
            timeout,
            json_output: args.json,
            verbose: args.verbose,
        })
    }
}
