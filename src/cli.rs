use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::export::ExportStyle;
use crate::scan::reconcile::LookupStrategy;

#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Catalogue directory trees into a SQLite inventory, adding only what is new")]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to the platform config dir, e.g. ~/.config/tally/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the inventory if needed and add new entries from the given roots
    Scan(ScanArgs),

    /// Add new entries to an inventory that must already exist
    Update(ScanArgs),

    /// Add a single file or folder
    Add(AddArgs),

    /// Write the inventory to a text file
    Export(ExportArgs),

    /// List file names that appear more than once
    Duplicates(DbArgs),

    /// List mounted volumes that can be used as scan roots
    Volumes,
}

#[derive(Parser, Clone, Default)]
pub struct DbArgs {
    /// Inventory database (defaults to the platform data dir)
    #[arg(long)]
    pub db: Option<PathBuf>,
}

#[derive(Parser, Clone, Default)]
pub struct ScanArgs {
    /// Directories to scan
    #[arg(required = true)]
    pub roots: Vec<PathBuf>,

    #[command(flatten)]
    pub db: DbArgs,

    /// Only look at direct children of each root
    #[arg(long, default_value_t = false)]
    pub no_recurse: bool,

    /// Record folders as well as files
    #[arg(long, default_value_t = false)]
    pub folders: bool,

    /// Only record video files (formats from the [video] config section)
    #[arg(long, default_value_t = false)]
    pub video: bool,

    /// Only record files with these extensions, e.g. .jpg,.png
    #[arg(long, value_delimiter = ',')]
    pub format: Option<Vec<String>>,

    /// Skip files with these extensions (replaces the configured list)
    #[arg(long, value_delimiter = ',')]
    pub exclude_ext: Option<Vec<String>>,

    /// Skip paths containing any of these substrings (replaces the configured list)
    #[arg(long, value_delimiter = ',')]
    pub exclude_path: Option<Vec<String>>,

    /// Ignore all configured exclusions
    #[arg(long, default_value_t = false)]
    pub no_exclude: bool,

    /// Follow symbolic links while walking
    #[arg(long, default_value_t = false)]
    pub follow_links: bool,

    /// Read file metadata on a worker pool
    #[arg(long, default_value_t = false)]
    pub parallel: bool,

    /// Worker pool size for --parallel (0 = one per hardware thread)
    #[arg(long)]
    pub threads: Option<usize>,

    /// How known paths are checked: preload or point
    #[arg(long)]
    pub lookup: Option<LookupStrategy>,

    /// Give up after this long, e.g. 30m or 2h. Nothing is written on timeout.
    #[arg(long, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Output the scan report as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Show detailed output including warnings
    #[arg(long, short = 'v', default_value_t = false)]
    pub verbose: bool,
}

#[derive(Parser)]
pub struct AddArgs {
    /// File or folder to add
    pub path: PathBuf,

    #[command(flatten)]
    pub db: DbArgs,
}

#[derive(Parser)]
pub struct ExportArgs {
    /// Output text file
    #[arg(long, short = 'o')]
    pub out: PathBuf,

    /// Line layout
    #[arg(long, value_enum, default_value_t = ExportStyle::Generic)]
    pub style: ExportStyle,

    #[command(flatten)]
    pub db: DbArgs,
}
