use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Folder,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::File => "file",
            EntryType::Folder => "folder",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "file" => Some(EntryType::File),
            "folder" => Some(EntryType::Folder),
            _ => None,
        }
    }
}

/// One entry produced by the walker: (parent, name, is_dir).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub parent: PathBuf,
    pub name: OsString,
    pub is_dir: bool,
}

impl WalkEntry {
    pub fn from_path(path: &Path, is_dir: bool) -> Option<Self> {
        Some(WalkEntry {
            parent: path.parent()?.to_path_buf(),
            name: path.file_name()?.to_os_string(),
            is_dir,
        })
    }

    pub fn path(&self) -> PathBuf {
        self.parent.join(&self.name)
    }

    /// Key the inventory uses for this entry.
    pub fn path_key(&self) -> String {
        self.path().to_string_lossy().into_owned()
    }

    pub fn entry_type(&self) -> EntryType {
        if self.is_dir {
            EntryType::Folder
        } else {
            EntryType::File
        }
    }
}

/// A row of the inventory before it has an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct InventoryRecord {
    pub entry_type: EntryType,
    pub format: String,
    pub name: String,
    pub path: String,
    pub directory: String,
    pub size_bytes: Option<u64>,
    pub created_at: Option<String>,
}

/// A row read back from the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredRecord {
    pub id: i64,
    #[serde(flatten)]
    pub record: InventoryRecord,
}

/// Lowercase extension with its leading dot, empty when there is none.
/// `movie.MKV` -> `.mkv`, `.bashrc` -> ``, `notes.` -> `.`
pub fn format_of(name: &Path) -> String {
    match name.extension() {
        Some(ext) => format!(".{}", ext.to_string_lossy().to_lowercase()),
        None => String::new(),
    }
}
