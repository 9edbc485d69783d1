use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// One file considered for renaming, captured from a filesystem snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Absolute path; identity key within one planning run
    pub path: PathBuf,
    pub name: String,
    pub stem: String,
    /// Extension including the leading dot, or empty
    pub extension: String,
    pub size: u64,
    pub modified: SystemTime,
    /// Creation time where the platform reports one, otherwise the modified time
    pub created: SystemTime,
}

impl Entry {
    /// Build an entry without touching the filesystem
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: SystemTime) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (stem, extension) = split_name(&name);
        Self {
            path,
            name,
            stem,
            extension,
            size,
            modified,
            created: modified,
        }
    }

    /// Stat a file and build its entry
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        let modified = metadata.modified()?;
        let mut entry = Self::new(path, metadata.len(), modified);
        entry.created = metadata.created().unwrap_or(modified);
        Ok(entry)
    }

    /// Directory holding this entry
    pub fn parent(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}

/// Split a file name into stem and extension the way `Path` does:
/// a leading dot never starts an extension.
pub fn split_name(name: &str) -> (String, String) {
    let path = Path::new(name);
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => (
            stem.to_string_lossy().into_owned(),
            format!(".{}", ext.to_string_lossy()),
        ),
        _ => (name.to_string(), String::new()),
    }
}

/// Ordering used to assign sequence numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Mtime,
    Size,
    Name,
    Ctime,
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mtime" => Ok(Self::Mtime),
            "size" => Ok(Self::Size),
            "name" => Ok(Self::Name),
            "ctime" => Ok(Self::Ctime),
            other => Err(format!("unknown sort key: {}", other)),
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Mtime => "mtime",
            Self::Size => "size",
            Self::Name => "name",
            Self::Ctime => "ctime",
        };
        f.write_str(name)
    }
}

fn compare_entries(a: &Entry, b: &Entry, key: SortKey) -> Ordering {
    let by_name = || a.name.to_lowercase().cmp(&b.name.to_lowercase());
    match key {
        SortKey::Mtime => a.modified.cmp(&b.modified).then_with(by_name),
        SortKey::Size => a.size.cmp(&b.size).then_with(by_name),
        SortKey::Ctime => a.created.cmp(&b.created).then_with(by_name),
        SortKey::Name => by_name(),
    }
}

/// Sort entries into batch order. Ties fall back to the lower-cased name.
pub fn sort_entries(mut entries: Vec<Entry>, key: SortKey, reverse: bool) -> Vec<Entry> {
    entries.sort_by(|a, b| {
        let ord = compare_entries(a, b, key);
        if reverse {
            ord.reverse()
        } else {
            ord
        }
    });
    entries
}

/// Sort entries by lower-cased path, the stable batch order for replace mode
pub fn sort_by_path(mut entries: Vec<Entry>) -> Vec<Entry> {
    entries.sort_by_key(|e| e.path.to_string_lossy().to_lowercase());
    entries
}
