use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::conflict::ExistingNames;
use crate::entry::Entry;
use crate::error::{BatchError, ConfigError};

/// Normalize a path by removing Windows long path prefix if present
fn normalize_path(path: &Path) -> PathBuf {
    #[cfg(windows)]
    {
        let path_str = path.to_string_lossy();
        if let Some(stripped) = path_str.strip_prefix("\\\\?\\") {
            PathBuf::from(stripped)
        } else {
            path.to_path_buf()
        }
    }
    #[cfg(not(windows))]
    {
        path.to_path_buf()
    }
}

pub fn default_ignore_dirs() -> Vec<String> {
    [".git", "__pycache__", ".batchren", "node_modules"]
        .iter()
        .map(|s| (*s).to_string())
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Substring a file must contain; empty matches everything
    pub keyword: String,
    pub case_sensitive: bool,
    /// Match `keyword` against the path relative to the root instead of the name
    pub match_path: bool,
    pub include_hidden: bool,
    /// Directory names never descended into
    pub ignore_dirs: Vec<String>,
    /// Glob patterns, relative to the root, of paths to leave out
    pub excludes: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            keyword: String::new(),
            case_sensitive: false,
            match_path: false,
            include_hidden: false,
            ignore_dirs: default_ignore_dirs(),
            excludes: Vec::new(),
        }
    }
}

impl ScanOptions {
    fn keyword_matches(&self, haystack: &str) -> bool {
        if self.keyword.is_empty() {
            return true;
        }
        if self.case_sensitive {
            haystack.contains(&self.keyword)
        } else {
            haystack
                .to_lowercase()
                .contains(&self.keyword.to_lowercase())
        }
    }
}

pub fn build_globset(patterns: &[String]) -> Result<Option<GlobSet>, BatchError> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let invalid = |e: globset::Error| ConfigError::InvalidField {
        field: "exclude",
        reason: e.to_string(),
    };

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).map_err(invalid)?);

        // A bare directory name also excludes everything under it
        if pattern.ends_with('/')
            || (!pattern.contains('*') && !pattern.contains('?') && !pattern.contains('.'))
        {
            let recursive_pattern = if pattern.ends_with('/') {
                format!("{}**", pattern)
            } else {
                format!("{}/**", pattern)
            };
            builder.add(Glob::new(&recursive_pattern).map_err(invalid)?);
        }
    }
    Ok(Some(builder.build().map_err(invalid)?))
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

fn checked_root(root: &Path) -> Result<PathBuf, BatchError> {
    if !root.is_dir() {
        return Err(BatchError::Scan {
            path: root.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }
    root.canonicalize()
        .map(|p| normalize_path(&p))
        .map_err(|e| BatchError::io(root, e))
}

/// Every file under `root` matching the options, in walk order.
/// Unreadable entries are skipped.
pub fn scan_recursive(root: &Path, options: &ScanOptions) -> Result<Vec<Entry>, BatchError> {
    let root = checked_root(root)?;
    let excludes = build_globset(&options.excludes)?;

    let keep_dir = |entry: &DirEntry| {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        !options.ignore_dirs.iter().any(|d| *d == *name)
            && (options.include_hidden || !is_hidden(&name))
    };

    let mut entries = Vec::new();
    for dir_entry in WalkDir::new(&root)
        .follow_links(false)
        .into_iter()
        .filter_entry(keep_dir)
    {
        let Ok(dir_entry) = dir_entry else {
            continue;
        };
        if !dir_entry.file_type().is_file() {
            continue;
        }

        let name = dir_entry.file_name().to_string_lossy();
        if !options.include_hidden && is_hidden(&name) {
            continue;
        }

        let path = dir_entry.path();
        let relative = path.strip_prefix(&root).unwrap_or(path);
        if let Some(ref excludes) = excludes {
            if excludes.is_match(relative) {
                continue;
            }
        }

        let haystack = if options.match_path {
            relative.to_string_lossy()
        } else {
            name
        };
        if !options.keyword_matches(&haystack) {
            continue;
        }

        if let Ok(entry) = Entry::from_path(path) {
            entries.push(entry);
        }
    }
    Ok(entries)
}

/// Files directly inside `dir`, optionally limited to one extension.
///
/// The extension filter ignores case and accepts it with or without the dot.
pub fn scan_directory(
    dir: &Path,
    extension: Option<&str>,
    include_hidden: bool,
) -> Result<Vec<Entry>, BatchError> {
    let dir = checked_root(dir)?;
    let wanted = extension
        .filter(|e| !e.is_empty())
        .map(|e| format!(".{}", e.trim_start_matches('.').to_lowercase()));

    let mut entries = Vec::new();
    for dir_entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
        let Ok(dir_entry) = dir_entry else {
            continue;
        };
        if !dir_entry.file_type().is_file() {
            continue;
        }
        let Ok(entry) = Entry::from_path(dir_entry.path()) else {
            continue;
        };
        if !include_hidden && is_hidden(&entry.name) {
            continue;
        }
        if let Some(ref wanted) = wanted {
            if entry.extension.to_lowercase() != *wanted {
                continue;
            }
        }
        entries.push(entry);
    }
    Ok(entries)
}

/// Every name present in `dir`, files and directories alike
pub fn existing_names(dir: &Path) -> Result<HashSet<String>, BatchError> {
    let read = fs::read_dir(dir).map_err(|e| BatchError::io(dir, e))?;
    let mut names = HashSet::new();
    for entry in read {
        let entry = entry.map_err(|e| BatchError::io(dir, e))?;
        names.insert(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}

/// Current contents of every directory the entries live in
pub fn existing_names_for(entries: &[Entry]) -> Result<ExistingNames, BatchError> {
    let dirs: BTreeSet<&Path> = entries.iter().map(Entry::parent).collect();
    let mut existing = ExistingNames::new();
    for dir in dirs {
        existing.insert(dir, existing_names(dir)?);
    }
    Ok(existing)
}

/// Distinct lower-case extensions (with dot) of the files in `dir`, sorted
pub fn list_extensions(dir: &Path, include_hidden: bool) -> Result<Vec<String>, BatchError> {
    let extensions: BTreeSet<String> = scan_directory(dir, None, include_hidden)?
        .into_iter()
        .filter(|e| !e.extension.is_empty())
        .map(|e| e.extension.to_lowercase())
        .collect();
    Ok(extensions.into_iter().collect())
}
