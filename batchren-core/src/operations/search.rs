use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::path::Path;

use super::batch::{current_dir_or, resolve_root};
use crate::entry::sort_by_path;
use crate::output::{SearchHit, SearchResult};
use crate::scanner::{scan_recursive, ScanOptions};

/// List the files a replace run over `dir` with this keyword would consider
pub fn search_operation(
    dir: &Path,
    scan: &ScanOptions,
    working_dir: Option<&Path>,
) -> Result<SearchResult> {
    let current_dir = current_dir_or(working_dir)?;
    let root = resolve_root(dir, &current_dir);

    let entries = scan_recursive(&root, scan)
        .with_context(|| format!("Failed to scan {}", root.display()))?;

    let hits = sort_by_path(entries)
        .into_iter()
        .map(|entry| SearchHit {
            modified: DateTime::<Local>::from(entry.modified).to_rfc3339(),
            size: entry.size,
            path: entry.path,
        })
        .collect();

    Ok(SearchResult {
        root,
        keyword: scan.keyword.clone(),
        hits,
    })
}
