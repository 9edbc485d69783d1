use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::Path;

use super::batch::{current_dir_or, resolve_root, run_batch, BatchOptions};
use crate::entry::{sort_entries, Entry, SortKey};
use crate::error::{BatchError, ConfigError};
use crate::output::{BatchResult, ExtensionsResult};
use crate::rule::{NamingRule, SequenceRule};
use crate::scanner::{list_extensions, scan_directory};

/// Parameters of a numbering run
#[derive(Debug, Clone)]
pub struct SequenceOptions {
    pub extension: Option<String>,
    pub sort: SortKey,
    pub reverse: bool,
    pub start: u64,
    pub padding: usize,
    pub prefix: String,
    pub suffix: String,
    pub keep_extension: bool,
    pub include_hidden: bool,
}

impl Default for SequenceOptions {
    fn default() -> Self {
        Self {
            extension: None,
            sort: SortKey::Mtime,
            reverse: false,
            start: 1,
            padding: 3,
            prefix: String::new(),
            suffix: String::new(),
            keep_extension: true,
            include_hidden: false,
        }
    }
}

/// Number the files directly inside `dir` in sorted order
pub fn sequence_operation(
    dir: &Path,
    sequence: &SequenceOptions,
    options: &BatchOptions,
    working_dir: Option<&Path>,
) -> Result<(BatchResult, Option<String>)> {
    let current_dir = current_dir_or(working_dir)?;
    let root = resolve_root(dir, &current_dir);

    let rule = SequenceRule::new(
        sequence.start,
        sequence.padding,
        sequence.prefix.as_str(),
        sequence.suffix.as_str(),
        sequence.keep_extension,
    )
    .map_err(BatchError::from)?;

    let entries = scan_directory(&root, sequence.extension.as_deref(), sequence.include_hidden)
        .with_context(|| format!("Failed to list {}", root.display()))?;
    ensure_single_directory(&entries)?;
    let entries = sort_entries(entries, sequence.sort, sequence.reverse);
    rule.check_capacity(entries.len()).map_err(BatchError::from)?;

    let ordering = if sequence.reverse {
        format!("{} (descending)", sequence.sort)
    } else {
        sequence.sort.to_string()
    };

    let (result, preview) = run_batch(
        &entries,
        &NamingRule::Sequence(rule),
        &ordering,
        &root,
        options,
        &current_dir,
    )?;

    if entries.is_empty() {
        let message = match sequence.extension {
            Some(ref ext) => format!("No {} files found in {}", ext, root.display()),
            None => format!("No files found in {}", root.display()),
        };
        return Ok((result, Some(message)));
    }

    Ok((result, preview))
}

/// Extensions of the files a sequence run in `dir` could number
pub fn extensions_operation(
    dir: &Path,
    include_hidden: bool,
    working_dir: Option<&Path>,
) -> Result<ExtensionsResult> {
    let current_dir = current_dir_or(working_dir)?;
    let dir = resolve_root(dir, &current_dir);
    let extensions = list_extensions(&dir, include_hidden)
        .with_context(|| format!("Failed to list {}", dir.display()))?;
    Ok(ExtensionsResult { dir, extensions })
}

/// Sequence numbering is only meaningful inside one directory
pub fn ensure_single_directory(entries: &[Entry]) -> Result<(), BatchError> {
    let dirs: BTreeSet<&Path> = entries.iter().map(Entry::parent).collect();
    if dirs.len() > 1 {
        return Err(ConfigError::MultipleDirectories(dirs.len()).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::CasePolicy;
    use crate::execute::Outcome;
    use crate::plan::StepStatus;
    use crate::preview::Preview;
    use std::fs;
    use std::time::SystemTime;
    use serial_test::serial;
    use tempfile::TempDir;

    fn options(dry_run: bool) -> BatchOptions {
        BatchOptions {
            dry_run,
            auto_approve: true,
            preview: Preview::None,
            use_color: Some(false),
            case_policy: CasePolicy::Sensitive,
            ..BatchOptions::default()
        }
    }

    #[test]
    #[serial]
    fn test_sequence_by_name_with_extension_filter() {
        let temp = TempDir::new().unwrap();
        for name in ["c.jpg", "a.jpg", "b.JPG", "notes.txt"] {
            fs::write(temp.path().join(name), name).unwrap();
        }

        let sequence = SequenceOptions {
            extension: Some("jpg".to_string()),
            sort: SortKey::Name,
            prefix: "img_".to_string(),
            ..SequenceOptions::default()
        };
        let (result, _) =
            sequence_operation(temp.path(), &sequence, &options(false), Some(temp.path())).unwrap();

        assert_eq!(result.outcome(), Some(Outcome::Applied));
        assert_eq!(fs::read_to_string(temp.path().join("img_001.jpg")).unwrap(), "a.jpg");
        assert_eq!(fs::read_to_string(temp.path().join("img_002.JPG")).unwrap(), "b.JPG");
        assert_eq!(fs::read_to_string(temp.path().join("img_003.jpg")).unwrap(), "c.jpg");
        assert!(temp.path().join("notes.txt").exists());
    }

    #[test]
    #[serial]
    fn test_sequence_rotation_through_existing_names() {
        let temp = TempDir::new().unwrap();
        // Reverse name order maps 1 -> 2 and 2 -> 1: a swap
        fs::write(temp.path().join("1"), "one").unwrap();
        fs::write(temp.path().join("2"), "two").unwrap();

        let sequence = SequenceOptions {
            sort: SortKey::Name,
            reverse: true,
            padding: 0,
            ..SequenceOptions::default()
        };
        let (result, _) =
            sequence_operation(temp.path(), &sequence, &options(false), Some(temp.path())).unwrap();

        let execution = result.execution.unwrap();
        assert_eq!(execution.count(StepStatus::Committed), 2);
        assert!(execution.auto_suffixed.is_empty());
        assert_eq!(fs::read_to_string(temp.path().join("1")).unwrap(), "two");
        assert_eq!(fs::read_to_string(temp.path().join("2")).unwrap(), "one");
    }

    #[test]
    fn test_sequence_rejects_wide_padding() {
        let temp = TempDir::new().unwrap();
        let sequence = SequenceOptions {
            padding: 100,
            ..SequenceOptions::default()
        };
        let err = sequence_operation(temp.path(), &sequence, &options(true), Some(temp.path()))
            .unwrap_err();
        assert!(err.to_string().contains("padding of 100 digits"));
    }

    #[test]
    fn test_sequence_rejects_start_that_overflows() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a"), "a").unwrap();
        fs::write(temp.path().join("b"), "b").unwrap();
        let sequence = SequenceOptions {
            start: u64::MAX,
            ..SequenceOptions::default()
        };

        let err = sequence_operation(temp.path(), &sequence, &options(false), Some(temp.path()))
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<BatchError>(),
            Some(BatchError::Config(ConfigError::InvalidField { field: "start", .. }))
        ));
        assert!(temp.path().join("a").exists());
        assert!(temp.path().join("b").exists());
    }

    #[test]
    fn test_list_extensions_operation() {
        let temp = TempDir::new().unwrap();
        for name in ["a.JPG", "b.jpg", "c.png", "README"] {
            fs::write(temp.path().join(name), name).unwrap();
        }

        let result = extensions_operation(Path::new("."), false, Some(temp.path())).unwrap();

        assert_eq!(result.dir, temp.path());
        assert_eq!(result.extensions, vec![".jpg", ".png"]);
    }

    #[test]
    fn test_sequence_empty_directory() {
        let temp = TempDir::new().unwrap();
        let (result, message) = sequence_operation(
            temp.path(),
            &SequenceOptions::default(),
            &options(false),
            Some(temp.path()),
        )
        .unwrap();
        assert_eq!(result.outcome(), Some(Outcome::Empty));
        assert!(message.unwrap().starts_with("No files found"));
    }

    #[test]
    fn test_ensure_single_directory() {
        let same = vec![
            Entry::new("/a/1.jpg", 1, SystemTime::UNIX_EPOCH),
            Entry::new("/a/2.jpg", 1, SystemTime::UNIX_EPOCH),
        ];
        assert!(ensure_single_directory(&same).is_ok());

        let mixed = vec![
            Entry::new("/a/1.jpg", 1, SystemTime::UNIX_EPOCH),
            Entry::new("/b/2.jpg", 1, SystemTime::UNIX_EPOCH),
        ];
        assert!(matches!(
            ensure_single_directory(&mixed),
            Err(BatchError::Config(ConfigError::MultipleDirectories(2)))
        ));
    }
}
