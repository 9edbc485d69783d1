use anyhow::{Context, Result};
use std::path::Path;

use super::batch::{current_dir_or, resolve_root, run_batch, BatchOptions};
use crate::entry::sort_by_path;
use crate::error::BatchError;
use crate::output::BatchResult;
use crate::rule::{NamingRule, ReplaceRule};
use crate::scanner::{scan_recursive, ScanOptions};

/// Substring replacement over every matching file under `dir`.
///
/// Batch order is path order, so when two files want the same name the one
/// with the lower path keeps it.
#[allow(clippy::too_many_arguments)]
pub fn replace_operation(
    dir: &Path,
    keyword: &str,
    case_sensitive: bool,
    old: &str,
    new: &str,
    scan: &ScanOptions,
    options: &BatchOptions,
    working_dir: Option<&Path>,
) -> Result<(BatchResult, Option<String>)> {
    let current_dir = current_dir_or(working_dir)?;
    let root = resolve_root(dir, &current_dir);

    let rule = ReplaceRule::new(keyword, case_sensitive, old, new)
        .map_err(BatchError::from)?
        .matching_path(scan.match_path);

    let scan = ScanOptions {
        keyword: keyword.to_string(),
        case_sensitive,
        ..scan.clone()
    };
    let entries = scan_recursive(&root, &scan)
        .with_context(|| format!("Failed to scan {} for '{}'", root.display(), keyword))?;
    let entries = sort_by_path(entries);

    let (result, preview) = run_batch(
        &entries,
        &NamingRule::Replace(rule),
        "path",
        &root,
        options,
        &current_dir,
    )?;

    if result.plan.steps.is_empty() && entries.is_empty() {
        let message = if keyword.is_empty() {
            format!("No files found in {}", root.display())
        } else {
            format!("No files matching '{}' found", keyword)
        };
        return Ok((result, Some(message)));
    }

    Ok((result, preview))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::CasePolicy;
    use crate::execute::Outcome;
    use crate::preview::Preview;
    use std::fs;
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
    fn test_replace_suffixes_around_existing_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("sakura_01.realcugan.png"), "upscaled").unwrap();
        fs::write(temp.path().join("sakura_01.png"), "original").unwrap();

        let (result, _) = replace_operation(
            Path::new("."),
            "realcugan",
            false,
            ".realcugan",
            "",
            &ScanOptions::default(),
            &options(false),
            Some(temp.path()),
        )
        .unwrap();

        let execution = result.execution.unwrap();
        assert_eq!(execution.outcome, Outcome::Applied);
        assert_eq!(execution.auto_suffixed.len(), 1);
        assert_eq!(
            fs::read_to_string(temp.path().join("sakura_01_1.png")).unwrap(),
            "upscaled"
        );
        assert_eq!(
            fs::read_to_string(temp.path().join("sakura_01.png")).unwrap(),
            "original"
        );
        assert!(result.log_file.unwrap().exists());
        assert!(result.plan_file.unwrap().exists());
        assert!(temp.path().join(".batchren/history.json").exists());
    }

    #[test]
    fn test_replace_dry_run_leaves_files_alone() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.realcugan.png"), "a").unwrap();

        let (result, _) = replace_operation(
            temp.path(),
            "realcugan",
            false,
            ".realcugan",
            "",
            &ScanOptions::default(),
            &options(true),
            Some(temp.path()),
        )
        .unwrap();

        assert_eq!(result.outcome(), Some(Outcome::DryRun));
        assert!(temp.path().join("a.realcugan.png").exists());
        assert!(!temp.path().join("a.png").exists());
        assert!(!temp.path().join(".batchren").exists());
    }

    #[test]
    fn test_replace_reports_no_matches() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("plain.png"), "a").unwrap();

        let (result, message) = replace_operation(
            temp.path(),
            "realcugan",
            false,
            ".realcugan",
            "",
            &ScanOptions::default(),
            &options(false),
            Some(temp.path()),
        )
        .unwrap();

        assert_eq!(result.outcome(), Some(Outcome::Empty));
        assert!(message.unwrap().contains("No files matching 'realcugan'"));
    }

    #[test]
    #[serial]
    fn test_replace_keyword_in_directory_path() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("photos")).unwrap();
        fs::create_dir(temp.path().join("other")).unwrap();
        fs::write(temp.path().join("photos/IMG_1.png"), "1").unwrap();
        fs::write(temp.path().join("other/IMG_2.png"), "2").unwrap();
        let scan = ScanOptions {
            match_path: true,
            ..ScanOptions::default()
        };

        let (result, _) = replace_operation(
            temp.path(),
            "photos",
            false,
            "IMG",
            "img",
            &scan,
            &options(false),
            Some(temp.path()),
        )
        .unwrap();

        assert_eq!(result.outcome(), Some(Outcome::Applied));
        assert_eq!(result.plan.steps.len(), 1);
        assert_eq!(
            fs::read_to_string(temp.path().join("photos/img_1.png")).unwrap(),
            "1"
        );
        assert!(temp.path().join("other/IMG_2.png").exists());
    }

    #[test]
    fn test_replace_rejects_empty_old() {
        let temp = TempDir::new().unwrap();
        let err = replace_operation(
            temp.path(),
            "",
            false,
            "",
            "x",
            &ScanOptions::default(),
            &options(true),
            Some(temp.path()),
        )
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<BatchError>(),
            Some(BatchError::Config(_))
        ));
    }

    #[test]
    fn test_replace_rejects_illegal_target() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a-b.txt"), "a").unwrap();

        let err = replace_operation(
            temp.path(),
            "",
            false,
            "-",
            ":",
            &ScanOptions::default(),
            &options(false),
            Some(temp.path()),
        )
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<BatchError>(),
            Some(BatchError::Validation(_))
        ));
        assert!(temp.path().join("a-b.txt").exists());
    }
}
