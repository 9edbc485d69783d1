use anyhow::{Context, Result};
use std::path::Path;

use super::batch::{current_dir_or, resolve_root};
use crate::audit::FileAuditLog;
use crate::config::STATE_DIR;
use crate::execute::{recover_directory_with, StdFs};
use crate::output::RecoverResult;
use crate::plan::{plan_file, read_plan};

/// Move files stranded at temporary names in `dir` back to their original names.
///
/// Every rename is appended to `.batchren/logs/recover.log`. Temporaries
/// whose name was shortened are matched against the plans saved under
/// `.batchren/plans`.
pub fn recover_operation(dir: &Path, working_dir: Option<&Path>) -> Result<RecoverResult> {
    let current_dir = current_dir_or(working_dir)?;
    let dir = resolve_root(dir, &current_dir);

    let mut audit = FileAuditLog::for_plan(&current_dir, "recover")
        .context("Failed to open recovery log")?;
    let state_dir = current_dir.join(STATE_DIR);
    let lookup = |plan_id: &str, index: usize| {
        let plan = read_plan(&plan_file(&state_dir, plan_id)).ok()?;
        let step = plan.steps.get(index)?;
        Some(step.source.file_name()?.to_string_lossy().into_owned())
    };
    let report = recover_directory_with(&dir, &mut StdFs, &mut audit, lookup)
        .with_context(|| format!("Failed to recover files in {}", dir.display()))?;

    if let Some(e) = audit.take_error() {
        eprintln!(
            "Warning: Failed to write recovery log {}: {}",
            audit.path().display(),
            e
        );
    }

    Ok(RecoverResult { dir, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execute::{bounded_temp_name, temp_name};
    use crate::entry::Entry;
    use crate::plan::{build_plan, write_plan};
    use crate::rule::{NamingRule, ReplaceRule};
    use std::path::PathBuf;
    use std::time::SystemTime;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_recover_operation_restores_stranded_file() {
        let temp = TempDir::new().unwrap();
        let stranded = temp_name("0123456789abcdef", 0, 0, "photo.png");
        fs::write(temp.path().join(&stranded), "data").unwrap();

        let result = recover_operation(Path::new("."), Some(temp.path())).unwrap();

        assert_eq!(result.report.restored.len(), 1);
        assert!(result.report.skipped.is_empty());
        assert_eq!(fs::read_to_string(temp.path().join("photo.png")).unwrap(), "data");
        assert!(temp.path().join(".batchren/logs/recover.log").exists());
    }

    #[test]
    fn test_recover_operation_reads_saved_plan_for_shortened_name() {
        let temp = TempDir::new().unwrap();
        let source = Entry::new(temp.path().join("x".repeat(240)), 4, SystemTime::now());
        let rule = NamingRule::Replace(ReplaceRule::new("", true, "x", "y").unwrap());
        let plan = build_plan(&[source], &rule, "path");
        write_plan(&plan, &plan_file(&temp.path().join(STATE_DIR), &plan.id)).unwrap();
        let stranded = bounded_temp_name(&plan.id, 0, 0, &"x".repeat(240), 64);
        fs::write(temp.path().join(&stranded), "data").unwrap();

        let result = recover_operation(Path::new("."), Some(temp.path())).unwrap();

        assert_eq!(result.report.restored.len(), 1);
        assert_eq!(
            fs::read_to_string(temp.path().join("x".repeat(240))).unwrap(),
            "data"
        );
    }

    #[test]
    fn test_recover_operation_without_saved_plan_skips_shortened_name() {
        let temp = TempDir::new().unwrap();
        let stranded = bounded_temp_name("feedbeef", 2, 0, &"z".repeat(240), 64);
        fs::write(temp.path().join(&stranded), "data").unwrap();

        let result = recover_operation(Path::new("."), Some(temp.path())).unwrap();

        assert!(result.report.restored.is_empty());
        assert_eq!(result.report.skipped.len(), 1);
        assert_eq!(result.report.skipped[0].original, None::<PathBuf>);
    }
}
