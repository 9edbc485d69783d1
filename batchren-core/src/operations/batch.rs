use anyhow::{anyhow, Context, Result};
use std::io::{self, IsTerminal, Write as IoWrite};
use std::path::{Path, PathBuf};

use crate::audit::{AuditSink, FileAuditLog, NullAudit};
use crate::config::STATE_DIR;
use crate::conflict::{resolve, CasePolicy};
use crate::entry::Entry;
use crate::error::BatchError;
use crate::execute::{execute_plan, StdFs};
use crate::history::{create_history_entry, History};
use crate::interrupt::{interrupt_requested, BatchGuard, ConfirmationPromptGuard};
use crate::output::BatchResult;
use crate::plan::{build_plan, plan_file, write_plan, Plan};
use crate::preview::{render_plan, Preview};
use crate::rule::NamingRule;
use crate::scanner::existing_names_for;
use crate::validate::{validate_plan, NameLimits};

/// Settings shared by every renaming operation
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub dry_run: bool,
    pub auto_approve: bool,
    pub preview: Preview,
    pub use_color: Option<bool>,
    pub case_policy: CasePolicy,
    pub limits: NameLimits,
    pub record_history: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            auto_approve: false,
            preview: Preview::Table,
            use_color: None,
            case_policy: CasePolicy::Auto,
            limits: NameLimits::default(),
            record_history: true,
        }
    }
}

/// Plan, resolve, validate, preview and (unless dry-run or declined) execute
/// one batch.
///
/// The returned preview is `None` when it was already printed ahead of the
/// confirmation prompt.
pub(crate) fn run_batch(
    entries: &[Entry],
    rule: &NamingRule,
    ordering: &str,
    root: &Path,
    options: &BatchOptions,
    working_dir: &Path,
) -> Result<(BatchResult, Option<String>)> {
    let existing = existing_names_for(entries)?;
    let case_insensitive = options.case_policy.is_case_insensitive(root);

    let plan = build_plan(entries, rule, ordering);
    let mut plan = resolve(plan, &existing, case_insensitive);
    validate_plan(&mut plan, &options.limits).map_err(BatchError::from)?;

    let mut preview_output = match options.preview {
        Preview::None => None,
        format => Some(render_plan(&plan, format, options.use_color)),
    };

    // Nothing to rename, or preview only: the executor never touches the disk
    if plan.is_empty() || options.dry_run {
        let execution = execute_plan(&mut plan, options.dry_run, &mut StdFs, &mut NullAudit);
        return Ok((
            BatchResult {
                plan,
                execution: Some(execution),
                aborted: false,
                log_file: None,
                plan_file: None,
            },
            preview_output,
        ));
    }

    validate_operation_safety(options.auto_approve)?;

    if !options.auto_approve {
        if let Some(preview) = preview_output.take() {
            println!("{}", preview);
        }
        if !get_user_confirmation()? {
            return Ok((aborted(plan), Some("Aborted.".to_string())));
        }
    }

    // Signals from here on wait for the batch; one that came earlier stops it
    let guard = BatchGuard::activate();
    if interrupt_requested() {
        return Ok((aborted(plan), Some("Interrupted before execution.".to_string())));
    }

    let state_dir = working_dir.join(STATE_DIR);
    let saved_plan = plan_file(&state_dir, &plan.id);
    write_plan(&plan, &saved_plan)
        .with_context(|| format!("Failed to save plan {}", saved_plan.display()))?;
    let mut audit = FileAuditLog::for_plan(working_dir, &plan.id)
        .with_context(|| format!("Failed to open audit log in {}", state_dir.display()))?;
    audit.record(&format!("plan saved to {}", saved_plan.display()));

    eprintln!("Renaming {} file(s)...", plan.steps.len());
    let execution = execute_plan(&mut plan, false, &mut StdFs, &mut audit);
    drop(guard);

    if let Some(e) = audit.take_error() {
        eprintln!(
            "Warning: Failed to write audit log {}: {}",
            audit.path().display(),
            e
        );
    }
    let log_file = Some(audit.path().to_path_buf());

    if options.record_history {
        record_history(&state_dir, &plan, root, &execution)?;
    }

    Ok((
        BatchResult {
            plan,
            execution: Some(execution),
            aborted: false,
            log_file,
            plan_file: Some(saved_plan),
        },
        preview_output,
    ))
}

fn aborted(plan: Plan) -> BatchResult {
    BatchResult {
        plan,
        execution: None,
        aborted: true,
        log_file: None,
        plan_file: None,
    }
}

fn record_history(
    state_dir: &Path,
    plan: &Plan,
    root: &Path,
    execution: &crate::execute::ExecutionResult,
) -> Result<()> {
    let mut history = History::load(state_dir)?;
    history
        .add_entry(create_history_entry(plan, root, execution))
        .context("Failed to record batch in history")
}

fn validate_operation_safety(auto_approve: bool) -> Result<()> {
    // Non-TTY without auto-approve cannot be confirmed
    if !auto_approve && !io::stdin().is_terminal() {
        return Err(anyhow!(
            "Cannot prompt for confirmation in non-interactive mode. Use --yes to apply."
        ));
    }
    Ok(())
}

fn get_user_confirmation() -> Result<bool> {
    let _prompt = ConfirmationPromptGuard::activate();
    print!("Apply? [y/N]: ");
    IoWrite::flush(&mut io::stdout()).context("Failed to flush stdout")?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("Failed to read user input")?;
    let input = input.trim().to_lowercase();

    Ok(input == "y" || input == "yes")
}

/// Resolve a user-supplied directory against the working directory
pub(crate) fn resolve_root(dir: &Path, working_dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        working_dir.join(dir)
    }
}

pub(crate) fn current_dir_or(working_dir: Option<&Path>) -> Result<PathBuf> {
    match working_dir {
        Some(dir) => Ok(dir.to_path_buf()),
        None => std::env::current_dir().context("Failed to get current directory"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interrupt::{batch_active, clear_interrupt, request_interrupt};
    use crate::rule::ReplaceRule;
    use crate::scanner::scan_directory;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_interrupt_before_execution_stops_the_batch() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.old.txt"), "a").unwrap();
        let entries = scan_directory(temp.path(), None, false).unwrap();
        let rule = NamingRule::Replace(ReplaceRule::new("", true, ".old", "").unwrap());
        let options = BatchOptions {
            auto_approve: true,
            preview: Preview::None,
            case_policy: CasePolicy::Sensitive,
            ..BatchOptions::default()
        };

        assert!(!request_interrupt());
        let outcome = run_batch(&entries, &rule, "path", temp.path(), &options, temp.path());
        clear_interrupt();

        let (result, message) = outcome.unwrap();
        assert!(result.aborted);
        assert!(result.execution.is_none());
        assert_eq!(message.as_deref(), Some("Interrupted before execution."));
        assert!(!batch_active());
        assert!(temp.path().join("a.old.txt").exists());
        assert!(!temp.path().join(".batchren").exists());
    }

    #[test]
    #[serial]
    fn test_live_run_saves_plan_before_renaming() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.old.txt"), "a").unwrap();
        let entries = scan_directory(temp.path(), None, false).unwrap();
        let rule = NamingRule::Replace(ReplaceRule::new("", true, ".old", "").unwrap());
        let options = BatchOptions {
            auto_approve: true,
            preview: Preview::None,
            case_policy: CasePolicy::Sensitive,
            record_history: false,
            ..BatchOptions::default()
        };

        let (result, _) =
            run_batch(&entries, &rule, "path", temp.path(), &options, temp.path()).unwrap();

        let saved = result.plan_file.unwrap();
        assert_eq!(saved, plan_file(&temp.path().join(STATE_DIR), &result.plan.id));
        let loaded = crate::plan::read_plan(&saved).unwrap();
        assert_eq!(loaded.steps[0].target, "a.txt");
        assert_eq!(loaded.steps[0].status, crate::plan::StepStatus::Validated);
        assert!(temp.path().join("a.txt").exists());
    }
}
