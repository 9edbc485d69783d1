use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::audit::AuditSink;
use crate::error::BatchError;
use crate::plan::{Plan, RenameStep, StepStatus};
use crate::validate::NameLimits;

/// Prefix of every temporary name used between the two phases
pub const TEMP_MARKER: &str = ".__batchren_tmp__";

/// Separates counter and original in a temporary name whose original was cut
const SHORTENED_SEPARATOR: &str = "_~";

/// Filesystem operations the executor needs
pub trait RenameFs {
    fn rename(&mut self, from: &Path, to: &Path) -> io::Result<()>;
    fn exists(&self, path: &Path) -> bool;
    fn list_names(&self, dir: &Path) -> io::Result<Vec<String>>;
}

/// The real filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFs;

impl RenameFs for StdFs {
    fn rename(&mut self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn exists(&self, path: &Path) -> bool {
        path.symlink_metadata().is_ok()
    }

    fn list_names(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    NotStarted,
    Phase1,
    Phase2,
    RollingBack,
    Done,
    Failed,
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotStarted => "not started",
            Self::Phase1 => "phase 1",
            Self::Phase2 => "phase 2",
            Self::RollingBack => "rolling back",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Every step committed
    Applied,
    /// Nothing was touched; every step would have committed
    DryRun,
    /// Phase 1 failed and every file is back under its original name
    RolledBack,
    /// Some files are stranded at temporary names; needs operator attention
    Partial,
    /// The plan had no steps
    Empty,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Applied | Self::DryRun | Self::Empty)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Applied => "applied",
            Self::DryRun => "dry run",
            Self::RolledBack => "rolled back",
            Self::Partial => "partially applied",
            Self::Empty => "nothing to do",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenamePhase {
    /// Source to temporary name
    Stage,
    /// Temporary name to final target
    Commit,
    /// Temporary name back to source
    Rollback,
}

impl fmt::Display for RenamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Stage => "stage",
            Self::Commit => "commit",
            Self::Rollback => "rollback",
        };
        f.write_str(s)
    }
}

/// One physical rename attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameCall {
    pub phase: RenamePhase,
    pub from: PathBuf,
    pub to: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RenameCall {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub source: PathBuf,
    pub candidate: String,
    pub target: PathBuf,
    pub temp: PathBuf,
    pub conflict_suffix: u32,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub plan_id: String,
    pub timestamp: String,
    pub dry_run: bool,
    pub success: bool,
    pub outcome: Outcome,
    /// Every batch state entered, in order
    pub states: Vec<BatchState>,
    pub steps: Vec<StepRecord>,
    pub auto_suffixed: Vec<StepRecord>,
    /// Steps whose file is still at its temporary name
    pub stranded: Vec<StepRecord>,
    pub renames: Vec<RenameCall>,
    pub rollback_errors: Vec<String>,
}

impl ExecutionResult {
    pub fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }

    pub fn final_state(&self) -> BatchState {
        self.states.last().copied().unwrap_or(BatchState::NotStarted)
    }
}

fn temp_prefix(plan_id: &str, index: usize, generation: u32) -> String {
    if generation == 0 {
        format!("{}{}_{}", TEMP_MARKER, plan_id, index)
    } else {
        format!("{}{}_{}g{}", TEMP_MARKER, plan_id, index, generation)
    }
}

/// `.__batchren_tmp__<plan-id>_<index>[g<generation>]__<original>`
pub fn temp_name(plan_id: &str, index: usize, generation: u32, original: &str) -> String {
    format!("{}__{}", temp_prefix(plan_id, index, generation), original)
}

/// Like [`temp_name`], but never longer than `budget` bytes.
///
/// When the full form does not fit, the original is cut at a character
/// boundary and `_~` replaces `__`. Such a name no longer carries the original,
/// so [`recover_directory`] cannot restore it.
pub fn bounded_temp_name(
    plan_id: &str,
    index: usize,
    generation: u32,
    original: &str,
    budget: usize,
) -> String {
    let full = temp_name(plan_id, index, generation, original);
    if full.len() <= budget {
        return full;
    }

    let mut name = temp_prefix(plan_id, index, generation);
    name.push_str(SHORTENED_SEPARATOR);
    let mut cut = budget.saturating_sub(name.len()).min(original.len());
    while !original.is_char_boundary(cut) {
        cut -= 1;
    }
    name.push_str(&original[..cut]);
    name
}

/// Shortest temporary name step `index` can get: counter, separator and one byte
pub fn min_temp_name_len(plan_id: &str, index: usize) -> usize {
    temp_prefix(plan_id, index, 0).len() + SHORTENED_SEPARATOR.len() + 1
}

/// Longest temporary name that fits in `dir` under `limits`
pub fn temp_name_budget(dir: &Path, limits: &NameLimits) -> usize {
    let dir_len = dir.to_string_lossy().chars().count();
    limits
        .max_component_len
        .min(limits.max_path_len.saturating_sub(dir_len + 1))
}

pub fn is_temp_name(name: &str) -> bool {
    name.starts_with(TEMP_MARKER)
}

/// Plan id, step index and whatever follows the counter
fn split_temp_name(name: &str) -> Option<(&str, usize, &str)> {
    let rest = name.strip_prefix(TEMP_MARKER)?;
    let (plan_id, rest) = rest.split_once('_')?;
    let counter_end = rest.find(|c: char| !(c.is_ascii_digit() || c == 'g'))?;
    let index = rest[..counter_end].split('g').next()?.parse().ok()?;
    Some((plan_id, index, &rest[counter_end..]))
}

/// Original file name encoded in a temporary name; `None` when it was shortened
pub fn parse_temp_name(name: &str) -> Option<&str> {
    let (_, _, rest) = split_temp_name(name)?;
    let original = rest.strip_prefix("__")?;
    (!original.is_empty()).then_some(original)
}

/// Plan id and step index of a temporary name, shortened or not
pub fn temp_name_step(name: &str) -> Option<(&str, usize)> {
    split_temp_name(name).map(|(plan_id, index, _)| (plan_id, index))
}

/// Plan id and index make temporaries unique among themselves. A name that
/// is somehow already on disk bumps the generation until it is free.
fn allocate_temps(plan: &Plan, fs: &dyn RenameFs) -> Vec<PathBuf> {
    plan.steps
        .iter()
        .enumerate()
        .map(|(index, step)| {
            let original = step.source_name();
            let budget = temp_name_budget(step.directory(), &plan.limits);
            let mut generation = 0;
            loop {
                let path = step.directory().join(bounded_temp_name(
                    &plan.id,
                    index,
                    generation,
                    &original,
                    budget,
                ));
                if !fs.exists(&path) {
                    break path;
                }
                generation += 1;
            }
        })
        .collect()
}

/// State trace, rename log and audit forwarding for one run
struct Journal<'a> {
    audit: &'a mut dyn AuditSink,
    states: Vec<BatchState>,
    calls: Vec<RenameCall>,
}

impl<'a> Journal<'a> {
    fn new(audit: &'a mut dyn AuditSink) -> Self {
        Self {
            audit,
            states: Vec::new(),
            calls: Vec::new(),
        }
    }

    fn enter(&mut self, state: BatchState) {
        self.audit.record(&format!("batch state: {}", state));
        self.states.push(state);
    }

    /// Never overwrites: an occupied destination is a failure
    fn rename(
        &mut self,
        fs: &mut dyn RenameFs,
        phase: RenamePhase,
        from: &Path,
        to: &Path,
    ) -> Result<(), String> {
        let result = if fs.exists(to) {
            Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "destination already exists",
            ))
        } else {
            fs.rename(from, to)
        };
        let error = result.err().map(|e| e.to_string());

        self.audit.record(&format!(
            "{} {} -> {}: {}",
            phase,
            from.display(),
            to.display(),
            error.as_deref().unwrap_or("ok")
        ));
        self.calls.push(RenameCall {
            phase,
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            error: error.clone(),
        });

        error.map_or(Ok(()), Err)
    }
}

/// Per-step bookkeeping shared by every exit path
struct Progress {
    temps: Vec<PathBuf>,
    errors: Vec<Option<String>>,
    /// File currently sits at its temporary name
    in_limbo: Vec<bool>,
    rollback_errors: Vec<String>,
}

fn record(step: &RenameStep, temp: &Path, error: Option<&String>) -> StepRecord {
    StepRecord {
        source: step.source.clone(),
        candidate: step.candidate.clone(),
        target: step.target_path(),
        temp: temp.to_path_buf(),
        conflict_suffix: step.conflict_suffix,
        status: step.status,
        error: error.cloned(),
    }
}

fn finish(
    plan: &Plan,
    dry_run: bool,
    timestamp: String,
    outcome: Outcome,
    journal: Journal<'_>,
    progress: Progress,
) -> ExecutionResult {
    let mut steps = Vec::with_capacity(plan.steps.len());
    let mut stranded = Vec::new();
    for (index, step) in plan.steps.iter().enumerate() {
        let mut rec = record(step, &progress.temps[index], progress.errors[index].as_ref());
        if dry_run {
            rec.status = StepStatus::Committed;
        }
        if progress.in_limbo[index] {
            stranded.push(rec.clone());
        }
        steps.push(rec);
    }
    let auto_suffixed = steps
        .iter()
        .filter(|s| s.conflict_suffix > 0)
        .cloned()
        .collect();

    journal
        .audit
        .record(&format!("plan {} finished: {}", plan.id, outcome));

    ExecutionResult {
        plan_id: plan.id.clone(),
        timestamp,
        dry_run,
        success: outcome.is_success(),
        outcome,
        states: journal.states,
        steps,
        auto_suffixed,
        stranded,
        renames: journal.calls,
        rollback_errors: progress.rollback_errors,
    }
}

/// Carry out a validated plan.
///
/// Phase 1 moves every source to a unique temporary name; Phase 2 moves each
/// temporary to its final target. A Phase-1 failure rolls every staged file
/// back in reverse order. A Phase-2 failure stops the batch: committed steps
/// stay committed and the rest are reported as stranded. Failures are data in
/// the returned result, never errors.
pub fn execute_plan(
    plan: &mut Plan,
    dry_run: bool,
    fs: &mut dyn RenameFs,
    audit: &mut dyn AuditSink,
) -> ExecutionResult {
    let timestamp = chrono::Local::now().to_rfc3339();
    let mut journal = Journal::new(audit);
    journal.enter(BatchState::NotStarted);
    journal.audit.record(&format!(
        "plan {}: {} step(s), {}",
        plan.id,
        plan.steps.len(),
        if dry_run { "dry run" } else { "live" }
    ));

    let count = plan.steps.len();
    let mut progress = Progress {
        temps: allocate_temps(plan, fs),
        errors: vec![None; count],
        in_limbo: vec![false; count],
        rollback_errors: Vec::new(),
    };

    if plan.is_empty() || dry_run {
        journal.enter(BatchState::Done);
        let outcome = if plan.is_empty() {
            Outcome::Empty
        } else {
            Outcome::DryRun
        };
        return finish(plan, dry_run, timestamp, outcome, journal, progress);
    }

    journal.enter(BatchState::Phase1);
    let mut failed_at = None;
    for (index, step) in plan.steps.iter().enumerate() {
        match journal.rename(fs, RenamePhase::Stage, &step.source, &progress.temps[index]) {
            Ok(()) => progress.in_limbo[index] = true,
            Err(e) => {
                progress.errors[index] = Some(e);
                failed_at = Some(index);
                break;
            },
        }
    }

    if let Some(failed) = failed_at {
        journal.enter(BatchState::RollingBack);
        plan.steps[failed].status = StepStatus::Failed;
        for step in &mut plan.steps[failed + 1..] {
            step.status = StepStatus::RolledBack;
        }
        for index in (0..failed).rev() {
            let step = &mut plan.steps[index];
            match journal.rename(fs, RenamePhase::Rollback, &progress.temps[index], &step.source) {
                Ok(()) => {
                    progress.in_limbo[index] = false;
                    step.status = StepStatus::RolledBack;
                },
                Err(e) => {
                    progress.rollback_errors.push(format!(
                        "Failed to revert rename {} -> {}: {}",
                        progress.temps[index].display(),
                        step.source.display(),
                        e
                    ));
                    progress.errors[index] = Some(e);
                    step.status = StepStatus::Stranded;
                },
            }
        }
        journal.enter(BatchState::Failed);
        let outcome = if progress.rollback_errors.is_empty() {
            Outcome::RolledBack
        } else {
            Outcome::Partial
        };
        return finish(plan, false, timestamp, outcome, journal, progress);
    }

    journal.enter(BatchState::Phase2);
    for index in 0..count {
        let target = plan.steps[index].target_path();
        match journal.rename(fs, RenamePhase::Commit, &progress.temps[index], &target) {
            Ok(()) => {
                progress.in_limbo[index] = false;
                plan.steps[index].status = StepStatus::Committed;
            },
            Err(e) => {
                progress.errors[index] = Some(e);
                plan.steps[index].status = StepStatus::Failed;
                for step in &mut plan.steps[index + 1..] {
                    step.status = StepStatus::Stranded;
                }
                journal.enter(BatchState::Failed);
                return finish(plan, false, timestamp, Outcome::Partial, journal, progress);
            },
        }
    }

    journal.enter(BatchState::Done);
    finish(plan, false, timestamp, Outcome::Applied, journal, progress)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveredFile {
    pub temp: PathBuf,
    pub original: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub temp: PathBuf,
    /// `None` when the temporary name no longer carries the original
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<PathBuf>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoverReport {
    pub restored: Vec<RecoveredFile>,
    pub skipped: Vec<SkippedFile>,
}

/// Move files left at temporary names back to their original names.
/// Originals that are occupied again, and temporaries whose original was
/// shortened, are reported and left alone.
pub fn recover_directory(
    dir: &Path,
    fs: &mut dyn RenameFs,
    audit: &mut dyn AuditSink,
) -> Result<RecoverReport, BatchError> {
    recover_directory_with(dir, fs, audit, |_, _| None)
}

/// Like [`recover_directory`], asking `lookup(plan_id, index)` for the
/// original name of a temporary whose name was shortened.
pub fn recover_directory_with<F>(
    dir: &Path,
    fs: &mut dyn RenameFs,
    audit: &mut dyn AuditSink,
    lookup: F,
) -> Result<RecoverReport, BatchError>
where
    F: Fn(&str, usize) -> Option<String>,
{
    let mut names = fs.list_names(dir).map_err(|e| BatchError::io(dir, e))?;
    names.sort();

    let mut report = RecoverReport::default();
    for name in names.iter().filter(|n| is_temp_name(n)) {
        let temp = dir.join(name);
        let original = match parse_temp_name(name) {
            Some(original) => Some(original.to_string()),
            None => temp_name_step(name).and_then(|(plan_id, index)| lookup(plan_id, index)),
        };
        let Some(original) = original else {
            audit.record(&format!("recover {}: original name unknown", temp.display()));
            report.skipped.push(SkippedFile {
                temp,
                original: None,
                reason: "original name was shortened and no saved plan names it".to_string(),
            });
            continue;
        };
        let original = dir.join(original);

        let reason = if fs.exists(&original) {
            Some("original name is occupied".to_string())
        } else {
            fs.rename(&temp, &original).err().map(|e| e.to_string())
        };
        audit.record(&format!(
            "recover {} -> {}: {}",
            temp.display(),
            original.display(),
            reason.as_deref().unwrap_or("ok")
        ));

        match reason {
            None => report.restored.push(RecoveredFile { temp, original }),
            Some(reason) => report.skipped.push(SkippedFile {
                temp,
                original: Some(original),
                reason,
            }),
        }
    }
    Ok(report)
}
