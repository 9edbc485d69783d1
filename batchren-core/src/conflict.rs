use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::entry::split_name;
use crate::plan::{Plan, StepStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// Another step in the batch claimed the same target first
    Internal,
    /// A file that is not part of the batch already holds the target name
    External,
}

/// How file names are compared when looking for collisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CasePolicy {
    /// Test the target directory with [`detect_case_insensitive_fs`]
    #[default]
    Auto,
    Sensitive,
    Insensitive,
}

impl CasePolicy {
    pub fn is_case_insensitive(self, dir: &Path) -> bool {
        match self {
            Self::Auto => detect_case_insensitive_fs(dir),
            Self::Sensitive => false,
            Self::Insensitive => true,
        }
    }
}

impl std::str::FromStr for CasePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "sensitive" => Ok(Self::Sensitive),
            "insensitive" => Ok(Self::Insensitive),
            other => Err(format!("unknown case policy: {}", other)),
        }
    }
}

/// Check if the filesystem at `path` is case-insensitive.
///
/// Writes a `.batchren-case-*` scratch directory into `path` and removes it
/// before returning, so the directory is touched even by a dry run. Only
/// `CasePolicy::Auto` calls this. A directory that cannot be written to is
/// treated as case-sensitive.
pub fn detect_case_insensitive_fs(path: &Path) -> bool {
    let Ok(scratch) = tempfile::Builder::new()
        .prefix(".batchren-case-")
        .tempdir_in(path)
    else {
        return false;
    };

    if fs::write(scratch.path().join("case_check_a"), b"").is_err() {
        return false;
    }
    scratch.path().join("case_check_A").symlink_metadata().is_ok()
}

/// Names currently present on disk, per directory
#[derive(Debug, Clone, Default)]
pub struct ExistingNames {
    dirs: HashMap<PathBuf, HashSet<String>>,
}

impl ExistingNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<I, S>(&mut self, dir: impl Into<PathBuf>, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dirs
            .entry(dir.into())
            .or_default()
            .extend(names.into_iter().map(Into::into));
    }

    pub fn names_in(&self, dir: &Path) -> impl Iterator<Item = &String> {
        self.dirs.get(dir).into_iter().flatten()
    }
}

fn normalize(name: &str, case_insensitive: bool) -> String {
    if case_insensitive {
        name.to_lowercase()
    } else {
        name.to_string()
    }
}

/// `stem_n.ext`
fn with_suffix(name: &str, n: u32) -> String {
    let (stem, ext) = split_name(name);
    format!("{}_{}{}", stem, n, ext)
}

/// Disambiguate every colliding target in batch order.
///
/// The first step to ask for a name keeps it. Later claimants, and any step
/// whose target is held on disk by a file outside the batch, get the lowest
/// `_n` suffix not taken by a non-participant file, a resolved target or
/// another step's requested name. Files that are themselves being renamed
/// away do not block their names; two-phase execution frees them.
pub fn resolve(mut plan: Plan, existing: &ExistingNames, case_insensitive: bool) -> Plan {
    let norm = |name: &str| normalize(name, case_insensitive);

    let mut blocked: HashMap<PathBuf, HashSet<String>> = HashMap::new();
    let mut requested: HashMap<PathBuf, HashMap<String, usize>> = HashMap::new();
    for step in &plan.steps {
        let dir = step.directory().to_path_buf();
        *requested
            .entry(dir.clone())
            .or_default()
            .entry(norm(&step.candidate))
            .or_default() += 1;
        blocked
            .entry(dir)
            .or_insert_with(|| existing.names_in(step.directory()).map(|n| norm(n)).collect());
    }
    for step in &plan.steps {
        if let Some(names) = blocked.get_mut(step.directory()) {
            names.remove(&norm(&step.source_name()));
        }
    }

    let mut claimed: HashMap<PathBuf, HashSet<String>> = HashMap::new();

    for step in &mut plan.steps {
        let dir = step.directory().to_path_buf();
        let dir_blocked = blocked.get(&dir).cloned().unwrap_or_default();
        let dir_requested = requested.get(&dir).cloned().unwrap_or_default();
        let dir_claimed = claimed.entry(dir).or_default();

        let wanted = norm(&step.candidate);
        let kind = if dir_blocked.contains(&wanted) {
            Some(ConflictKind::External)
        } else if dir_claimed.contains(&wanted) {
            Some(ConflictKind::Internal)
        } else {
            None
        };

        if let Some(kind) = kind {
            let mut n = 1;
            loop {
                let name = with_suffix(&step.candidate, n);
                let key = norm(&name);
                if !dir_blocked.contains(&key)
                    && !dir_claimed.contains(&key)
                    && !dir_requested.contains_key(&key)
                {
                    step.target = name;
                    step.conflict_suffix = n;
                    step.conflict = Some(kind);
                    break;
                }
                n += 1;
            }
        }

        dir_claimed.insert(norm(&step.target));
        step.status = StepStatus::Resolved;
    }

    plan.case_insensitive = case_insensitive;
    plan
}
