use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use crate::error::ValidationError;
use crate::execute::{min_temp_name_len, temp_name_budget, TEMP_MARKER};
use crate::plan::{Plan, StepStatus};

/// Windows reserved filenames that cannot be used
const WINDOWS_RESERVED: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Characters rejected by the most restrictive supported platform
const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameLimits {
    /// Longest full target path, in characters
    pub max_path_len: usize,
    /// Longest single file name, in bytes
    pub max_component_len: usize,
}

impl Default for NameLimits {
    fn default() -> Self {
        Self {
            max_path_len: 260,
            max_component_len: 255,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ViolationKind {
    Empty,
    ReservedName,
    IllegalCharacter(char),
    ControlCharacter,
    TrailingDotOrSpace,
    ComponentTooLong { len: usize, max: usize },
    PathTooLong { len: usize, max: usize },
    /// Two final targets in one directory are equal
    DuplicateTarget,
    /// Target carries the temporary-name marker used during execution
    TempMarker,
    /// The source directory leaves no room for a temporary name
    NoRoomForTempName { budget: usize, needed: usize },
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty name"),
            Self::ReservedName => write!(f, "reserved name"),
            Self::IllegalCharacter(c) => write!(f, "illegal character '{}'", c),
            Self::ControlCharacter => write!(f, "control character"),
            Self::TrailingDotOrSpace => write!(f, "ends with a dot or space"),
            Self::ComponentTooLong { len, max } => {
                write!(f, "name is {} bytes (maximum {})", len, max)
            },
            Self::PathTooLong { len, max } => {
                write!(f, "path is {} characters (maximum {})", len, max)
            },
            Self::DuplicateTarget => write!(f, "duplicate target"),
            Self::TempMarker => write!(f, "uses the reserved temporary-name marker"),
            Self::NoRoomForTempName { budget, needed } => write!(
                f,
                "directory leaves {} characters for a temporary name (need {})",
                budget, needed
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub source: PathBuf,
    pub target: String,
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}: {}",
            self.source.display(),
            self.target,
            self.kind
        )
    }
}

/// Check if a filename is a Windows reserved name.
/// Always checks regardless of platform so a plan valid here is valid everywhere.
pub fn is_windows_reserved(name: &str) -> bool {
    let base = name.split('.').next().unwrap_or(name).to_uppercase();
    WINDOWS_RESERVED.contains(&base.as_str())
}

/// Violations of a single file name, independent of where it lives
pub fn check_name(name: &str) -> Vec<ViolationKind> {
    let mut found = Vec::new();

    if name.is_empty() {
        found.push(ViolationKind::Empty);
        return found;
    }
    if name == "." || name == ".." || is_windows_reserved(name) {
        found.push(ViolationKind::ReservedName);
    }
    if let Some(c) = name.chars().find(|c| ILLEGAL_CHARS.contains(c)) {
        found.push(ViolationKind::IllegalCharacter(c));
    }
    if name.chars().any(char::is_control) {
        found.push(ViolationKind::ControlCharacter);
    }
    if name != "." && name != ".." && (name.ends_with('.') || name.ends_with(' ')) {
        found.push(ViolationKind::TrailingDotOrSpace);
    }
    if name.contains(TEMP_MARKER) {
        found.push(ViolationKind::TempMarker);
    }
    found
}

/// Reject the whole plan if any final target is illegal or duplicated.
///
/// On success every step is marked `Validated` and the plan keeps `limits`, so
/// execution sizes its temporary names to them. On failure the plan is left
/// untouched and every violation is returned, not just the first.
pub fn validate_plan(plan: &mut Plan, limits: &NameLimits) -> Result<(), ValidationError> {
    let mut violations = Vec::new();
    let mut seen: HashMap<(PathBuf, String), usize> = HashMap::new();

    for (index, step) in plan.steps.iter().enumerate() {
        let mut push = |kind| {
            violations.push(Violation {
                source: step.source.clone(),
                target: step.target.clone(),
                kind,
            });
        };

        for kind in check_name(&step.target) {
            push(kind);
        }

        if step.target.len() > limits.max_component_len {
            push(ViolationKind::ComponentTooLong {
                len: step.target.len(),
                max: limits.max_component_len,
            });
        }

        let path_len = step.target_path().to_string_lossy().chars().count();
        if path_len > limits.max_path_len {
            push(ViolationKind::PathTooLong {
                len: path_len,
                max: limits.max_path_len,
            });
        }

        let budget = temp_name_budget(step.directory(), limits);
        let needed = min_temp_name_len(&plan.id, index);
        if budget < needed {
            push(ViolationKind::NoRoomForTempName { budget, needed });
        }

        let key_name = if plan.case_insensitive {
            step.target.to_lowercase()
        } else {
            step.target.clone()
        };
        let key = (step.directory().to_path_buf(), key_name);
        if seen.insert(key, index).is_some() {
            push(ViolationKind::DuplicateTarget);
        }
    }

    if !violations.is_empty() {
        return Err(ValidationError { violations });
    }

    plan.limits = *limits;
    plan.set_status(StepStatus::Validated);
    Ok(())
}
