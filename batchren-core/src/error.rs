use std::path::PathBuf;
use thiserror::Error;

use crate::validate::Violation;

/// Invalid rule parameters, detected before any filesystem access
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("replacement search text cannot be empty")]
    EmptyOldSubstring,

    #[error("padding of {0} digits is too wide (maximum is {})", crate::rule::MAX_PADDING)]
    PaddingTooWide(usize),

    #[error("sequence naming only works within one directory, got {0} directories")]
    MultipleDirectories(usize),

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// A plan rejected by the validator; nothing was executed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("plan rejected with {} violation(s)", .violations.len())]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

/// Errors that stop a batch before execution begins.
///
/// Failures during execution are not errors: they are reported through
/// [`crate::execute::ExecutionResult`] so the caller always sees what state
/// the directory was left in.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("cannot scan {path}: {reason}")]
    Scan { path: PathBuf, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BatchError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::ViolationKind;

    #[test]
    fn test_validation_error_message_counts_violations() {
        let err = ValidationError {
            violations: vec![
                Violation {
                    source: PathBuf::from("/tmp/a.txt"),
                    target: "CON.txt".to_string(),
                    kind: ViolationKind::ReservedName,
                },
                Violation {
                    source: PathBuf::from("/tmp/b.txt"),
                    target: "a?.txt".to_string(),
                    kind: ViolationKind::IllegalCharacter('?'),
                },
            ],
        };
        assert_eq!(err.to_string(), "plan rejected with 2 violation(s)");
    }

    #[test]
    fn test_config_error_converts_into_batch_error() {
        let err: BatchError = ConfigError::EmptyOldSubstring.into();
        assert!(matches!(err, BatchError::Config(_)));
        assert!(err.to_string().contains("cannot be empty"));
    }
}
