#![allow(unused)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod audit;
pub mod config;
pub mod conflict;
pub mod entry;
pub mod error;
pub mod execute;
pub mod history;
pub mod interrupt;
pub mod operations;
pub mod output;
pub mod plan;
pub mod preview;
pub mod rule;
pub mod scanner;
pub mod validate;

pub use audit::{AuditSink, FileAuditLog, MemoryAudit, NullAudit};
pub use config::{Config, DefaultsConfig, STATE_DIR};
pub use conflict::{detect_case_insensitive_fs, resolve, CasePolicy, ConflictKind, ExistingNames};
pub use entry::{sort_by_path, sort_entries, split_name, Entry, SortKey};
pub use error::{BatchError, ConfigError, ValidationError};
pub use execute::{
    bounded_temp_name, execute_plan, is_temp_name, parse_temp_name, recover_directory,
    recover_directory_with, temp_name, temp_name_step, BatchState, ExecutionResult, Outcome,
    RecoverReport, RecoveredFile, RenameCall, RenameFs, RenamePhase, SkippedFile, StdFs,
    StepRecord, TEMP_MARKER,
};
pub use history::{create_history_entry, format_history, History, HistoryEntry};
pub use operations::{
    ensure_single_directory, extensions_operation, history_operation, recover_operation, replace_operation,
    search_operation, sequence_operation, BatchOptions, SequenceOptions,
};
pub use output::{
    BatchResult, ExtensionsResult, HistoryItem, HistoryResult, OutputFormat, OutputFormatter, RecoverResult,
    SearchHit, SearchResult, VersionResult,
};
pub use plan::{build_plan, plan_file, read_plan, write_plan, Plan, RenameStep, StepStatus};
pub use preview::{render_plan, Preview};
pub use rule::{NamingRule, ReplaceRule, SequenceRule, MAX_PADDING};
pub use scanner::{
    existing_names, existing_names_for, list_extensions, scan_directory, scan_recursive,
    ScanOptions,
};
pub use validate::{check_name, validate_plan, NameLimits, Violation, ViolationKind};
