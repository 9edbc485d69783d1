//! High-level operations that correspond to CLI commands
//!
//! These modules contain the business logic for each batchren command,
//! separated from CLI concerns like argument parsing and output formatting.

mod batch;
pub mod history;
pub mod recover;
pub mod replace;
pub mod search;
pub mod sequence;

pub use batch::BatchOptions;
pub use history::history_operation;
pub use recover::recover_operation;
pub use replace::replace_operation;
pub use search::search_operation;
pub use sequence::{
    ensure_single_directory, extensions_operation, sequence_operation, SequenceOptions,
};
