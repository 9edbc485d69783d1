pub mod args;
pub mod types;

pub use args::{Cli, Commands, ExecArgs, ScanArgs};
pub use types::{CasePolicyArg, OutputFormat, PreviewArg, SortArg};
