use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use super::types::{CasePolicyArg, OutputFormat, PreviewArg, SortArg};

/// Conflict-safe batch renaming by keyword replacement or sequence numbering
#[derive(Parser, Debug)]
#[command(name = "batchren")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR", value_parser = clap::builder::FalseyValueParser::new())]
    pub no_color: bool,

    /// Run as if started in <path> instead of the current working directory
    #[arg(short = 'C', global = true, value_name = "PATH")]
    pub directory: Option<PathBuf>,

    /// Assume yes for all prompts
    #[arg(short = 'y', long = "yes", global = true, env = "BATCHREN_YES")]
    pub yes: bool,
}

/// Which files a recursive scan considers
#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Only files whose name contains this keyword (empty matches all)
    #[arg(short = 'k', long, default_value = "")]
    pub keyword: String,

    /// Match the keyword case-sensitively
    #[arg(short = 'c', long)]
    pub case_sensitive: bool,

    /// Match the keyword against the path relative to the directory
    #[arg(long)]
    pub match_path: bool,

    /// Include hidden files and directories
    #[arg(long)]
    pub include_hidden: bool,

    /// Exclude glob patterns
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<String>,
}

/// Arguments shared by the renaming commands
#[derive(Args, Debug, Clone)]
pub struct ExecArgs {
    /// Show the plan and exit without renaming anything
    #[arg(long)]
    pub dry_run: bool,

    /// Preview format (defaults to the configured format)
    #[arg(long, value_enum)]
    pub preview: Option<PreviewArg>,

    /// How name comparisons treat letter case (defaults to the configured policy)
    #[arg(long, value_enum)]
    pub case_policy: Option<CasePolicyArg>,

    /// Output format for machine consumption
    #[arg(long, value_enum, default_value = "summary")]
    pub output: OutputFormat,

    /// Suppress all output (alias for --preview none)
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List files a replace run would consider
    Search {
        /// Directory to scan recursively
        #[arg(default_value = ".")]
        dir: PathBuf,

        #[command(flatten)]
        scan: ScanArgs,

        /// Output format for machine consumption
        #[arg(long, value_enum, default_value = "summary")]
        output: OutputFormat,
    },

    /// Replace a substring in file names
    Replace {
        /// Directory to scan recursively
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Text to replace
        #[arg(long)]
        old: String,

        /// Replacement text (empty removes `--old`)
        #[arg(long, default_value = "")]
        new: String,

        #[command(flatten)]
        scan: ScanArgs,

        #[command(flatten)]
        exec: ExecArgs,
    },

    /// Number the files of one directory in sorted order
    Sequence {
        /// Directory whose files are numbered (not recursive)
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Only files with this extension
        #[arg(long)]
        ext: Option<String>,

        /// Sort key deciding the numbering order
        #[arg(long, value_enum, default_value = "mtime")]
        sort: SortArg,

        /// Number in descending order
        #[arg(long)]
        reverse: bool,

        /// First number
        #[arg(long, default_value_t = 1)]
        start: u64,

        /// Zero-pad numbers to this many digits
        #[arg(long, default_value_t = 3)]
        padding: usize,

        /// Text before the number
        #[arg(long, default_value = "")]
        prefix: String,

        /// Text after the number
        #[arg(long, default_value = "")]
        suffix: String,

        /// Drop each file's own extension
        #[arg(long)]
        no_keep_ext: bool,

        /// Include hidden files
        #[arg(long)]
        include_hidden: bool,

        /// List the extensions found in the directory and exit
        #[arg(long)]
        list_ext: bool,

        #[command(flatten)]
        exec: ExecArgs,
    },

    /// Show executed batches
    History {
        /// Limit number of entries
        #[arg(long)]
        limit: Option<usize>,

        /// Output format for machine consumption
        #[arg(long, value_enum, default_value = "summary")]
        output: OutputFormat,

        /// Suppress all output
        #[arg(long)]
        quiet: bool,
    },

    /// Restore files left at temporary names by a partially applied batch
    Recover {
        /// Directory holding the stranded files
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Output format for machine consumption
        #[arg(long, value_enum, default_value = "summary")]
        output: OutputFormat,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,

        /// Write the script into this directory instead of stdout
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },

    /// Show version information
    Version {
        /// Output format for machine consumption
        #[arg(long, value_enum, default_value = "summary")]
        output: OutputFormat,
    },
}
