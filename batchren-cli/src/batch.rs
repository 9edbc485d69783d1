use batchren_core::{BatchOptions, BatchResult, Config, OutputFormatter, Preview};
use std::str::FromStr;

use crate::cli::ExecArgs;
use crate::OutputFormat;

/// Merge command-line flags over the configured defaults
pub fn batch_options(
    exec: &ExecArgs,
    config: &Config,
    auto_approve: bool,
    no_color: bool,
) -> BatchOptions {
    let defaults = &config.defaults;

    // JSON output carries the plan itself; quiet suppresses the preview
    let preview = if exec.quiet || exec.output == OutputFormat::Json {
        Preview::None
    } else {
        exec.preview.map(Into::into).unwrap_or_else(|| {
            Preview::from_str(&defaults.preview_format).unwrap_or(Preview::Table)
        })
    };

    let use_color = if no_color {
        Some(false)
    } else {
        defaults.use_color
    };

    BatchOptions {
        dry_run: exec.dry_run,
        auto_approve,
        preview,
        use_color,
        case_policy: exec.case_policy.map_or(defaults.case_policy, Into::into),
        limits: defaults.name_limits(),
        record_history: defaults.record_history,
    }
}

pub fn print_batch_result(
    result: &BatchResult,
    preview: Option<String>,
    output: OutputFormat,
    quiet: bool,
) {
    match output {
        OutputFormat::Json => {
            print!("{}", result.format_json());
        },
        OutputFormat::Summary => {
            if quiet {
                return;
            }
            if let Some(preview) = preview {
                println!("{}", preview);
            }
            print!("{}", result.format_summary());
        },
    }
}
