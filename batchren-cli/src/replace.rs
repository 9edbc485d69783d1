use anyhow::Result;
use batchren_core::{replace_operation, BatchOptions, Config, Outcome, ScanOptions};
use std::path::Path;

use crate::batch::print_batch_result;
use crate::cli::ScanArgs;
use crate::OutputFormat;

#[allow(clippy::too_many_arguments)]
pub fn handle_replace(
    dir: &Path,
    old: &str,
    new: &str,
    scan: ScanArgs,
    config: &Config,
    options: &BatchOptions,
    output: OutputFormat,
    quiet: bool,
) -> Result<Option<Outcome>> {
    let scan_options = ScanOptions {
        keyword: String::new(),
        case_sensitive: scan.case_sensitive,
        match_path: scan.match_path,
        include_hidden: scan.include_hidden || config.defaults.include_hidden,
        ignore_dirs: config.defaults.ignore_dirs.clone(),
        excludes: scan.exclude,
    };

    let (result, preview) = replace_operation(
        dir,
        &scan.keyword,
        scan.case_sensitive,
        old,
        new,
        &scan_options,
        options,
        None,
    )?;

    print_batch_result(&result, preview, output, quiet);
    Ok(result.outcome())
}
