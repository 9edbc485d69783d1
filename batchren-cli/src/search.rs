use anyhow::Result;
use batchren_core::{search_operation, Config, OutputFormatter, ScanOptions};
use std::path::Path;

use crate::cli::ScanArgs;
use crate::OutputFormat;

pub fn handle_search(
    dir: &Path,
    scan: ScanArgs,
    config: &Config,
    output: OutputFormat,
) -> Result<()> {
    let options = ScanOptions {
        keyword: scan.keyword,
        case_sensitive: scan.case_sensitive,
        match_path: scan.match_path,
        include_hidden: scan.include_hidden || config.defaults.include_hidden,
        ignore_dirs: config.defaults.ignore_dirs.clone(),
        excludes: scan.exclude,
    };

    let result = search_operation(dir, &options, None)?;
    print!("{}", result.format(output.into()));
    Ok(())
}
