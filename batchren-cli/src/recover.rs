use anyhow::Result;
use batchren_core::{recover_operation, OutputFormatter};
use std::path::Path;

use crate::OutputFormat;

/// Returns true when every stranded file was restored
pub fn handle_recover(dir: &Path, output: OutputFormat) -> Result<bool> {
    let result = recover_operation(dir, None)?;
    print!("{}", result.format(output.into()));
    Ok(result.report.skipped.is_empty())
}
