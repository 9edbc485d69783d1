use anyhow::Result;
use batchren_core::{
    extensions_operation, sequence_operation, BatchOptions, Outcome, OutputFormatter,
    SequenceOptions,
};
use std::path::Path;

use crate::batch::print_batch_result;
use crate::OutputFormat;

pub fn handle_sequence(
    dir: &Path,
    sequence: &SequenceOptions,
    options: &BatchOptions,
    output: OutputFormat,
    quiet: bool,
) -> Result<Option<Outcome>> {
    let (result, preview) = sequence_operation(dir, sequence, options, None)?;

    print_batch_result(&result, preview, output, quiet);
    Ok(result.outcome())
}

pub fn handle_list_extensions(
    dir: &Path,
    include_hidden: bool,
    output: OutputFormat,
) -> Result<()> {
    let result = extensions_operation(dir, include_hidden, None)?;
    print!("{}", result.format(output.into()));
    Ok(())
}
