use batchren_core::{CasePolicy, Preview, SortKey};
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum PreviewArg {
    Table,
    Summary,
    Json,
    None,
}

impl From<PreviewArg> for Preview {
    fn from(arg: PreviewArg) -> Self {
        match arg {
            PreviewArg::Table => Self::Table,
            PreviewArg::Summary => Self::Summary,
            PreviewArg::Json => Self::Json,
            PreviewArg::None => Self::None,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum OutputFormat {
    Summary,
    Json,
}

impl From<OutputFormat> for batchren_core::OutputFormat {
    fn from(arg: OutputFormat) -> Self {
        match arg {
            OutputFormat::Summary => Self::Summary,
            OutputFormat::Json => Self::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum SortArg {
    Mtime,
    Size,
    Name,
    Ctime,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Mtime => Self::Mtime,
            SortArg::Size => Self::Size,
            SortArg::Name => Self::Name,
            SortArg::Ctime => Self::Ctime,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum CasePolicyArg {
    Auto,
    Sensitive,
    Insensitive,
}

impl From<CasePolicyArg> for CasePolicy {
    fn from(arg: CasePolicyArg) -> Self {
        match arg {
            CasePolicyArg::Auto => Self::Auto,
            CasePolicyArg::Sensitive => Self::Sensitive,
            CasePolicyArg::Insensitive => Self::Insensitive,
        }
    }
}
