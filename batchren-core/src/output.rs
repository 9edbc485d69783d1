use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt::Write;
use std::path::PathBuf;

use crate::execute::{ExecutionResult, Outcome, RecoverReport};
use crate::plan::{Plan, StepStatus};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Summary,
    Json,
}

/// Result of a replace or sequence operation
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResult {
    pub plan: Plan,
    /// Absent when the user declined before anything ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionResult>,
    pub aborted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    /// Plan saved before a live run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_file: Option<PathBuf>,
}

impl BatchResult {
    pub fn outcome(&self) -> Option<Outcome> {
        self.execution.as_ref().map(|e| e.outcome)
    }
}

/// One file found by a search
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchHit {
    pub path: PathBuf,
    pub size: u64,
    pub modified: String,
}

/// Result of a search operation
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResult {
    pub root: PathBuf,
    pub keyword: String,
    pub hits: Vec<SearchHit>,
}

/// Result of a history operation
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResult {
    pub entries: Vec<HistoryItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    pub timestamp: String,
    pub mode: String,
    pub rule: String,
    pub outcome: Outcome,
    pub committed: usize,
    pub auto_suffixed: usize,
    pub stranded: usize,
}

/// Result of a recover operation
#[derive(Debug, Serialize, Deserialize)]
pub struct RecoverResult {
    pub dir: PathBuf,
    pub report: RecoverReport,
}

/// Extensions found by `sequence --list-ext`
#[derive(Debug, Serialize, Deserialize)]
pub struct ExtensionsResult {
    pub dir: PathBuf,
    pub extensions: Vec<String>,
}

/// Result of a version command
#[derive(Debug, Serialize, Deserialize)]
pub struct VersionResult {
    pub name: String,
    pub version: String,
}

/// Trait for formatting output in different formats
pub trait OutputFormatter {
    fn format(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => self.format_json(),
            OutputFormat::Summary => self.format_summary(),
        }
    }
    fn format_json(&self) -> String;
    fn format_summary(&self) -> String;
}

impl OutputFormatter for BatchResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "success": self.execution.as_ref().is_some_and(|e| e.success),
            "operation": self.plan.rule.mode(),
            "plan_id": self.plan.id,
            "rule": self.plan.rule.to_string(),
            "aborted": self.aborted,
            "summary": {
                "renames": self.plan.steps.len(),
                "auto_suffixed": self.plan.auto_suffixed().count(),
                "unchanged": self.plan.unchanged,
            },
            "plan": self.plan,
            "execution": self.execution,
            "log_file": self.log_file,
            "plan_file": self.plan_file,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        if self.aborted {
            return "Aborted.\n".to_string();
        }
        let Some(ref execution) = self.execution else {
            return "Nothing executed.\n".to_string();
        };

        let mut output = String::new();
        match execution.outcome {
            Outcome::Empty => {
                writeln!(output, "Nothing to rename ({} unchanged)", self.plan.unchanged).unwrap();
            },
            Outcome::DryRun => {
                writeln!(
                    output,
                    "Dry run: {} file(s) would be renamed",
                    execution.steps.len()
                )
                .unwrap();
            },
            Outcome::Applied => {
                writeln!(
                    output,
                    "✓ Renamed {} file(s)",
                    execution.count(StepStatus::Committed)
                )
                .unwrap();
            },
            Outcome::RolledBack => {
                writeln!(output, "✗ Batch failed and was rolled back; no files changed").unwrap();
                for step in execution.steps.iter().filter(|s| s.status == StepStatus::Failed) {
                    writeln!(
                        output,
                        "  {}: {}",
                        step.source.display(),
                        step.error.as_deref().unwrap_or("unknown error")
                    )
                    .unwrap();
                }
            },
            Outcome::Partial => {
                writeln!(
                    output,
                    "⚠ Batch partially applied: {} committed, {} left at temporary names",
                    execution.count(StepStatus::Committed),
                    execution.stranded.len()
                )
                .unwrap();
                for step in &execution.stranded {
                    writeln!(
                        output,
                        "  {} (was {})",
                        step.temp.display(),
                        step.source.display()
                    )
                    .unwrap();
                }
                for error in &execution.rollback_errors {
                    writeln!(output, "  {}", error).unwrap();
                }
                if let Some(dir) = execution.stranded.first().and_then(|s| s.temp.parent()) {
                    writeln!(output, "Recover with: batchren recover {}", dir.display()).unwrap();
                }
            },
        }

        if !execution.auto_suffixed.is_empty() {
            writeln!(
                output,
                "⚠ {} file(s) auto-suffixed to avoid name conflicts:",
                execution.auto_suffixed.len()
            )
            .unwrap();
            for step in &execution.auto_suffixed {
                writeln!(
                    output,
                    "  {} -> {} (wanted {})",
                    step.source.display(),
                    step.target.display(),
                    step.candidate
                )
                .unwrap();
            }
        }

        if !execution.dry_run && execution.outcome != Outcome::Empty {
            writeln!(output, "Plan ID: {}", self.plan.id).unwrap();
        }
        if let Some(ref log_file) = self.log_file {
            writeln!(output, "Log: {}", log_file.display()).unwrap();
        }
        if let Some(ref plan_file) = self.plan_file {
            writeln!(output, "Plan: {}", plan_file.display()).unwrap();
        }

        output
    }
}

impl OutputFormatter for SearchResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "success": true,
            "operation": "search",
            "root": self.root,
            "keyword": self.keyword,
            "count": self.hits.len(),
            "hits": self.hits,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        if self.hits.is_empty() {
            return format!("No files matching '{}' found\n", self.keyword);
        }

        let mut output = String::new();
        for hit in &self.hits {
            writeln!(output, "{}", hit.path.display()).unwrap();
        }
        writeln!(output, "{} file(s) found", self.hits.len()).unwrap();
        output
    }
}

impl OutputFormatter for HistoryResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "entries": self.entries
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        if self.entries.is_empty() {
            return "No history entries found".to_string();
        }

        let mut output = String::new();
        for entry in &self.entries {
            write!(
                output,
                "{} [{}] {} ({} renamed",
                entry.id, entry.mode, entry.rule, entry.committed
            )
            .unwrap();

            if entry.auto_suffixed > 0 {
                write!(output, ", {} auto-suffixed", entry.auto_suffixed).unwrap();
            }
            if entry.stranded > 0 {
                write!(output, ", {} stranded", entry.stranded).unwrap();
            }

            writeln!(output, ") {} {}", entry.outcome, entry.timestamp).unwrap();
        }

        output
    }
}

impl OutputFormatter for RecoverResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "success": self.report.skipped.is_empty(),
            "operation": "recover",
            "dir": self.dir,
            "restored": self.report.restored,
            "skipped": self.report.skipped,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        if self.report.restored.is_empty() && self.report.skipped.is_empty() {
            return format!("No stranded files in {}\n", self.dir.display());
        }

        let mut output = String::new();
        for file in &self.report.restored {
            writeln!(
                output,
                "✓ {} -> {}",
                file.temp.display(),
                file.original.display()
            )
            .unwrap();
        }
        for file in &self.report.skipped {
            writeln!(output, "✗ {}: {}", file.temp.display(), file.reason).unwrap();
        }
        writeln!(
            output,
            "Restored {}, skipped {}",
            self.report.restored.len(),
            self.report.skipped.len()
        )
        .unwrap();
        output
    }
}

impl OutputFormatter for ExtensionsResult {
    fn format_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        if self.extensions.is_empty() {
            return format!("No file extensions in {}\n", self.dir.display());
        }
        let mut output = String::new();
        for extension in &self.extensions {
            writeln!(output, "{}", extension).unwrap();
        }
        output
    }
}

impl OutputFormatter for VersionResult {
    fn format_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        format!("{} {}", self.name, self.version)
    }
}
