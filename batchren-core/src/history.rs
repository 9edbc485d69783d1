use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::execute::{ExecutionResult, Outcome};
use crate::plan::{Plan, StepStatus};

/// One executed batch, as persisted for post-hoc verification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Plan id of the batch
    pub id: String,
    /// Timestamp when the batch was executed
    pub created_at: String,
    /// "replace" or "sequence"
    pub mode: String,
    /// Human-readable rule description
    pub rule: String,
    /// Directory the batch was run against
    pub root: PathBuf,
    pub outcome: Outcome,
    pub committed: usize,
    pub auto_suffixed: usize,
    pub stranded: usize,
    /// The complete execution record
    pub result: ExecutionResult,
}

/// Manages the execution history
pub struct History {
    path: PathBuf,
    entries: Vec<HistoryEntry>,
}

impl History {
    /// Load history from the state directory
    pub fn load(state_dir: &Path) -> Result<Self> {
        let path = state_dir.join("history.json");
        Self::load_from_path(&path)
    }

    /// Load history from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open history file: {}", path.display()))?;
            let reader = BufReader::new(file);
            serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse history file: {}", path.display()))?
        } else {
            Vec::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Save the history to disk
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)
            .with_context(|| format!("Failed to create history file: {}", self.path.display()))?;

        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &self.entries)
            .with_context(|| format!("Failed to write history file: {}", self.path.display()))?;

        Ok(())
    }

    /// Add a new entry to the history
    pub fn add_entry(&mut self, entry: HistoryEntry) -> Result<()> {
        if self.entries.iter().any(|e| e.id == entry.id) {
            return Err(anyhow!("History entry with ID {} already exists", entry.id));
        }

        self.entries.push(entry);
        self.save()?;
        Ok(())
    }

    /// Find an entry by ID or ID prefix
    pub fn find_entry(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id.starts_with(id))
    }

    pub fn last_entry(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get all entries, optionally limited to the most recent N
    pub fn list_entries(&self, limit: Option<usize>) -> Vec<&HistoryEntry> {
        let entries: Vec<_> = self.entries.iter().rev().collect();
        if let Some(limit) = limit {
            entries.into_iter().take(limit).collect()
        } else {
            entries
        }
    }

    /// Prune history to keep it under a certain size
    pub fn prune(&mut self, max_entries: usize) -> Result<()> {
        if self.entries.len() > max_entries {
            let to_remove = self.entries.len() - max_entries;
            self.entries.drain(0..to_remove);
            self.save()?;
        }
        Ok(())
    }
}

/// Create a history entry from an executed plan
pub fn create_history_entry(plan: &Plan, root: &Path, result: &ExecutionResult) -> HistoryEntry {
    HistoryEntry {
        id: plan.id.clone(),
        created_at: result.timestamp.clone(),
        mode: plan.rule.mode().to_string(),
        rule: plan.rule.to_string(),
        root: root.to_path_buf(),
        outcome: result.outcome,
        committed: result.count(StepStatus::Committed),
        auto_suffixed: result.auto_suffixed.len(),
        stranded: result.stranded.len(),
        result: result.clone(),
    }
}

/// Format history entries for display
pub fn format_history(entries: &[&HistoryEntry], json: bool) -> Result<String> {
    if json {
        Ok(serde_json::to_string_pretty(entries)?)
    } else {
        use comfy_table::{Cell, Color, Table};

        let mut table = Table::new();
        table.set_header(vec![
            Cell::new("ID").fg(Color::Cyan),
            Cell::new("Date").fg(Color::Cyan),
            Cell::new("Rule").fg(Color::Cyan),
            Cell::new("Renamed").fg(Color::Cyan),
            Cell::new("Suffixed").fg(Color::Cyan),
            Cell::new("Outcome").fg(Color::Cyan),
        ]);

        for entry in entries {
            let date = entry
                .created_at
                .split('T')
                .next()
                .unwrap_or(&entry.created_at);

            let outcome = Cell::new(entry.outcome.to_string()).fg(match entry.outcome {
                Outcome::Applied | Outcome::Empty | Outcome::DryRun => Color::Green,
                Outcome::RolledBack => Color::Yellow,
                Outcome::Partial => Color::Red,
            });

            table.add_row(vec![
                Cell::new(&entry.id[..8.min(entry.id.len())]),
                Cell::new(date),
                Cell::new(&entry.rule),
                Cell::new(entry.committed),
                Cell::new(entry.auto_suffixed),
                outcome,
            ]);
        }

        Ok(table.to_string())
    }
}
