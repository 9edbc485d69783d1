use crate::config::STATE_DIR;
use crate::output::{HistoryItem, HistoryResult};
use crate::History;
use anyhow::Result;
use std::path::Path;

/// History operation - returns structured data
pub fn history_operation(
    limit: Option<usize>,
    working_dir: Option<&Path>,
) -> Result<HistoryResult> {
    let current_dir = working_dir.unwrap_or_else(|| Path::new("."));
    let state_dir = current_dir.join(STATE_DIR);

    let history = History::load(&state_dir)?;
    let entries = history.list_entries(limit);

    let items: Vec<HistoryItem> = entries
        .into_iter()
        .map(|e| HistoryItem {
            id: e.id.clone(),
            timestamp: e.created_at.clone(),
            mode: e.mode.clone(),
            rule: e.rule.clone(),
            outcome: e.outcome,
            committed: e.committed,
            auto_suffixed: e.auto_suffixed,
            stranded: e.stranded,
        })
        .collect();

    Ok(HistoryResult { entries: items })
}
