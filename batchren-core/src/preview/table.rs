use comfy_table::{Cell, Color, ContentArrangement, Table};
use std::io::{self, IsTerminal};

use super::display_path;
use crate::conflict::ConflictKind;
use crate::plan::Plan;

/// Render plan as a table, one row per rename
pub fn render_table(plan: &Plan, use_color: bool) -> String {
    let mut table = Table::new();

    if io::stdout().is_terminal() {
        table.set_content_arrangement(ContentArrangement::Dynamic);
    } else {
        table.set_content_arrangement(ContentArrangement::Disabled);
    }

    // Force styling even in non-TTY environments when colors are explicitly requested
    if use_color {
        table.enforce_styling();
        table.set_header(vec![
            Cell::new("#").fg(Color::Cyan),
            Cell::new("Source").fg(Color::Cyan),
            Cell::new("Target").fg(Color::Cyan),
            Cell::new("Note").fg(Color::Cyan),
        ]);
    } else {
        table.set_header(vec!["#", "Source", "Target", "Note"]);
    }

    for (index, step) in plan.steps.iter().enumerate() {
        let note = match step.conflict {
            Some(ConflictKind::Internal) => {
                format!("suffix _{} (duplicate in batch)", step.conflict_suffix)
            },
            Some(ConflictKind::External) => {
                format!("suffix _{} (name taken)", step.conflict_suffix)
            },
            None => String::new(),
        };

        let target = if step.is_auto_suffixed() && use_color {
            Cell::new(&step.target).fg(Color::Yellow)
        } else {
            Cell::new(&step.target)
        };
        let note = if use_color {
            Cell::new(note).fg(Color::Yellow)
        } else {
            Cell::new(note)
        };

        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(display_path(&step.source)),
            target,
            note,
        ]);
    }

    let mut output = table.to_string();
    let suffixed = plan.auto_suffixed().count();
    output.push_str(&format!(
        "\n{} rename(s), {} auto-suffixed, {} unchanged",
        plan.steps.len(),
        suffixed,
        plan.unchanged
    ));
    output
}
