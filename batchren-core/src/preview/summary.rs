use nu_ansi_term::{Color as AnsiColor, Style};
use std::fmt::Write;

use super::display_path;
use crate::plan::Plan;

/// Render plan as a compact line-per-rename summary
pub fn render_summary(plan: &Plan, use_color: bool) -> String {
    let mut output = String::new();

    writeln!(output, "[PLAN SUMMARY]").unwrap();
    writeln!(output, "Plan: {}", plan.id).unwrap();
    writeln!(output, "Rule: {}", plan.rule).unwrap();
    writeln!(output, "Order: {}", plan.ordering).unwrap();
    writeln!(output, "Renames: {}", plan.steps.len()).unwrap();
    writeln!(output, "Unchanged: {}", plan.unchanged).unwrap();
    writeln!(output).unwrap();

    let warn = if use_color {
        Style::new().fg(AnsiColor::Yellow).bold()
    } else {
        Style::new()
    };

    for step in &plan.steps {
        if step.is_auto_suffixed() {
            let line = format!(
                "{} -> {} (wanted {}, auto-suffixed)",
                display_path(&step.source),
                step.target,
                step.candidate
            );
            writeln!(output, "{}", warn.paint(line)).unwrap();
        } else {
            writeln!(output, "{} -> {}", display_path(&step.source), step.target).unwrap();
        }
    }

    output
}
