use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, Table};

use crate::report::Issue;
use crate::runner::types::RunOutcome;

/// Terminal summary of a run.
pub struct RunReporter;

impl RunReporter {
    pub fn print_summary(outcome: &RunOutcome) {
        let result = &outcome.result;

        println!("\n{}", "━".repeat(50));
        println!("{}", "Summary".bold());
        println!("{}", "━".repeat(50));

        println!(
            "  {}: {} executed, {} skipped",
            "Requests".bold(),
            outcome.executed,
            outcome.skipped.to_string().dimmed()
        );
        println!(
            "  {}: {}",
            "Changed files".bold(),
            colored_count(result.changed_files_count(), false)
        );
        println!(
            "  {}: {}",
            "Request errors".bold(),
            colored_count(result.request_error_count(), true)
        );
        println!(
            "  {}: {}",
            "Format errors".bold(),
            colored_count(result.format_error_count(), true)
        );

        if outcome.cancelled {
            println!("  {}", "Run cancelled before completion".yellow());
        }

        if !outcome.report.is_empty() {
            println!("{}", issue_table(&outcome.report.issues));
        }
    }
}

fn colored_count(count: usize, is_error: bool) -> colored::ColoredString {
    match (count, is_error) {
        (0, _) => count.to_string().green(),
        (_, true) => count.to_string().red(),
        (_, false) => count.to_string().yellow(),
    }
}

fn issue_table(issues: &[Issue]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["ID", "Description", "Endpoint", "Status", "Test case", "Output"]);

    for issue in issues {
        let status_color = if issue.status_code.starts_with('2') {
            Color::Yellow
        } else {
            Color::Red
        };

        table.add_row(vec![
            Cell::new(&issue.id),
            Cell::new(&issue.description),
            Cell::new(&issue.endpoint),
            Cell::new(&issue.status_code).fg(status_color),
            Cell::new(&issue.test_case),
            Cell::new(&issue.output_file_path).add_attribute(Attribute::Dim),
        ]);
    }

    table
}
