use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use labhpo_cli::pipeline::ClassifyReport;
use labhpo_core::ClosureReport;
use labhpo_model::ErrorKind;

use crate::types::CommandResult;

pub fn print_summary(result: &CommandResult) {
    for (label, path) in &result.outputs {
        println!("{label}: {}", path.display());
    }
    if let Some(read) = &result.read {
        println!("Lab events: {} read, {} skipped", read.read, read.skipped);
    }
    if let Some(stats) = &result.aggregation {
        println!(
            "Aggregated: {} numeric, {} non-numeric, {} within normal limits",
            stats.observed, stats.non_numeric, stats.normal
        );
    }
    if let Some(report) = &result.classification {
        print_outcome_table(report);
    }
    if let Some(report) = &result.closure {
        print_closure_table(report);
    }
}

fn print_outcome_table(report: &ClassifyReport) {
    let diagnostics = &report.diagnostics;
    let total = diagnostics.total();
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Outcome"),
        header_cell("Rows"),
        header_cell("Share"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);

    let accepted = diagnostics.accepted();
    table.add_row(vec![
        Cell::new("Accepted").fg(Color::Green),
        count_cell(accepted, Color::Green),
        share_cell(accepted, total),
    ]);
    for kind in ErrorKind::ALL {
        let count = diagnostics.rejected(kind);
        table.add_row(vec![
            Cell::new(kind.to_string()),
            count_cell(count, Color::Red),
            share_cell(count, total),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(total).add_attribute(Attribute::Bold),
        dim_cell("-"),
    ]);
    println!("{table}");

    let failures = diagnostics.fallback_failures().len();
    if failures > 0 {
        println!("Textual fallback failed for {failures} quantitative test(s)");
    }
    let ordinal = diagnostics.ordinal_numeric().len();
    if ordinal > 0 {
        println!("{ordinal} ordinal test(s) carried numeric values with unreadable text");
    }
}

fn print_closure_table(report: &ClosureReport) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Batches"),
        header_cell("Rows read"),
        header_cell("Expanded"),
        header_cell("Skipped"),
        header_cell("Inferred"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 0..5 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    table.add_row(vec![
        Cell::new(report.batches),
        Cell::new(report.rows_read),
        Cell::new(report.rows_expanded),
        count_cell(report.rows_skipped, Color::Yellow),
        Cell::new(report.rows_written).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn count_cell(count: u64, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn share_cell(count: u64, total: u64) -> Cell {
    if total == 0 {
        return dim_cell("-");
    }
    #[allow(clippy::cast_precision_loss)]
    let share = count as f64 * 100.0 / total as f64;
    Cell::new(format!("{share:.1}%"))
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
