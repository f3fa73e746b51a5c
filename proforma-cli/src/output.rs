//! Output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, CellAlignment, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use proforma_core::{ConsolidatedResult, RowField};

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Spinner on stderr while a request is in flight
pub fn spinner(msg: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(msg.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Render consolidated rows; the `#` column is the 1-based row number used by edits
pub fn result_table(result: &ConsolidatedResult) -> Table {
    let mut table = create_table();
    let mut header = vec![Cell::new("#")];
    header.extend(RowField::ALL.iter().map(|f| Cell::new(f.label())));
    table.set_header(header);

    for (idx, row) in result.rows.iter().enumerate() {
        let mut cells = vec![Cell::new(idx + 1)];
        for field in RowField::ALL {
            let cell = match row.number(field) {
                Some(n) if field.is_amount() => Cell::new(format_amount(n)),
                Some(n) => Cell::new(format!("{:.2}", n)),
                None => Cell::new(row.display(field)),
            };
            let cell = if field.is_numeric() {
                cell.set_alignment(CellAlignment::Right)
            } else {
                cell
            };
            cells.push(cell);
        }
        table.add_row(cells);
    }
    table
}

/// Accounting style: thousands separators, negatives in parentheses
pub fn format_amount(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if value < 0.0 {
        format!("({}.{})", grouped, frac_part)
    } else {
        format!("{}.{}", grouped, frac_part)
    }
}

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
