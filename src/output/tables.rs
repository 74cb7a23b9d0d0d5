use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::providers::cloudbuild::JobStatus;

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

pub fn status_cell(status: &JobStatus) -> Cell {
    let cell = Cell::new(status.as_str());
    match status {
        JobStatus::Success => cell.fg(TableColor::Green),
        JobStatus::Working => cell.fg(TableColor::Yellow),
        JobStatus::Failure => cell.fg(TableColor::Red),
        JobStatus::Cancelled | JobStatus::Other(_) => cell.fg(TableColor::DarkGrey),
    }
}
