// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tabular text rendering for the console sink

/// Cells longer than this are cut and end in `...`
pub const MAX_CELL_WIDTH: usize = 20;

/// Shorten a cell to at most [`MAX_CELL_WIDTH`] characters
pub fn truncate_cell(cell: &str) -> String {
    if cell.chars().count() <= MAX_CELL_WIDTH {
        return cell.to_string();
    }
    let head: String = cell.chars().take(MAX_CELL_WIDTH - 3).collect();
    format!("{head}...")
}

/// Render rows as a bordered, right-aligned table
///
/// ```text
/// +----------+---------+
/// |     email|birthYear|
/// +----------+---------+
/// |x@test.com|     1960|
/// +----------+---------+
/// ```
pub fn render_table(columns: &[&str], rows: &[Vec<String>]) -> String {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|c| truncate_cell(c)).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|c| c.chars().count())
                .chain([name.chars().count(), 3])
                .max()
                .unwrap_or(3)
        })
        .collect();

    let border = {
        let mut line = String::from("+");
        for width in &widths {
            line.push_str(&"-".repeat(*width));
            line.push('+');
        }
        line
    };

    let mut out = String::new();
    out.push_str(&border);
    out.push('\n');
    out.push_str(&format_row(&widths, columns.iter().copied()));
    out.push('\n');
    out.push_str(&border);
    out.push('\n');
    for row in &rows {
        out.push_str(&format_row(&widths, row.iter().map(String::as_str)));
        out.push('\n');
    }
    out.push_str(&border);
    out.push('\n');
    out
}

fn format_row<'a>(widths: &[usize], mut cells: impl Iterator<Item = &'a str>) -> String {
    let mut line = String::from("|");
    for width in widths {
        let cell = cells.next().unwrap_or("");
        line.push_str(&format!("{cell:>width$}", width = *width));
        line.push('|');
    }
    line
}

/// Separator printed before each console batch
pub fn batch_header(batch: u64) -> String {
    let rule = "-".repeat(43);
    format!("{rule}\nBatch: {batch}\n{rule}\n")
}

#[cfg(test)]
#[path = "console_tests.rs"]
mod tests;
