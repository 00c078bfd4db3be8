//! Rendering a grid for the terminal.

use knockoff_engine::cell::CellSnapshot;
use knockoff_engine::Grid;

/// Aligned `CELL  FORMULA  VALUE` table of the non-blank cells.
pub fn render_table(grid: &Grid) -> String {
    render_snapshot_table(&grid.snapshot())
}

pub fn render_snapshot_table(cells: &[CellSnapshot]) -> String {
    let headers = ["CELL", "FORMULA", "VALUE"];
    let rows: Vec<[&str; 3]> = cells
        .iter()
        .map(|c| [c.cell.as_str(), c.formula.as_str(), c.display.as_str()])
        .collect();

    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, field) in widths.iter_mut().zip(row) {
            *width = (*width).max(field.chars().count());
        }
    }

    let mut out = String::new();
    for row in std::iter::once(&headers).chain(&rows) {
        let line = format!(
            "{:<w0$}  {:<w1$}  {}",
            row[0],
            row[1],
            row[2],
            w0 = widths[0],
            w1 = widths[1],
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Pretty JSON array of the non-blank cells.
pub fn render_json(grid: &Grid) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&grid.snapshot())
}
