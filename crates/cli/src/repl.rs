//! Line-oriented interactive mode.

use std::io::{self, BufRead, Write};

use knockoff_engine::{CellId, Grid};

use crate::output::render_table;
use crate::script::parse_line;

const HELP: &str = "\
Commands:
  <CELL> <input>   set a cell (5, Total, =A0+B0*2)
  get <CELL>       show one cell
  show             table of non-empty cells
  values           every value, row by row
  formulas         every formula, row by row
  clear            reset the grid
  help             this text
  quit             leave
";

/// Run the REPL until `quit` or end of input.
///
/// `prompt` prints `> ` before each line (off when input is piped).
pub fn run_repl<R, W>(grid: &mut Grid, input: R, mut out: W, prompt: bool) -> io::Result<()>
where
    R: BufRead,
    W: Write,
{
    let mut lines = input.lines();

    loop {
        if prompt {
            write!(out, "> ")?;
            out.flush()?;
        }
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let trimmed = line.trim();

        let mut words = trimmed.split_whitespace();
        match words.next().map(str::to_ascii_lowercase).as_deref() {
            None => {}
            Some("quit") | Some("exit") => break,
            Some("help") => write!(out, "{}", HELP)?,
            Some("show") => write!(out, "{}", render_table(grid))?,
            Some("values") => write!(out, "{}", grid.values_table())?,
            Some("formulas") => write!(out, "{}", grid.formulas_table())?,
            Some("clear") => {
                grid.clear();
                writeln!(out, "cleared")?;
            }
            Some("get") => match words.next().map(str::parse::<CellId>) {
                Some(Ok(id)) if grid.cell_by_id(id).is_some() => {
                    writeln!(
                        out,
                        "{}: {} = {}",
                        id,
                        grid.get_cell_editable_text(id.row, id.col),
                        grid.get_cell_display(id.row, id.col)
                    )?;
                }
                Some(Ok(id)) => writeln!(out, "error: {} is outside the grid", id)?,
                _ => writeln!(out, "error: usage: get <CELL>")?,
            },
            Some(_) => match parse_line(&line) {
                Ok(Some(edit)) => match grid.set_cell(edit.cell, &edit.input) {
                    Ok(()) => writeln!(
                        out,
                        "{} = {}",
                        edit.cell,
                        grid.get_cell_display(edit.cell.row, edit.cell.col)
                    )?,
                    Err(e) => writeln!(out, "error: {}", e)?,
                },
                Ok(None) => {}
                Err(e) => writeln!(out, "error: {} (try `help`)", e)?,
            },
        }
    }

    Ok(())
}
