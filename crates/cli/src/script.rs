//! Edit scripts: one `<CELL> <raw input>` edit per line.
//!
//! ```text
//! # comment
//! A0 5
//! B0 =A0+3
//! C0 Total due
//! ```
//!
//! Everything after the first run of whitespace is the raw input, verbatim.
//! A cell name with nothing after it sets the cell to the empty string.

use knockoff_engine::{CellId, EngineError, Grid};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LineError {
    #[error("bad cell name {0:?}")]
    BadCell(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// One parsed script line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub cell: CellId,
    pub input: String,
}

/// A line that could not be applied.
#[derive(Debug)]
pub struct LineFailure {
    /// 1-based line number.
    pub line: usize,
    pub error: LineError,
}

/// What happened when a script ran.
#[derive(Debug, Default)]
pub struct ScriptOutcome {
    pub applied: usize,
    pub failures: Vec<LineFailure>,
}

impl ScriptOutcome {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Parse one line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Edit>, LineError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let (name, input) = match trimmed.find(char::is_whitespace) {
        Some(split) => {
            let rest = &trimmed[split..];
            let input = rest
                .char_indices()
                .find(|(_, c)| !c.is_whitespace())
                .map(|(i, _)| &rest[i..])
                .unwrap_or("");
            (&trimmed[..split], input)
        }
        None => (trimmed, ""),
    };

    let cell: CellId = name
        .parse()
        .map_err(|_| LineError::BadCell(name.to_string()))?;

    Ok(Some(Edit {
        cell,
        input: input.to_string(),
    }))
}

/// Apply every line of `text` to `grid`.
///
/// Failing lines are recorded and skipped. With `strict`, the first failure
/// stops the run.
pub fn run_script(grid: &mut Grid, text: &str, strict: bool) -> ScriptOutcome {
    let mut outcome = ScriptOutcome::default();

    for (idx, line) in text.lines().enumerate() {
        let result = parse_line(line).and_then(|edit| match edit {
            Some(edit) => grid
                .set_cell(edit.cell, &edit.input)
                .map(|()| true)
                .map_err(LineError::from),
            None => Ok(false),
        });

        match result {
            Ok(true) => outcome.applied += 1,
            Ok(false) => {}
            Err(error) => {
                log::info!("line {}: {}", idx + 1, error);
                outcome.failures.push(LineFailure {
                    line: idx + 1,
                    error,
                });
                if strict {
                    break;
                }
            }
        }
    }

    outcome
}
