//! The square grid of cells and the edit protocol that keeps it consistent.
//!
//! Every edit runs classify → parse → rewire → full recalculation before
//! returning. An edit that would close a reference cycle is rolled back by
//! re-applying the cell's previous input.

use std::fmt;

use crate::cell::{Cell, CellInput, CellSnapshot};
use crate::cell_id::CellId;
use crate::error::{EngineError, EvalError, Result};
use crate::events::{CycleDetectedEvent, EventCallback, GridEvent, RecalculatedEvent};
use crate::formula;
use crate::recalc::RecalcReport;

/// Rows and columns of a grid built with `Grid::default()`.
pub const DEFAULT_GRID_SIZE: usize = 200;

/// Largest side length `Grid::try_new` accepts.
pub const MAX_GRID_SIZE: usize = 2048;

/// A `size` × `size` grid of integer cells, stored row-major.
pub struct Grid {
    size: usize,
    pub(crate) cells: Vec<Cell>,
    event_callback: Option<EventCallback>,
}

impl Grid {
    /// Build a blank grid.
    ///
    /// # Panics
    ///
    /// Panics if `size` exceeds `MAX_GRID_SIZE`. Use `try_new` for sizes that
    /// come from user input.
    pub fn new(size: usize) -> Self {
        match Self::try_new(size) {
            Ok(grid) => grid,
            Err(e) => panic!("{}", e),
        }
    }

    /// Build a blank grid, rejecting sizes above `MAX_GRID_SIZE`.
    pub fn try_new(size: usize) -> Result<Self> {
        let too_large = EngineError::GridTooLarge {
            size,
            max: MAX_GRID_SIZE,
        };
        if size > MAX_GRID_SIZE {
            return Err(too_large);
        }
        let count = size.checked_mul(size).ok_or(too_large)?;

        let mut cells = Vec::with_capacity(count);
        for row in 0..size {
            for col in 0..size {
                cells.push(Cell::new(CellId::new(row, col)));
            }
        }
        Ok(Self {
            size,
            cells,
            event_callback: None,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub(crate) fn index_of(&self, id: CellId) -> Option<usize> {
        if id.row < self.size && id.col < self.size {
            Some(self.index(id))
        } else {
            None
        }
    }

    /// Array index of an in-bounds cell.
    pub(crate) fn index(&self, id: CellId) -> usize {
        id.row * self.size + id.col
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cell_by_id(CellId::new(row, col))
    }

    pub fn cell_by_id(&self, id: CellId) -> Option<&Cell> {
        self.index_of(id).map(|index| &self.cells[index])
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    // =========================================================================
    // Read access
    // =========================================================================

    pub fn get_cell_value(&self, row: usize, col: usize) -> Option<i64> {
        self.cell(row, col).map(Cell::value)
    }

    /// What a front-end shows for the cell. Empty for out-of-range coordinates.
    pub fn get_cell_display(&self, row: usize, col: usize) -> String {
        self.cell(row, col).map(Cell::display).unwrap_or_default()
    }

    pub fn get_cell_formula_text(&self, row: usize, col: usize) -> String {
        self.cell(row, col)
            .map(|c| c.formula().to_string())
            .unwrap_or_default()
    }

    pub fn get_cell_editable_text(&self, row: usize, col: usize) -> String {
        self.cell(row, col).map(Cell::editable_text).unwrap_or_default()
    }

    pub fn has_formula(&self, row: usize, col: usize) -> bool {
        self.cell(row, col).is_some_and(Cell::has_expression)
    }

    pub fn cell_error(&self, row: usize, col: usize) -> Option<EvalError> {
        self.cell(row, col).and_then(Cell::error)
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Register a callback invoked synchronously for every grid event.
    pub fn set_event_callback(&mut self, callback: EventCallback) {
        self.event_callback = Some(callback);
    }

    pub fn clear_event_callback(&mut self) {
        self.event_callback = None;
    }

    fn emit(&mut self, event: GridEvent) {
        if let Some(callback) = self.event_callback.as_mut() {
            callback(event);
        }
    }

    // =========================================================================
    // Edits
    // =========================================================================

    /// Set a cell from raw editor text and recalculate the grid.
    pub fn set_cell_formula(&mut self, row: usize, col: usize, raw: &str) -> Result<()> {
        self.set_cell(CellId::new(row, col), raw)
    }

    /// Set a cell from raw editor text and recalculate the grid.
    ///
    /// Parse errors and out-of-range references leave the grid untouched.
    /// An edit that closes a cycle is undone before `EngineError::Cycle` is
    /// returned. An arithmetic failure in the edited cell keeps the edit and
    /// is reported as `EngineError::Arithmetic`.
    pub fn set_cell(&mut self, id: CellId, raw: &str) -> Result<()> {
        let index = self.index_of(id).ok_or(EngineError::OutOfBounds {
            row: id.row,
            col: id.col,
            size: self.size,
        })?;

        let cell = &self.cells[index];
        if raw == cell.input() {
            log::trace!("{} unchanged, skipping", id);
            return match cell.error() {
                Some(error) => Err(EngineError::Arithmetic { cell: id, error }),
                None => Ok(()),
            };
        }
        let previous = cell.input().to_string();

        self.apply_input(index, raw)?;

        match self.recalculate_all() {
            Ok(report) => self.finish_recalc(id, report),
            Err(cycle) => {
                self.apply_input(index, &previous)?;
                let report = self.recalculate_all()?;
                log::warn!(
                    "{}: rejected {:?}: {} (restored {:?}, {})",
                    id,
                    raw,
                    cycle,
                    previous,
                    report.summary()
                );

                self.emit(GridEvent::CycleDetected(CycleDetectedEvent {
                    cell: id,
                    attempted_input: raw.to_string(),
                    cells: cycle.cells.clone(),
                }));
                Err(EngineError::Cycle(cycle))
            }
        }
    }

    /// Install `raw` into the cell at `index` without recalculating.
    ///
    /// Formula text is compiled and its references bounds-checked before
    /// the cell or the dependency graph is touched.
    fn apply_input(&mut self, index: usize, raw: &str) -> Result<()> {
        let id = self.cells[index].id();

        let input = CellInput::classify(raw);
        log::debug!("{}: {:?}", id, input);

        match input {
            CellInput::Formula(text) => {
                let tree = formula::compile(&text)?;
                self.update_dependencies(id, tree.references())?;

                let cell = &mut self.cells[index];
                cell.formula = tree.render();
                cell.expression = Some(tree);
                cell.error = None;
            }
            CellInput::Literal(value) => {
                self.update_dependencies(id, [])?;

                let cell = &mut self.cells[index];
                cell.formula = raw.to_string();
                cell.value = value;
                cell.expression = None;
                cell.error = None;
            }
            CellInput::Label(text) => {
                self.update_dependencies(id, [])?;

                let cell = &mut self.cells[index];
                cell.formula = text;
                cell.value = 0;
                cell.expression = None;
                cell.error = None;
            }
        }

        self.cells[index].input = raw.to_string();
        Ok(())
    }

    fn finish_recalc(&mut self, target: CellId, report: RecalcReport) -> Result<()> {
        log::debug!("{}", report.log_line());
        for failure in &report.errors {
            log::warn!("{}: {}", failure.cell, failure.error);
        }

        self.emit(GridEvent::Recalculated(RecalculatedEvent {
            formulas_evaluated: report.formulas_evaluated,
            error_cells: report.errors.iter().map(|e| e.cell).collect(),
        }));

        match report.error_for(target) {
            Some(error) => Err(EngineError::Arithmetic { cell: target, error }),
            None => Ok(()),
        }
    }

    /// Reset every cell to blank. Nothing is left to recalculate.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.reset();
        }
        log::info!("cleared {}x{} grid", self.size, self.size);
    }

    // =========================================================================
    // Dumps
    // =========================================================================

    /// Every non-blank cell, row-major.
    pub fn snapshot(&self) -> Vec<CellSnapshot> {
        self.cells
            .iter()
            .filter(|c| !c.is_blank())
            .map(CellSnapshot::from)
            .collect()
    }

    /// One line per row: each cell's value (or error code), comma-separated.
    pub fn values_table(&self) -> String {
        self.table(|cell| match cell.error() {
            Some(error) => error.code().to_string(),
            None => cell.value().to_string(),
        })
    }

    /// One line per row: each cell's formula text, comma-separated.
    pub fn formulas_table(&self) -> String {
        self.table(|cell| cell.formula().to_string())
    }

    fn table<F: Fn(&Cell) -> String>(&self, render: F) -> String {
        let mut out = String::new();
        for row in self.cells.chunks(self.size.max(1)) {
            let line: Vec<String> = row.iter().map(&render).collect();
            out.push_str(&line.join(","));
            out.push('\n');
        }
        out
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_SIZE)
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("size", &self.size)
            .field("non_blank", &self.cells.iter().filter(|c| !c.is_blank()).count())
            .field("has_event_callback", &self.event_callback.is_some())
            .finish()
    }
}
