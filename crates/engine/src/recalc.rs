//! Recalculation scheduling and reporting.
//!
//! Every edit triggers a full pass: Kahn's algorithm orders all cells of the
//! grid so that each cell comes after the cells it depends on, then formula
//! cells are evaluated in that order. The ordering pass runs to completion
//! before any value is written, so a grid with a cycle is left untouched.

use std::collections::VecDeque;
use std::time::Instant;

use crate::cell_id::CellId;
use crate::error::EvalError;
use crate::grid::Grid;

/// Report from a full recalculation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecalcReport {
    /// Time taken for the pass in microseconds.
    pub duration_us: u64,

    /// Cells placed in evaluation order (always the whole grid on success).
    pub cells_visited: usize,

    /// Number of formula cells that were evaluated.
    pub formulas_evaluated: usize,

    /// Formula cells whose evaluation failed, in evaluation order.
    pub errors: Vec<RecalcError>,
}

impl RecalcReport {
    /// Create a new empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Format as a concise one-line summary for logging.
    pub fn summary(&self) -> String {
        format!(
            "{} formulas over {} cells in {}us, errors={}",
            self.formulas_evaluated,
            self.cells_visited,
            self.duration_us,
            self.errors.len()
        )
    }

    /// Format as a one-line log entry.
    ///
    /// Format: `[recalc/full]   41us  16 cells  formulas=2  errors=0`
    pub fn log_line(&self) -> String {
        format!(
            "[recalc/full] {:>6}us  {} cells  formulas={}  errors={}",
            self.duration_us,
            self.cells_visited,
            self.formulas_evaluated,
            self.errors.len()
        )
    }

    /// Error recorded for a specific cell, if any.
    pub fn error_for(&self, cell: CellId) -> Option<EvalError> {
        self.errors.iter().find(|e| e.cell == cell).map(|e| e.error)
    }
}

/// An error that occurred during recomputation of a specific cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecalcError {
    /// The cell where the error occurred.
    pub cell: CellId,

    /// What went wrong.
    pub error: EvalError,
}

impl RecalcError {
    /// Create a new recalc error.
    pub fn new(cell: CellId, error: EvalError) -> Self {
        Self { cell, error }
    }
}

/// Report when the topological pass cannot order every cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Cells left unordered: the cycle members and everything downstream of them.
    pub cells: Vec<CellId>,

    /// How many cells the pass did order.
    pub visited: usize,

    /// How many cells the grid holds.
    pub total: usize,

    /// Human-readable description of the cycle.
    pub message: String,
}

impl CycleReport {
    /// Create a new cycle report.
    pub fn new(cells: Vec<CellId>, visited: usize, total: usize, message: impl Into<String>) -> Self {
        Self {
            cells,
            visited,
            total,
            message: message.into(),
        }
    }

    /// Create a cycle report for a self-referencing cell.
    pub fn self_reference(cell: CellId, visited: usize, total: usize) -> Self {
        Self::new(
            vec![cell],
            visited,
            total,
            format!("Cell {} references itself", cell),
        )
    }

    /// Create a cycle report for a multi-cell cycle.
    pub fn cycle(cells: Vec<CellId>, visited: usize, total: usize) -> Self {
        let cell_list: Vec<String> = cells.iter().map(|c| c.to_string()).collect();
        let message = if cells.len() <= 5 {
            format!("Circular reference: {}", cell_list.join(" → "))
        } else {
            format!(
                "Circular reference involving {} cells: {} → ... → {}",
                cells.len(),
                cell_list[0],
                cell_list[cell_list.len() - 1]
            )
        };
        Self::new(cells, visited, total, message)
    }
}

impl std::fmt::Display for CycleReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CycleReport {}

impl Grid {
    /// Order every cell so that each comes after the cells it depends on.
    ///
    /// Kahn's algorithm with a FIFO queue seeded in row-major order. Uses each
    /// cell's `in_degree_sort` as the working in-degree and restores it before
    /// returning.
    pub(crate) fn topological_order(&mut self) -> Result<Vec<usize>, CycleReport> {
        for cell in &mut self.cells {
            cell.reset_in_degree_sort();
        }

        let total = self.cells.len();
        let mut queue: VecDeque<usize> = self
            .cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.in_degree == 0)
            .map(|(index, _)| index)
            .collect();
        let mut order = Vec::with_capacity(total);

        while let Some(index) = queue.pop_front() {
            order.push(index);

            for k in 0..self.cells[index].adjacents.len() {
                let dependent = self.index(self.cells[index].adjacents[k]);
                let cell = &mut self.cells[dependent];
                cell.in_degree_sort = cell.in_degree_sort.saturating_sub(1);
                if cell.in_degree_sort == 0 {
                    queue.push_back(dependent);
                }
            }
        }

        for cell in &mut self.cells {
            cell.reset_in_degree_sort();
        }

        if order.len() == total {
            return Ok(order);
        }

        let mut visited = vec![false; total];
        for &index in &order {
            visited[index] = true;
        }
        let unordered: Vec<CellId> = self
            .cells
            .iter()
            .zip(&visited)
            .filter(|(_, seen)| !**seen)
            .map(|(cell, _)| cell.id())
            .collect();

        Err(match unordered.as_slice() {
            [only] => CycleReport::self_reference(*only, order.len(), total),
            _ => CycleReport::cycle(unordered, order.len(), total),
        })
    }

    /// Cells in the order the next recalculation would evaluate them.
    pub fn evaluation_order(&mut self) -> Result<Vec<CellId>, CycleReport> {
        let order = self.topological_order()?;
        Ok(order.into_iter().map(|index| self.cells[index].id()).collect())
    }

    /// Recompute every formula cell in dependency order.
    ///
    /// Returns the cycle report without touching any value if the cells cannot
    /// be ordered. Evaluation errors do not stop the pass: the failing cell
    /// keeps the error (value 0) and cells referencing it inherit it.
    pub fn recalculate_all(&mut self) -> Result<RecalcReport, CycleReport> {
        let start = Instant::now();
        let order = self.topological_order()?;

        let mut report = RecalcReport::new();
        report.cells_visited = order.len();

        for index in order {
            let Some(tree) = self.cells[index].expression.as_ref() else {
                continue;
            };
            let result = tree.evaluate(|id| self.lookup(id));

            let cell = &mut self.cells[index];
            log::trace!("evaluate {} -> {:?}", cell.id(), result);
            match result {
                Ok(value) => {
                    cell.value = value;
                    cell.error = None;
                }
                Err(error) => {
                    cell.value = 0;
                    cell.error = Some(error);
                    report.errors.push(RecalcError::new(cell.id(), error));
                }
            }
            report.formulas_evaluated += 1;
        }

        report.duration_us = start.elapsed().as_micros() as u64;
        Ok(report)
    }

    /// Value of a referenced cell as seen by a formula.
    fn lookup(&self, id: CellId) -> Result<i64, EvalError> {
        match self.index_of(id) {
            Some(index) => {
                let cell = &self.cells[index];
                match cell.error {
                    Some(error) => Err(error),
                    None => Ok(cell.value),
                }
            }
            None => Ok(0),
        }
    }
}
