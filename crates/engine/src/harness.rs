//! Test harness for grid edits with event tracking.
//!
//! This module provides `GridHarness`, a wrapper around `Grid` that:
//! - Collects every event (CycleDetected, Recalculated)
//! - Applies scripted ops, stopping at the first failing one
//! - Checks graph invariants after every op
//!
//! Use this harness to test edit sequences without a front-end.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::cell_id::CellId;
use crate::error::EngineError;
use crate::events::EventCollector;
use crate::grid::Grid;

/// Operation to apply to a grid.
#[derive(Debug, Clone)]
pub enum Op {
    /// Set a cell from raw editor text.
    Set { cell: &'static str, input: String },
    /// Reset the whole grid.
    Clear,
}

impl Op {
    pub fn set(cell: &'static str, input: impl Into<String>) -> Self {
        Op::Set {
            cell,
            input: input.into(),
        }
    }
}

/// Result of applying operations.
#[derive(Debug)]
pub struct ApplyResult {
    /// Number of ops that succeeded.
    pub applied: usize,
    /// Index and error of the first failing op.
    pub error: Option<(usize, EngineError)>,
}

/// Test harness wrapping Grid with event tracking.
pub struct GridHarness {
    grid: Grid,
    events: Arc<Mutex<EventCollector>>,
}

impl GridHarness {
    /// Create a new harness with a fresh grid of the given size.
    pub fn new(size: usize) -> Self {
        let events = Arc::new(Mutex::new(EventCollector::new()));
        let sink = Arc::clone(&events);

        let mut grid = Grid::new(size);
        grid.set_event_callback(Box::new(move |event| {
            if let Ok(mut collector) = sink.lock() {
                collector.push(event);
            }
        }));

        Self { grid, events }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// Get collected events.
    pub fn events(&self) -> MutexGuard<'_, EventCollector> {
        self.events.lock().unwrap()
    }

    /// Clear collected events.
    pub fn clear_events(&self) {
        self.events().clear();
    }

    /// Display string of a cell by name.
    pub fn display(&self, name: &str) -> String {
        let id: CellId = name.parse().unwrap();
        self.grid.get_cell_display(id.row, id.col)
    }

    /// Apply ops in order, stopping at the first error.
    ///
    /// Invariants are checked after every op, including the failing one.
    pub fn apply_ops(&mut self, ops: &[Op]) -> ApplyResult {
        let mut applied = 0;

        for (idx, op) in ops.iter().enumerate() {
            let result = match op {
                Op::Set { cell, input } => {
                    let id: CellId = cell.parse().unwrap();
                    self.grid.set_cell(id, input)
                }
                Op::Clear => {
                    self.grid.clear();
                    Ok(())
                }
            };
            self.grid.assert_consistent();

            match result {
                Ok(()) => applied += 1,
                Err(e) => {
                    return ApplyResult {
                        applied,
                        error: Some((idx, e)),
                    }
                }
            }
        }

        ApplyResult {
            applied,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harness_basic_apply() {
        let mut harness = GridHarness::new(4);

        let result = harness.apply_ops(&[
            Op::set("A0", "5"),
            Op::set("B0", "=A0+3"),
            Op::set("C0", "=b0*2"),
        ]);

        assert_eq!(result.applied, 3);
        assert!(result.error.is_none());
        assert_eq!(harness.display("C0"), "16");
        assert_eq!(harness.events().recalculations().len(), 3);
    }

    #[test]
    fn test_harness_stops_at_cycle() {
        let mut harness = GridHarness::new(4);

        let result = harness.apply_ops(&[
            Op::set("A0", "=C0+1"),
            Op::set("C0", "=B0"),
            Op::set("B0", "=A0"),
            Op::set("D0", "never reached"),
        ]);

        assert_eq!(result.applied, 2);
        let (idx, err) = result.error.unwrap();
        assert_eq!(idx, 2);
        assert!(matches!(err, EngineError::Cycle(_)));

        assert_eq!(harness.display("B0"), "");
        assert_eq!(harness.display("D0"), "");

        let events = harness.events();
        assert_eq!(events.cycles().len(), 1);
        assert_eq!(events.cycles()[0].cells.len(), 3);
    }

    #[test]
    fn test_harness_cycle_then_recovery() {
        let mut harness = GridHarness::new(3);

        harness.apply_ops(&[Op::set("A0", "4"), Op::set("A1", "=A0*A0")]);
        let result = harness.apply_ops(&[Op::set("A0", "=A1")]);
        assert!(result.error.is_some());
        assert_eq!(harness.display("A0"), "4");
        assert_eq!(harness.display("A1"), "16");

        harness.clear_events();
        let result = harness.apply_ops(&[Op::set("A0", "=B2-1"), Op::set("B2", "10")]);
        assert_eq!(result.applied, 2);
        assert_eq!(harness.display("A1"), "81");
        assert!(harness.events().cycles().is_empty());
    }

    #[test]
    fn test_harness_clear() {
        let mut harness = GridHarness::new(2);

        let result = harness.apply_ops(&[Op::set("A0", "1"), Op::set("B1", "=A0"), Op::Clear]);

        assert_eq!(result.applied, 3);
        assert_eq!(harness.display("B1"), "");
        assert_eq!(harness.grid().edge_count(), 0);
        assert_eq!(harness.grid_mut().get_cell_value(1, 1), Some(0));
    }
}
