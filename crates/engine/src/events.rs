//! Event types for grid change notifications.
//!
//! A front-end registers an [`EventCallback`] on the grid and is called
//! synchronously, on the editing thread, before the edit call returns.

use crate::cell_id::CellId;

/// Events emitted by Grid during edits.
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    /// An edit introduced a reference cycle and was rolled back.
    CycleDetected(CycleDetectedEvent),

    /// A full recalculation completed.
    Recalculated(RecalculatedEvent),
}

/// Emitted after a cycle-introducing edit has been rolled back.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleDetectedEvent {
    /// The edited cell.
    pub cell: CellId,
    /// The raw input that was rejected.
    pub attempted_input: String,
    /// Cells the topological pass could not order.
    pub cells: Vec<CellId>,
}

/// Emitted after every successful recalculation.
#[derive(Debug, Clone, PartialEq)]
pub struct RecalculatedEvent {
    /// Formula cells that were evaluated.
    pub formulas_evaluated: usize,
    /// Cells whose evaluation ended in an error.
    pub error_cells: Vec<CellId>,
}

/// Callback type for receiving grid events.
pub type EventCallback = Box<dyn FnMut(GridEvent) + Send>;

/// Simple event collector for testing.
#[derive(Default, Debug)]
pub struct EventCollector {
    events: Vec<GridEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: GridEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[GridEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Filter to only CycleDetected events.
    pub fn cycles(&self) -> Vec<&CycleDetectedEvent> {
        self.events
            .iter()
            .filter_map(|e| match e {
                GridEvent::CycleDetected(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    /// Filter to only Recalculated events.
    pub fn recalculations(&self) -> Vec<&RecalculatedEvent> {
        self.events
            .iter()
            .filter_map(|e| match e {
                GridEvent::Recalculated(r) => Some(r),
                _ => None,
            })
            .collect()
    }
}
