pub mod cell;
pub mod cell_id;
pub mod dep_graph;
pub mod error;
pub mod events;
pub mod formula;
pub mod grid;
pub mod recalc;

pub use cell_id::CellId;
pub use error::{EngineError, EvalError, ParseError};
pub use grid::{Grid, DEFAULT_GRID_SIZE, MAX_GRID_SIZE};

#[cfg(test)]
pub mod harness;
