//! Error types for the grid engine.

use thiserror::Error;

use crate::cell_id::CellId;
use crate::recalc::CycleReport;

/// Malformed formula text. Always surfaced before the grid is mutated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Empty formula")]
    Empty,

    #[error("Unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter { ch: char, position: usize },

    #[error("Malformed cell reference at position {position}")]
    MalformedReference { position: usize },

    #[error("Number too large at position {position}")]
    LiteralOutOfRange { position: usize },

    #[error("Unbalanced ')' at position {position}")]
    UnbalancedParen { position: usize },

    #[error("Unterminated '(' group")]
    UnterminatedGroup,

    #[error("Operator is missing an operand")]
    MissingOperand,

    #[error("Operand is missing an operator")]
    DanglingOperand,
}

/// Failure while evaluating an expression tree.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalError {
    #[error("Division by zero")]
    DivisionByZero,

    #[error("Integer overflow")]
    Overflow,
}

impl EvalError {
    /// Short error code shown in place of a cell's value.
    pub fn code(&self) -> &'static str {
        match self {
            EvalError::DivisionByZero => "#DIV/0!",
            EvalError::Overflow => "#NUM!",
        }
    }
}

/// Errors returned from grid edits.
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    #[error("Grid size {size} is too large (at most {max})")]
    GridTooLarge { size: usize, max: usize },

    #[error("Cell ({row}, {col}) is outside the {size}x{size} grid")]
    OutOfBounds { row: usize, col: usize, size: usize },

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Reference {reference} is outside the {size}x{size} grid")]
    ReferenceOutOfBounds { reference: CellId, size: usize },

    #[error("Cycle found: {0}")]
    Cycle(#[from] CycleReport),

    #[error("Cell {cell}: {error}")]
    Arithmetic {
        cell: CellId,
        #[source]
        error: EvalError,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;
