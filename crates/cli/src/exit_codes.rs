//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract — scripts rely on them.
//!
//! # Exit Codes
//!
//! | Code | Domain    | Description                              |
//! |------|-----------|------------------------------------------|
//! | 0    | Universal | Success                                  |
//! | 1    | Universal | General error (unspecified)              |
//! | 2    | Universal | CLI usage error (bad args, missing file) |
//! | 3    | grid      | Formula or cell name failed to parse     |
//! | 4    | grid      | Edit rejected because it closed a cycle  |
//! | 5    | grid      | Formula evaluated to `#DIV/0!`/`#NUM!`   |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `grid_exit_code` or the relevant command

use knockoff_engine::EngineError;

use crate::script::LineError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unreadable script or settings file.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Grid (3-5)
// =============================================================================

/// Malformed formula, bad cell name, or reference outside the grid.
pub const EXIT_PARSE: u8 = 3;

/// Edit rolled back because it introduced a circular reference.
pub const EXIT_CYCLE: u8 = 4;

/// Formula evaluation failed (division by zero, overflow).
pub const EXIT_ARITHMETIC: u8 = 5;

/// Map an engine error to its exit code.
pub fn grid_exit_code(err: &EngineError) -> u8 {
    match err {
        EngineError::Parse(_) | EngineError::ReferenceOutOfBounds { .. } => EXIT_PARSE,
        EngineError::OutOfBounds { .. } | EngineError::GridTooLarge { .. } => EXIT_USAGE,
        EngineError::Cycle(_) => EXIT_CYCLE,
        EngineError::Arithmetic { .. } => EXIT_ARITHMETIC,
    }
}

/// Map a script line error to its exit code.
pub fn line_exit_code(err: &LineError) -> u8 {
    match err {
        LineError::BadCell(_) => EXIT_PARSE,
        LineError::Engine(e) => grid_exit_code(e),
    }
}
