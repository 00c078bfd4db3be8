// Library surface of the knockoff CLI, shared by the binary and its tests

pub mod exit_codes;
pub mod output;
pub mod repl;
pub mod script;
