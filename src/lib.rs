//! An interpreter for decTest conformance scripts.
//!
//! A script is a sequence of directives (`precision: 9`), test cases
//! (`addx001 add 1 1 -> 2`), and comments. The [`Runner`] tokenizes each
//! line, maintains the per-file arithmetic [`Context`], decodes literals
//! (plain, hex, and format-dependent notations), dispatches operations to an
//! [`Engine`], and verifies results and condition flags, tallying
//! pass/fail/skip counts per file with recursive `dectest:` inclusion.
//!
//! The [`SimpleEngine`] supplies the non-transcendental arithmetic; any
//! other implementation of [`Engine`] can be driven instead.

pub mod context;
pub mod engine;
pub mod errors;
pub mod literal;
pub mod ops;
pub mod runner;
pub mod tokens;

mod case;
mod verify;

use std::io::Write;
use std::path::Path;

pub use context::{Context, Rounding, Status};
pub use engine::{DecValue, Engine, EngineError, Format, SimpleEngine};
pub use errors::{Result, RunnerError};
pub use runner::{Counters, Runner, DEFAULT_SKIP_IDS};

/// Run one script file with the built-in engine and the default skip list.
pub fn run_script(path: impl AsRef<Path>, out: &mut impl Write) -> Result<Counters> {
    Runner::new(SimpleEngine::new()).run_file(path, out)
}
