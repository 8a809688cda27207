//! fieldmeta command-line front end.
//!
//! Thin commands over the engine crates:
//! - `types`: the field-type catalogue
//! - `decode`: a stored definition's typed view
//! - `check`: a definition settled against fixture reference data

pub mod check;
pub mod cli;
pub mod decode;
pub mod input;
pub mod list;
pub mod logging;

pub use cli::{Cli, Commands};

/// Exit code for success.
pub const EXIT_OK: i32 = 0;
/// Exit code for failures.
pub const EXIT_ERROR: i32 = 1;
/// Exit code when the command completed but recovered from problems.
pub const EXIT_WARNINGS: i32 = 2;
