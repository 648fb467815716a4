//! Command implementations for the rulemark CLI.
//!
//! - **validate**: expand paths (directories, `-` for stdin), validate in
//!   parallel, optionally write corrections back, render the results
//! - **shared**: path expansion and directory walking

pub(crate) mod shared;
pub(crate) mod validate;

pub(crate) use validate::run as validate_command;
