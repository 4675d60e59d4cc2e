//! Command-line interface orchestration for the argot toolbox.
//!
//! The toolbox is a container of demonstration commands whose grammar is
//! derived by the engine from their signatures; no parser is written by
//! hand.

mod commands;

pub use commands::{CliError, PROGRAM, render_output, run_cli, toolbox};

#[cfg(test)]
mod tests;
