//! Support library for the argot CLI binary.
//!
//! Exposes the toolbox and logging setup so doctests and tests can exercise
//! the command pipeline without forking a subprocess.

pub mod cli;
pub mod logging;
