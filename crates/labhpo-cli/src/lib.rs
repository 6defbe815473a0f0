//! Library side of the `labhpo` binary: logging setup, run configuration
//! and the pipeline stages the subcommands are built from.

pub mod config;
pub mod logging;
pub mod pipeline;
