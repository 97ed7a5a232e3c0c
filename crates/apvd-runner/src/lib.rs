//! Apvd Runner - command line entry point
//!
//! Wires the core use cases to the HTTP gateway and exposes them as
//! subcommands: batch workflow actions over an items file and diff inspection.

pub mod cli;
pub mod model;
pub mod runner;
pub mod startup;

pub use cli::{Cli, Command, GlobalArgs};
pub use model::config::Configuration;
pub use runner::Runner;
