//! Subcommand implementations.

pub mod path;
