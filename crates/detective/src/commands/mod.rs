//! CLI subcommands.

pub mod checks;
pub mod diagnose;
