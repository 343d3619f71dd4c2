//! Subcommand implementations.

pub mod account;
pub mod history;
pub mod sync;
