//! Subcommands of the `rcpt` binary.

pub mod batch;
pub mod config;
pub mod parse;
