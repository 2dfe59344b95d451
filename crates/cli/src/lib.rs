//! # pokedata CLI
//!
//! Subcommands and the shared context they run with. The binary in
//! `main.rs` only parses arguments and reports errors.

pub mod commands;
pub mod context;

pub use context::{CliContext, GlobalArgs};
