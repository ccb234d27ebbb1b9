//! ACS turnstile report CLI library.
//!
//! This crate provides the CLI interface for building per-unit attendance
//! reports from ACS exports.

mod cli;
pub mod commands;
mod config;
pub mod discover;

pub use cli::Cli;
pub use config::Config;
