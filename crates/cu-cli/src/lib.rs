//! Cluster usage CLI library.
//!
//! This crate provides the CLI interface for cluster usage reports.

mod cli;
pub mod commands;
mod config;
pub mod input;
pub mod render;

pub use cli::{Cli, Commands, InputArgs};
pub use config::Config;
