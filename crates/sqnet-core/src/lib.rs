//! Core constants shared across sqnet crates.
//!
//! This crate provides:
//! - Default configuration values
//! - Common project metadata

pub mod defaults;

pub use defaults::*;

/// Project name.
pub const PROJECT_NAME: &str = "sqnet";
/// Project version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
