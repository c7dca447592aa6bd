//! Configuration loading, validation and logging setup.
//!
//! Files are TOML or JSON (comments allowed in `.json`/`.jsonc`). Every
//! section is optional; missing values fall back to `sqnet_core::defaults`.

mod defaults;
mod loader;
mod logging;
mod overrides;
mod types;
mod validate;

pub use loader::{ConfigError, load_config};
pub use logging::init_tracing;
pub use overrides::{CliOverrides, apply_overrides};
pub use types::*;
pub use validate::validate_config;
