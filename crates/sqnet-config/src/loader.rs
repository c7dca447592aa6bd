//! Configuration file loading and error types.

use std::{fs, path::Path};

use crate::Config;

/// Errors raised while reading, parsing or validating a config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml: {0}")]
    Toml(#[from] toml::de::Error),
    /// File extension other than `toml`, `json` or `jsonc`.
    #[error("unsupported config format: {0:?}")]
    UnsupportedFormat(String),
    #[error("validation: {0}")]
    Validation(String),
}

/// Load a config file, choosing the format by extension (toml, json, jsonc).
///
/// The extension is checked before the file is read.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "json" | "jsonc" => {
            let data = fs::read(path)?;
            let stripped = json_comments::StripComments::new(data.as_slice());
            Ok(serde_json::from_reader(stripped)?)
        }
        "toml" => Ok(toml::from_str(&fs::read_to_string(path)?)?),
        _ => Err(ConfigError::UnsupportedFormat(ext)),
    }
}
