//! Configuration validation logic.

use crate::Config;
use crate::loader::ConfigError;

/// Longest ALPN identifier TLS can carry.
const MAX_ALPN_LEN: usize = 255;
/// Smallest MTU a QUIC path can run over.
const MIN_PATH_MTU: u16 = 1200;

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let alpn = &config.transport.alpn;
    if alpn.is_empty() || alpn.len() > MAX_ALPN_LEN {
        return Err(ConfigError::Validation(format!(
            "transport.alpn must be 1..={MAX_ALPN_LEN} bytes"
        )));
    }
    if config.transport.max_idle_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "transport.max_idle_timeout_secs must be > 0".into(),
        ));
    }
    if config.server.listen.trim().is_empty() {
        return Err(ConfigError::Validation("server.listen is empty".into()));
    }

    let local_ia = config.network.local_ia;
    for (i, path) in config.network.paths.iter().enumerate() {
        if local_ia.is_wildcard() {
            return Err(ConfigError::Validation(format!(
                "network.paths[{i}]: static paths need a concrete network.local_ia"
            )));
        }
        if path.destination == local_ia || path.destination.is_wildcard() {
            return Err(ConfigError::Validation(format!(
                "network.paths[{i}]: destination must be a remote AS"
            )));
        }
        if path.hops.first() != Some(&local_ia) || path.hops.last() != Some(&path.destination) {
            return Err(ConfigError::Validation(format!(
                "network.paths[{i}]: hops must start at {local_ia} and end at {}",
                path.destination
            )));
        }
        if path.mtu < MIN_PATH_MTU {
            return Err(ConfigError::Validation(format!(
                "network.paths[{i}]: mtu must be >= {MIN_PATH_MTU}"
            )));
        }
    }
    Ok(())
}
