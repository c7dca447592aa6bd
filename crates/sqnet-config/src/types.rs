//! Configuration type definitions for network, transport, server and logging.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqnet_pan::{IsdAsn, Network, Path, StaticPaths};

use crate::defaults::*;
use crate::loader::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub transport: QuicConfig,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where this host sits in the SCION network and which paths it knows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// ISD-AS of this host. The wildcard `0-0` treats every AS as local.
    #[serde(default = "default_local_ia")]
    pub local_ia: IsdAsn,
    /// Static paths to remote ASes.
    #[serde(default)]
    pub paths: Vec<PathConfig>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            local_ia: default_local_ia(),
            paths: Vec::new(),
        }
    }
}

impl NetworkConfig {
    /// Build the network handle backed by the configured static paths.
    pub fn build(&self) -> Network {
        let mut source = StaticPaths::new(self.local_ia);
        for path in &self.paths {
            source.insert(path.to_path(self.local_ia));
        }
        Network::new(source)
    }
}

/// One static path entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    pub destination: IsdAsn,
    /// ASes traversed, local AS first, destination last.
    pub hops: Vec<IsdAsn>,
    /// Underlay address packets on this path are handed to.
    pub next_hop: SocketAddr,
    #[serde(default = "default_path_mtu")]
    pub mtu: u16,
}

impl PathConfig {
    pub fn to_path(&self, local_ia: IsdAsn) -> Path {
        Path::new(
            local_ia,
            self.destination,
            self.hops.clone(),
            self.next_hop,
            self.mtu,
        )
    }
}

/// QUIC transport parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuicConfig {
    /// ALPN protocol identifier, identical on both ends.
    #[serde(default = "default_alpn")]
    pub alpn: String,
    #[serde(default = "default_max_idle_timeout_secs")]
    pub max_idle_timeout_secs: u64,
    /// Keep-alive interval in seconds (0 = disabled).
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
}

impl Default for QuicConfig {
    fn default() -> Self {
        Self {
            alpn: default_alpn(),
            max_idle_timeout_secs: default_max_idle_timeout_secs(),
            keep_alive_secs: default_keep_alive_secs(),
        }
    }
}

impl QuicConfig {
    pub fn transport_config(&self) -> Result<quinn::TransportConfig, ConfigError> {
        let idle = quinn::IdleTimeout::try_from(Duration::from_secs(self.max_idle_timeout_secs))
            .map_err(|e| ConfigError::Validation(format!("transport.max_idle_timeout_secs: {e}")))?;

        let mut transport = quinn::TransportConfig::default();
        transport.max_idle_timeout(Some(idle));
        if self.keep_alive_secs > 0 {
            transport.keep_alive_interval(Some(Duration::from_secs(self.keep_alive_secs)));
        }
        Ok(transport)
    }
}

/// Settings for the `sqnet listen` echo server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Listen address, `ip:port` or `:port`.
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: Option<String>,
    /// Log format: json, pretty, or compact. Default: pretty.
    pub format: Option<String>,
    /// Output target: stdout or stderr. Default: stderr.
    pub output: Option<String>,
    /// Per-module log level filters (e.g., {"quinn": "warn", "sqnet_pan": "debug"}).
    #[serde(default)]
    pub filters: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let cfg = Config::default();
        assert!(cfg.network.local_ia.is_wildcard());
        assert!(cfg.network.paths.is_empty());
        assert_eq!(cfg.transport.alpn, "hello-quic");
        assert_eq!(cfg.transport.max_idle_timeout_secs, 30);
        assert_eq!(cfg.transport.keep_alive_secs, 0);
        assert_eq!(cfg.server.listen, "127.0.0.1:4433");
        assert!(cfg.logging.level.is_none());
    }

    #[test]
    fn empty_toml_is_default() {
        let cfg: Config = toml::from_str("").unwrap();
        assert!(cfg.network.local_ia.is_wildcard());
        assert_eq!(cfg.transport.alpn, "hello-quic");
    }

    #[test]
    fn deserialize_full_toml() {
        let toml_str = r#"
[network]
local_ia = "1-ff00:0:110"

[[network.paths]]
destination = "1-ff00:0:111"
hops = ["1-ff00:0:110", "1-ff00:0:111"]
next_hop = "10.0.0.2:30041"

[transport]
alpn = "custom"
max_idle_timeout_secs = 10
keep_alive_secs = 2

[server]
listen = ":8443"

[logging]
level = "debug"
format = "json"

[logging.filters]
quinn = "warn"
"#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.network.local_ia.to_string(), "1-ff00:0:110");
        assert_eq!(cfg.network.paths.len(), 1);
        let path = &cfg.network.paths[0];
        assert_eq!(path.destination.to_string(), "1-ff00:0:111");
        assert_eq!(path.hops.len(), 2);
        assert_eq!(path.mtu, 1472);
        assert_eq!(cfg.transport.alpn, "custom");
        assert_eq!(cfg.transport.keep_alive_secs, 2);
        assert_eq!(cfg.server.listen, ":8443");
        assert_eq!(cfg.logging.level.as_deref(), Some("debug"));
        assert_eq!(cfg.logging.filters.get("quinn").map(String::as_str), Some("warn"));
    }

    #[test]
    fn invalid_isd_asn_is_rejected() {
        let err = toml::from_str::<Config>("[network]\nlocal_ia = \"not-an-ia\"\n");
        assert!(err.is_err());
    }

    #[test]
    fn network_uses_configured_paths() {
        let cfg: NetworkConfig = toml::from_str(
            r#"
local_ia = "1-ff00:0:110"

[[paths]]
destination = "1-ff00:0:111"
hops = ["1-ff00:0:110", "1-ff00:0:111"]
next_hop = "10.0.0.2:30041"
mtu = 1400
"#,
        )
        .unwrap();
        let network = cfg.build();
        assert_eq!(network.local_ia(), cfg.local_ia);

        let remote = "1-ff00:0:111,10.0.0.9:443".parse().unwrap();
        let selector = sqnet_pan::DefaultSelector::new();
        let path = network.resolve_path(&remote, None, &selector).unwrap();
        assert_eq!(path.next_hop(), Some("10.0.0.2:30041".parse().unwrap()));
        assert_eq!(path.mtu(), 1400);
    }

    #[test]
    fn transport_config_from_quic_config() {
        let cfg = QuicConfig {
            keep_alive_secs: 5,
            ..QuicConfig::default()
        };
        assert!(cfg.transport_config().is_ok());
    }
}
