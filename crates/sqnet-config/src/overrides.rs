//! Command-line overrides layered over a loaded config.

use clap::Parser;
use sqnet_pan::IsdAsn;

use crate::Config;

#[derive(Parser, Debug, Clone, Default)]
pub struct CliOverrides {
    /// Override listen address, e.g. 0.0.0.0:4433 or :4433
    #[arg(long)]
    pub listen: Option<String>,
    /// Override local ISD-AS, e.g. 1-ff00:0:110
    #[arg(long)]
    pub local_ia: Option<IsdAsn>,
    /// Override ALPN protocol identifier
    #[arg(long)]
    pub alpn: Option<String>,
    /// Override QUIC idle timeout (seconds)
    #[arg(long)]
    pub max_idle_timeout_secs: Option<u64>,
    /// Override keep-alive interval (seconds, 0 disables)
    #[arg(long)]
    pub keep_alive_secs: Option<u64>,
    /// Override log level
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn apply_overrides(config: &mut Config, overrides: &CliOverrides) {
    if let Some(v) = &overrides.listen {
        config.server.listen = v.clone();
    }
    if let Some(v) = overrides.local_ia {
        config.network.local_ia = v;
    }
    if let Some(v) = &overrides.alpn {
        config.transport.alpn = v.clone();
    }
    if let Some(v) = overrides.max_idle_timeout_secs {
        config.transport.max_idle_timeout_secs = v;
    }
    if let Some(v) = overrides.keep_alive_secs {
        config.transport.keep_alive_secs = v;
    }
    if let Some(v) = &overrides.log_level {
        config.logging.level = Some(v.clone());
    }
}
