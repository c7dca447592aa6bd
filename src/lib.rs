//! # sqnet
//!
//! Stream connections over QUIC on a path-aware SCION network.
//!
//! ## Crates
//!
//! - [`sqnet_core`] - Shared defaults
//! - [`sqnet_pan`] - Addresses, paths, selectors and QUIC sessions
//! - [`sqnet_transport`] - Connection and listener adapters, dial/listen functions
//! - [`sqnet_config`] - Configuration loading, validation and logging setup

pub mod cli;

pub use sqnet_config as config;
pub use sqnet_core as core;
pub use sqnet_pan as pan;
pub use sqnet_transport as transport;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use sqnet_config::{Config, load_config, validate_config};
    pub use sqnet_pan::{IsdAsn, Network, UdpAddr};
    pub use sqnet_transport::{Conn, Defaults, Listener, TransportError, dial_string, listen_string};
}
