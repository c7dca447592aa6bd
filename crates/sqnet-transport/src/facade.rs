//! Dial and listen entry points with default configuration.
//!
//! [`Defaults`] bundles the network handle, the TLS defaults and an optional
//! QUIC transport config. Build it once and pass it to every call.

use std::net::SocketAddr;
use std::sync::Arc;

use quinn::TransportConfig;
use sqnet_core::defaults::{DEFAULT_LISTEN_HOST, DEFAULT_LISTEN_HOST_LITERAL, SESSION_ABORT_CODE};
use sqnet_pan::{DialOptions, ListenOptions, Network, UdpAddr};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::conn::Conn;
use crate::error::TransportError;
use crate::listener::Listener;
use crate::tls::TlsDefaults;

/// Configuration shared by the convenience dial/listen functions.
#[derive(Debug, Clone)]
pub struct Defaults {
    network: Network,
    tls: TlsDefaults,
    transport: Option<Arc<TransportConfig>>,
}

impl Defaults {
    /// Defaults with freshly generated TLS configs.
    pub fn new(network: Network) -> Result<Self, TransportError> {
        Ok(Self::with_tls(network, TlsDefaults::generate()?))
    }

    pub fn with_tls(network: Network, tls: TlsDefaults) -> Self {
        Self {
            network,
            tls,
            transport: None,
        }
    }

    /// Apply `transport` to every session dialled or accepted with these
    /// defaults.
    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn tls(&self) -> &TlsDefaults {
        &self.tls
    }

    pub fn dial_options(&self) -> DialOptions {
        let mut options = DialOptions::new(self.tls.client());
        options.transport = self.transport.clone();
        options
    }

    pub fn listen_options(&self) -> ListenOptions {
        let mut options = ListenOptions::new(self.tls.server());
        options.transport = self.transport.clone();
        options
    }
}

/// Bind a listener on `addr` with explicit options.
pub fn listen_quic(
    network: &Network,
    addr: SocketAddr,
    options: ListenOptions,
) -> Result<Listener, TransportError> {
    let inner = network.listen_quic(addr, options)?;
    Ok(Listener::new(inner))
}

/// Listen on all interfaces at `port`.
pub fn listen_port(defaults: &Defaults, port: u16) -> Result<Listener, TransportError> {
    listen_ip_port(defaults, SocketAddr::new(DEFAULT_LISTEN_HOST, port))
}

pub fn listen_ip_port(defaults: &Defaults, addr: SocketAddr) -> Result<Listener, TransportError> {
    listen_quic(&defaults.network, addr, defaults.listen_options())
}

/// Listen on `ip:port`, or on all interfaces for a bare `:port`.
pub fn listen_string(defaults: &Defaults, addr: &str) -> Result<Listener, TransportError> {
    listen_ip_port(defaults, parse_listen_addr(addr)?)
}

/// Parse a listen address, expanding `:port` to `0.0.0.0:port`.
pub fn parse_listen_addr(addr: &str) -> Result<SocketAddr, std::net::AddrParseError> {
    if addr.starts_with(':') {
        format!("{DEFAULT_LISTEN_HOST_LITERAL}{addr}").parse()
    } else {
        addr.parse()
    }
}

/// Establish a session with `remote` and open one stream on it.
///
/// Cancellation aborts either step. A session whose stream cannot be opened
/// is closed before returning.
pub async fn dial_quic(
    network: &Network,
    cancel: &CancellationToken,
    remote: &UdpAddr,
    options: &DialOptions,
) -> Result<Conn, TransportError> {
    let session = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(TransportError::Cancelled),
        result = network.dial_quic(remote, options) => result?,
    };

    let opened = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        result = session.open_stream() => Some(result),
    };

    match opened {
        Some(Ok((send, recv))) => {
            debug!(local = %session.local_addr(), remote = %remote, "connection established");
            Ok(Conn::new(session, send, recv))
        }
        Some(Err(e)) => {
            session.close(SESSION_ABORT_CODE, b"stream open failed");
            Err(e.into())
        }
        None => {
            session.close(SESSION_ABORT_CODE, b"cancelled");
            Err(TransportError::Cancelled)
        }
    }
}

pub async fn dial_context_addr(
    defaults: &Defaults,
    cancel: &CancellationToken,
    remote: &UdpAddr,
) -> Result<Conn, TransportError> {
    dial_quic(&defaults.network, cancel, remote, &defaults.dial_options()).await
}

/// Dial `remote` without a cancellation signal.
pub async fn dial_addr(defaults: &Defaults, remote: &UdpAddr) -> Result<Conn, TransportError> {
    dial_context_addr(defaults, &CancellationToken::new(), remote).await
}

/// Parse `remote` as a SCION UDP address and dial it.
pub async fn dial_context_string(
    defaults: &Defaults,
    cancel: &CancellationToken,
    remote: &str,
) -> Result<Conn, TransportError> {
    let remote: UdpAddr = remote.parse()?;
    dial_context_addr(defaults, cancel, &remote).await
}

pub async fn dial_string(defaults: &Defaults, remote: &str) -> Result<Conn, TransportError> {
    dial_context_string(defaults, &CancellationToken::new(), remote).await
}
