//! QUIC sessions over selected paths.
//!
//! [`Network::dial_quic`] resolves a path to the remote AS, binds a client
//! endpoint and performs the handshake towards the path's next hop.
//! [`Network::listen_quic`] binds a server endpoint whose
//! [`QuicListener::accept`] yields established sessions.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::{Arc, Weak};

use quinn::crypto::rustls::{QuicClientConfig, QuicServerConfig};
use quinn::{ConnectionError, RecvStream, SendStream, TransportConfig, VarInt};
use sqnet_core::defaults::{DEFAULT_ACCEPT_BACKLOG, SESSION_CLOSE_CODE};
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

use crate::address::{IsdAsn, UdpAddr};
use crate::error::PanError;
use crate::path::{Path, PathSource, StaticPaths};
use crate::selector::{DefaultReplySelector, DefaultSelector, Policy, ReplySelector, Selector};

/// Handle to the path-aware network this host is attached to.
#[derive(Clone)]
pub struct Network {
    source: Arc<dyn PathSource>,
}

impl Network {
    pub fn new(source: impl PathSource + 'static) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    pub fn from_source(source: Arc<dyn PathSource>) -> Self {
        Self { source }
    }

    /// Network reaching only hosts inside `ia`.
    pub fn local(ia: IsdAsn) -> Self {
        Self::new(StaticPaths::new(ia))
    }

    pub fn local_ia(&self) -> IsdAsn {
        self.source.local_ia()
    }

    /// Look up, filter and select a path to `remote`.
    pub fn resolve_path(
        &self,
        remote: &UdpAddr,
        policy: Option<&dyn Policy>,
        selector: &dyn Selector,
    ) -> Result<Path, PanError> {
        let mut paths = self.source.paths(remote.ia());
        if let Some(policy) = policy {
            paths = policy.filter(paths);
        }
        selector
            .select(remote, paths)
            .ok_or(PanError::NoPath(remote.ia()))
    }

    /// Establish a QUIC session with `remote`.
    pub async fn dial_quic(
        &self,
        remote: &UdpAddr,
        options: &DialOptions,
    ) -> Result<QuicSession, PanError> {
        let selector: Arc<dyn Selector> = match &options.selector {
            Some(selector) => selector.clone(),
            None => Arc::new(DefaultSelector::new()),
        };
        let path = self.resolve_path(remote, options.policy.as_deref(), selector.as_ref())?;
        let target = path.next_hop().unwrap_or(remote.socket_addr());

        let bind = options.local.unwrap_or_else(|| unspecified_for(&target));
        let endpoint = quinn::Endpoint::client(bind)?;

        let crypto = QuicClientConfig::try_from(options.tls.as_ref().clone())?;
        let mut client_config = quinn::ClientConfig::new(Arc::new(crypto));
        if let Some(transport) = &options.transport {
            client_config.transport_config(transport.clone());
        }

        let server_name = match options.host.as_deref() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => remote.ip().to_string(),
        };

        debug!(
            remote = %remote,
            next_hop = %target,
            path = %path.fingerprint(),
            server_name = %server_name,
            "dialing QUIC session"
        );
        let connection = endpoint
            .connect_with(client_config, target, &server_name)?
            .await?;

        let local = UdpAddr::new(self.local_ia(), endpoint.local_addr()?);
        debug!(local = %local, remote = %remote, "QUIC session established");
        Ok(QuicSession {
            connection,
            endpoint: Some(endpoint),
            local,
            remote: *remote,
            path,
            reply: None,
        })
    }

    /// Bind a QUIC listener on `addr`.
    ///
    /// Handshakes run in their own tasks, so a slow or failing peer does not
    /// hold up the others. Must be called from within a Tokio runtime.
    pub fn listen_quic(
        &self,
        addr: SocketAddr,
        options: ListenOptions,
    ) -> Result<QuicListener, PanError> {
        let crypto = QuicServerConfig::try_from(options.tls.as_ref().clone())?;
        let mut server_config = quinn::ServerConfig::with_crypto(Arc::new(crypto));
        if let Some(transport) = options.transport {
            server_config.transport_config(transport);
        }

        let endpoint = quinn::Endpoint::server(server_config, addr)?;
        let ia = self.local_ia();
        let local = UdpAddr::new(ia, endpoint.local_addr()?);
        debug!(local = %local, "QUIC listener bound");

        let selector = options
            .selector
            .unwrap_or_else(|| Arc::new(DefaultReplySelector::new()));
        let (tx, rx) = mpsc::channel(DEFAULT_ACCEPT_BACKLOG);
        tokio::spawn(accept_loop(
            endpoint.clone(),
            ia,
            local,
            Arc::downgrade(&selector),
            tx,
        ));

        Ok(QuicListener {
            endpoint,
            local,
            selector,
            sessions: Mutex::new(rx),
        })
    }
}

impl fmt::Debug for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Network")
            .field("local_ia", &self.local_ia())
            .finish_non_exhaustive()
    }
}

/// Drive incoming handshakes until the endpoint closes or the listener is
/// dropped. Failed handshakes are logged and skipped.
async fn accept_loop(
    endpoint: quinn::Endpoint,
    ia: IsdAsn,
    local: UdpAddr,
    selector: Weak<dyn ReplySelector>,
    tx: mpsc::Sender<QuicSession>,
) {
    loop {
        let incoming = tokio::select! {
            _ = tx.closed() => break,
            incoming = endpoint.accept() => match incoming {
                Some(incoming) => incoming,
                None => break,
            },
        };
        let selector = selector.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let peer = incoming.remote_address();
            let connection = match incoming.await {
                Ok(connection) => connection,
                Err(e) => {
                    debug!(local = %local, peer = %peer, error = %e, "QUIC handshake failed");
                    return;
                }
            };

            let remote = UdpAddr::new(ia, connection.remote_address());
            let path = Path::empty(ia);
            if let Some(replies) = selector.upgrade() {
                replies.record(&remote, path.clone());
            }
            debug!(local = %local, remote = %remote, "accepted QUIC session");

            let session = QuicSession {
                connection,
                endpoint: None,
                local,
                remote,
                path,
                reply: Some(selector),
            };
            // A dropped listener drops the session, which closes it.
            let _ = tx.send(session).await;
        });
    }
    debug!(local = %local, "QUIC accept loop stopped");
}

fn unspecified_for(target: &SocketAddr) -> SocketAddr {
    match target {
        SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
        SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
    }
}

/// Parameters for [`Network::dial_quic`].
#[derive(Clone)]
pub struct DialOptions {
    /// Local bind address; an ephemeral port on the unspecified address of
    /// the target's family when `None`.
    pub local: Option<SocketAddr>,
    pub policy: Option<Arc<dyn Policy>>,
    pub selector: Option<Arc<dyn Selector>>,
    /// TLS server name; the remote IP when `None` or empty.
    pub host: Option<String>,
    pub tls: Arc<rustls::ClientConfig>,
    pub transport: Option<Arc<TransportConfig>>,
}

impl DialOptions {
    pub fn new(tls: Arc<rustls::ClientConfig>) -> Self {
        Self {
            local: None,
            policy: None,
            selector: None,
            host: None,
            tls,
            transport: None,
        }
    }
}

/// Parameters for [`Network::listen_quic`].
#[derive(Clone)]
pub struct ListenOptions {
    pub selector: Option<Arc<dyn ReplySelector>>,
    pub tls: Arc<rustls::ServerConfig>,
    pub transport: Option<Arc<TransportConfig>>,
}

impl ListenOptions {
    pub fn new(tls: Arc<rustls::ServerConfig>) -> Self {
        Self {
            selector: None,
            tls,
            transport: None,
        }
    }
}

/// An established QUIC session between two SCION endpoints.
///
/// Dropping an accepted session removes its peer from the listener's
/// [`ReplySelector`].
pub struct QuicSession {
    connection: quinn::Connection,
    /// Client endpoint, kept for dialled sessions only.
    endpoint: Option<quinn::Endpoint>,
    local: UdpAddr,
    remote: UdpAddr,
    path: Path,
    reply: Option<Weak<dyn ReplySelector>>,
}

impl QuicSession {
    /// Open a bidirectional stream. The peer only learns about it once data
    /// is sent on it.
    pub async fn open_stream(&self) -> Result<(SendStream, RecvStream), ConnectionError> {
        self.connection.open_bi().await
    }

    /// Accept the next bidirectional stream opened by the peer.
    pub async fn accept_stream(&self) -> Result<(SendStream, RecvStream), ConnectionError> {
        self.connection.accept_bi().await
    }

    pub fn local_addr(&self) -> UdpAddr {
        self.local
    }

    pub fn remote_addr(&self) -> UdpAddr {
        self.remote
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn connection(&self) -> &quinn::Connection {
        &self.connection
    }

    /// Close the session immediately, abandoning all of its streams.
    pub fn close(&self, code: u32, reason: &[u8]) {
        self.connection.close(VarInt::from_u32(code), reason);
    }

    /// Wait until the session is closed, by either side or by the transport.
    pub async fn closed(&self) -> ConnectionError {
        self.connection.closed().await
    }

    /// Wait for the dialling endpoint to finish closing its sessions.
    /// Returns immediately for accepted sessions.
    pub async fn wait_idle(&self) {
        if let Some(endpoint) = &self.endpoint {
            endpoint.wait_idle().await;
        }
    }
}

impl Drop for QuicSession {
    fn drop(&mut self) {
        if let Some(selector) = self.reply.as_ref().and_then(Weak::upgrade) {
            selector.forget(&self.remote);
        }
    }
}

impl fmt::Debug for QuicSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuicSession")
            .field("local", &self.local)
            .field("remote", &self.remote)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Accepts QUIC sessions on a bound server endpoint.
pub struct QuicListener {
    endpoint: quinn::Endpoint,
    local: UdpAddr,
    selector: Arc<dyn ReplySelector>,
    sessions: Mutex<mpsc::Receiver<QuicSession>>,
}

impl QuicListener {
    /// Wait for the next peer to complete a handshake.
    ///
    /// Only established sessions are returned; the only error is
    /// [`PanError::EndpointClosed`]. Peers reached over the underlay are
    /// placed in the local AS. Cancel safe.
    pub async fn accept(&self) -> Result<QuicSession, PanError> {
        self.sessions
            .lock()
            .await
            .recv()
            .await
            .ok_or(PanError::EndpointClosed)
    }

    pub fn local_addr(&self) -> UdpAddr {
        self.local
    }

    pub fn reply_selector(&self) -> &Arc<dyn ReplySelector> {
        &self.selector
    }

    /// Stop accepting. Pending and future accepts fail with
    /// [`PanError::EndpointClosed`]; established sessions are closed too.
    pub fn close(&self) {
        self.endpoint
            .close(VarInt::from_u32(SESSION_CLOSE_CODE), b"listener closed");
    }
}

impl fmt::Debug for QuicListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuicListener")
            .field("local", &self.local)
            .finish_non_exhaustive()
    }
}
