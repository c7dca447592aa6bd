//! Stream connections over path-aware QUIC.
//!
//! Adapts a QUIC session and one of its streams to a single bidirectional
//! connection, and a session listener to a listener of such connections.
//!
//! - [`conn`]: [`Conn`], the session + stream pair (`AsyncRead`/`AsyncWrite`,
//!   addresses, deadlines).
//! - [`listener`]: [`Listener`], accepting a session and its first stream.
//! - [`facade`]: dial/listen functions supplying default configuration.
//! - [`tls`]: self-signed server and verification-free client TLS defaults.

pub mod conn;
pub mod error;
pub mod facade;
pub mod listener;
pub mod tls;

pub use conn::Conn;
pub use error::TransportError;
pub use facade::{
    Defaults, dial_addr, dial_context_addr, dial_context_string, dial_quic, dial_string,
    listen_ip_port, listen_port, listen_quic, listen_string, parse_listen_addr,
};
pub use listener::Listener;
pub use tls::TlsDefaults;
