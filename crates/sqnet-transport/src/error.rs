//! Error types for the transport crate.

use thiserror::Error;

/// Errors that can occur while dialing, listening or accepting.
///
/// Errors from the wrapped layers are carried unchanged.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error(transparent)]
    Pan(#[from] sqnet_pan::PanError),

    /// Opening or accepting the stream on an established session failed.
    #[error(transparent)]
    Stream(#[from] quinn::ConnectionError),

    #[error(transparent)]
    Address(#[from] sqnet_pan::AddressError),

    #[error(transparent)]
    ListenAddr(#[from] std::net::AddrParseError),

    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    #[error("certificate generation failed: {0}")]
    CertGeneration(String),

    #[error("operation cancelled")]
    Cancelled,
}
