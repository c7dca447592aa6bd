//! Error types for the path-aware networking layer.

use quinn::crypto::rustls::NoInitialCipherSuite;
use thiserror::Error;

use crate::address::IsdAsn;

/// Errors produced while parsing SCION addresses.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid ISD-AS: {0}")]
    InvalidIsdAsn(String),

    #[error("invalid SCION UDP address: {0}")]
    InvalidUdpAddr(String),
}

/// Errors that can occur while establishing path-aware QUIC sessions.
#[derive(Error, Debug)]
pub enum PanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Connect(#[from] quinn::ConnectError),

    #[error(transparent)]
    Connection(#[from] quinn::ConnectionError),

    #[error("TLS config error: {0}")]
    Tls(#[from] NoInitialCipherSuite),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error("no path to {0}")]
    NoPath(IsdAsn),

    #[error("endpoint closed")]
    EndpointClosed,
}
