//! Default TLS configurations for QUIC.
//!
//! - Server: ephemeral self-signed certificate, fixed ALPN identifier.
//! - Client: skips certificate verification, same ALPN identifier.

use std::sync::Arc;

use rcgen::{CertificateParams, KeyPair, PKCS_ECDSA_P256_SHA256};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use sqnet_core::defaults::{DEFAULT_ALPN, DEFAULT_SERVER_NAME};

use crate::error::TransportError;

/// Server and client TLS configurations negotiating one ALPN identifier.
///
/// Built once and shared; every listener bound with the same value presents
/// the same certificate.
#[derive(Debug, Clone)]
pub struct TlsDefaults {
    server: Arc<rustls::ServerConfig>,
    client: Arc<rustls::ClientConfig>,
}

impl TlsDefaults {
    /// Generate defaults for the `hello-quic` identifier.
    pub fn generate() -> Result<Self, TransportError> {
        Self::with_alpn(DEFAULT_ALPN)
    }

    /// Generate defaults negotiating `alpn` instead.
    pub fn with_alpn(alpn: &str) -> Result<Self, TransportError> {
        let (certs, key) = generate_self_signed()?;
        Ok(Self {
            server: Arc::new(build_server_tls_config(certs, key, alpn)?),
            client: Arc::new(build_insecure_client_tls_config(alpn)?),
        })
    }

    pub fn server(&self) -> Arc<rustls::ServerConfig> {
        self.server.clone()
    }

    pub fn client(&self) -> Arc<rustls::ClientConfig> {
        self.client.clone()
    }
}

fn crypto_provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::aws_lc_rs::default_provider())
}

/// Build a TLS 1.3 server config presenting `certs`.
pub fn build_server_tls_config(
    certs: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
    alpn: &str,
) -> Result<rustls::ServerConfig, TransportError> {
    let mut config = rustls::ServerConfig::builder_with_provider(crypto_provider())
        .with_protocol_versions(&[&rustls::version::TLS13])?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    config.alpn_protocols = vec![alpn.as_bytes().to_vec()];
    Ok(config)
}

/// Build a TLS 1.3 client config that skips certificate verification.
pub fn build_insecure_client_tls_config(alpn: &str) -> Result<rustls::ClientConfig, TransportError> {
    let provider = crypto_provider();
    let mut config = rustls::ClientConfig::builder_with_provider(provider.clone())
        .with_protocol_versions(&[&rustls::version::TLS13])?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(NoVerifier(provider)))
        .with_no_client_auth();
    config.alpn_protocols = vec![alpn.as_bytes().to_vec()];
    Ok(config)
}

/// Generate a self-signed certificate in memory using rcgen.
pub fn generate_self_signed()
-> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>), TransportError> {
    let key_pair = KeyPair::generate_for(&PKCS_ECDSA_P256_SHA256)
        .map_err(|e| TransportError::CertGeneration(e.to_string()))?;

    let params = CertificateParams::new(vec![DEFAULT_SERVER_NAME.to_string()])
        .map_err(|e| TransportError::CertGeneration(e.to_string()))?;
    let cert = params
        .self_signed(&key_pair)
        .map_err(|e| TransportError::CertGeneration(e.to_string()))?;

    let cert_der = CertificateDer::from(cert.der().to_vec());
    let key_der = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));

    Ok((vec![cert_der], key_der))
}

/// Accepts any server certificate but still checks handshake signatures.
#[derive(Debug)]
struct NoVerifier(Arc<CryptoProvider>);

impl rustls::client::danger::ServerCertVerifier for NoVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}
