#![allow(clippy::tests_outside_test_module)]
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rcgen::{CertifiedKey, generate_simple_self_signed};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use sqnet_pan::{
    DialOptions, IsdAsn, ListenOptions, MaxHops, Network, PanError, Path, StaticPaths, UdpAddr,
};

const ALPN: &[u8] = b"pan-test";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_test_writer()
        .try_init();
}

fn provider() -> Arc<rustls::crypto::CryptoProvider> {
    Arc::new(rustls::crypto::aws_lc_rs::default_provider())
}

/// Server config with a fresh certificate for "localhost", plus a client
/// config trusting exactly that certificate.
fn tls_pair() -> (Arc<rustls::ServerConfig>, Arc<rustls::ClientConfig>) {
    let CertifiedKey { cert, key_pair } =
        generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let cert_der: CertificateDer<'static> = cert.der().clone();
    let key_der = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));

    let mut server = rustls::ServerConfig::builder_with_provider(provider())
        .with_protocol_versions(&[&rustls::version::TLS13])
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(vec![cert_der.clone()], key_der)
        .unwrap();
    server.alpn_protocols = vec![ALPN.to_vec()];

    let mut roots = rustls::RootCertStore::empty();
    roots.add(cert_der).unwrap();
    let mut client = rustls::ClientConfig::builder_with_provider(provider())
        .with_protocol_versions(&[&rustls::version::TLS13])
        .unwrap()
        .with_root_certificates(roots)
        .with_no_client_auth();
    client.alpn_protocols = vec![ALPN.to_vec()];

    (Arc::new(server), Arc::new(client))
}

fn local_ia() -> IsdAsn {
    "1-ff00:0:110".parse().unwrap()
}

#[tokio::test]
async fn dial_and_accept_session() {
    init_tracing();
    let network = Network::local(local_ia());
    let (server_tls, client_tls) = tls_pair();

    let listener = network
        .listen_quic("127.0.0.1:0".parse().unwrap(), ListenOptions::new(server_tls))
        .unwrap();
    let listen_addr = listener.local_addr();
    assert_eq!(listen_addr.ia(), local_ia());

    let server = tokio::spawn(async move {
        let session = listener.accept().await.unwrap();
        let (mut send, mut recv) = session.accept_stream().await.unwrap();
        let data = recv.read_to_end(1024).await.unwrap();
        send.write_all(&data).await.unwrap();
        send.finish().unwrap();
        let replied = listener.reply_selector().path(&session.remote_addr());
        // Keep the session alive until the client hangs up.
        session.closed().await;
        replied
    });

    let mut options = DialOptions::new(client_tls);
    options.host = Some("localhost".into());
    let session = network.dial_quic(&listen_addr, &options).await.unwrap();
    assert_eq!(session.remote_addr(), listen_addr);
    assert_eq!(session.local_addr().ia(), local_ia());
    assert!(session.path().is_empty());

    let (mut send, mut recv) = session.open_stream().await.unwrap();
    send.write_all(b"hello over scion").await.unwrap();
    send.finish().unwrap();
    let echoed = recv.read_to_end(1024).await.unwrap();
    assert_eq!(echoed, b"hello over scion");

    session.close(0, b"done");
    let replied = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(replied, Some(Path::empty(local_ia())));
}

#[tokio::test]
async fn dial_without_path_fails_before_handshake() {
    let network = Network::local(local_ia());
    let (_, client_tls) = tls_pair();
    let remote: UdpAddr = "2-ff00:0:220,127.0.0.1:9".parse().unwrap();

    let err = network
        .dial_quic(&remote, &DialOptions::new(client_tls))
        .await
        .unwrap_err();
    match err {
        PanError::NoPath(ia) => assert_eq!(ia, remote.ia()),
        other => panic!("expected NoPath, got {other:?}"),
    }
}

#[tokio::test]
async fn policy_can_exclude_every_path() {
    let local = local_ia();
    let remote_ia: IsdAsn = "1-ff00:0:111".parse().unwrap();
    let next_hop: SocketAddr = "127.0.0.1:9".parse().unwrap();
    let network = Network::new(StaticPaths::new(local).with_path(Path::new(
        local,
        remote_ia,
        vec![local, remote_ia],
        next_hop,
        1400,
    )));
    let (_, client_tls) = tls_pair();

    let remote = UdpAddr::new(remote_ia, "10.0.0.5:443".parse().unwrap());
    let mut options = DialOptions::new(client_tls);
    options.policy = Some(Arc::new(MaxHops(1)));

    let err = network.dial_quic(&remote, &options).await.unwrap_err();
    assert!(matches!(err, PanError::NoPath(_)));
}

#[tokio::test]
async fn closed_listener_rejects_accept() {
    let network = Network::local(local_ia());
    let (server_tls, _) = tls_pair();
    let listener = network
        .listen_quic("127.0.0.1:0".parse().unwrap(), ListenOptions::new(server_tls))
        .unwrap();

    listener.close();
    let err = tokio::time::timeout(Duration::from_secs(5), listener.accept())
        .await
        .unwrap()
        .unwrap_err();
    assert!(matches!(err, PanError::EndpointClosed));
}

#[tokio::test]
async fn released_sessions_leave_reply_selector() {
    init_tracing();
    let network = Network::local(local_ia());
    let (server_tls, client_tls) = tls_pair();
    let listener = network
        .listen_quic("127.0.0.1:0".parse().unwrap(), ListenOptions::new(server_tls))
        .unwrap();
    let listen_addr = listener.local_addr();
    let mut options = DialOptions::new(client_tls);
    options.host = Some("localhost".into());

    for _ in 0..5 {
        let client = network.dial_quic(&listen_addr, &options).await.unwrap();
        let accepted = tokio::time::timeout(Duration::from_secs(5), listener.accept())
            .await
            .unwrap()
            .unwrap();
        let remote = accepted.remote_addr();
        assert!(listener.reply_selector().path(&remote).is_some());

        drop(accepted);
        assert!(listener.reply_selector().path(&remote).is_none());
        client.close(0, b"done");
    }
}

#[tokio::test]
async fn failed_handshake_is_skipped_by_accept() {
    init_tracing();
    let network = Network::local(local_ia());
    let (server_tls, client_tls) = tls_pair();
    let listener = network
        .listen_quic("127.0.0.1:0".parse().unwrap(), ListenOptions::new(server_tls))
        .unwrap();
    let listen_addr = listener.local_addr();

    let mut wrong_alpn = client_tls.as_ref().clone();
    wrong_alpn.alpn_protocols = vec![b"other".to_vec()];
    let mut bad = DialOptions::new(Arc::new(wrong_alpn));
    bad.host = Some("localhost".into());
    assert!(network.dial_quic(&listen_addr, &bad).await.is_err());

    let mut good = DialOptions::new(client_tls);
    good.host = Some("localhost".into());
    let client = network.dial_quic(&listen_addr, &good).await.unwrap();

    let accepted = tokio::time::timeout(Duration::from_secs(5), listener.accept())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(accepted.remote_addr().port(), client.local_addr().port());
    client.close(0, b"done");
}
