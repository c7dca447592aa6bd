//! Config file to listener and dialled connection.

use std::io::Write;
use std::time::Duration;

use sqnet_config::{CliOverrides, Config, apply_overrides, load_config, validate_config};
use sqnet_transport::{Defaults, TlsDefaults, dial_string, listen_string};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn defaults_from(config: &Config) -> Defaults {
    let tls = TlsDefaults::with_alpn(&config.transport.alpn).unwrap();
    Defaults::with_tls(config.network.build(), tls)
        .with_transport(config.transport.transport_config().unwrap())
}

#[tokio::test]
async fn configured_alpn_connects() {
    let file = write_config(
        r#"
[network]
local_ia = "1-ff00:0:110"

[transport]
alpn = "config-echo"
max_idle_timeout_secs = 5
"#,
    );
    let mut config = load_config(file.path()).unwrap();
    let overrides = CliOverrides {
        listen: Some("127.0.0.1:0".into()),
        ..CliOverrides::default()
    };
    apply_overrides(&mut config, &overrides);
    validate_config(&config).unwrap();
    let defaults = defaults_from(&config);

    let listener = listen_string(&defaults, &config.server.listen).unwrap();
    let local = listener.local_addr();
    assert_eq!(local.ia().to_string(), "1-ff00:0:110");

    let server = tokio::spawn(async move {
        let mut conn = listener.accept().await.unwrap();
        let mut buf = [0u8; 5];
        conn.read_exact(&mut buf).await.unwrap();
        conn.write_all(&buf).await.unwrap();
        conn.flush().await.unwrap();
        (listener, conn)
    });

    let mut conn = dial_string(&defaults, &local.to_string()).await.unwrap();
    conn.write_all(b"hello").await.unwrap();
    let mut buf = [0u8; 5];
    tokio::time::timeout(Duration::from_secs(5), conn.read_exact(&mut buf))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&buf, b"hello");

    let (_listener, _server_conn) = server.await.unwrap();
    let _ = conn.close();
}

#[test]
fn empty_alpn_in_file_fails_validation() {
    let file = write_config("[transport]\nalpn = \"\"\n");
    let config = load_config(file.path()).unwrap();
    assert!(validate_config(&config).is_err());
}
