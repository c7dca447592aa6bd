//! `sqnet listen` and `sqnet dial` subcommands.

use std::path::PathBuf;

use clap::Parser;
use sqnet_config::{
    CliOverrides, Config, apply_overrides, init_tracing, load_config, validate_config,
};
use sqnet_core::defaults::{DEFAULT_COPY_BUFFER_SIZE, SESSION_CLOSE_CODE};
use sqnet_pan::PanError;
use sqnet_transport::{Conn, Defaults, TlsDefaults, TransportError, dial_context_string, listen_string};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Arguments for the echo server.
#[derive(Parser, Debug, Clone)]
pub struct ListenArgs {
    /// Config file path (json/jsonc/toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: CliOverrides,
}

/// Arguments for the stdin/stdout client.
#[derive(Parser, Debug, Clone)]
pub struct DialArgs {
    /// Remote SCION UDP address, e.g. 1-ff00:0:111,[10.0.0.9]:4433
    pub remote: String,

    /// Config file path (json/jsonc/toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: CliOverrides,
}

/// Load the config file (or defaults), apply overrides and validate.
fn prepare_config(
    path: Option<&PathBuf>,
    overrides: &CliOverrides,
) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    apply_overrides(&mut config, overrides);
    validate_config(&config)?;
    Ok(config)
}

/// Dial/listen defaults for `config`, with a fresh self-signed identity.
fn build_defaults(config: &Config) -> Result<Defaults, Box<dyn std::error::Error>> {
    let tls = TlsDefaults::with_alpn(&config.transport.alpn)?;
    Ok(Defaults::with_tls(config.network.build(), tls)
        .with_transport(config.transport.transport_config()?))
}

/// Run an echo server until SIGINT/SIGTERM.
pub async fn run_listen(args: ListenArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = prepare_config(args.config.as_ref(), &args.overrides)?;
    init_tracing(&config.logging);

    let defaults = build_defaults(&config)?;
    let listener = listen_string(&defaults, &config.server.listen)?;
    info!(
        local = %listener.local_addr(),
        "{} {} listening",
        sqnet_core::PROJECT_NAME,
        sqnet_core::VERSION
    );

    let shutdown = CancellationToken::new();
    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal_handler().await;
        info!("shutdown signal received");
        shutdown_signal.cancel();
    });

    loop {
        let conn = match listener.accept_with(&shutdown).await {
            Ok(conn) => conn,
            Err(TransportError::Cancelled) => break,
            Err(TransportError::Pan(PanError::EndpointClosed)) => break,
            Err(e) => {
                warn!(error = %e, "accept failed");
                continue;
            }
        };
        tokio::spawn(echo(conn));
    }

    listener.close();
    info!("listener closed");
    Ok(())
}

/// Echo everything read back to the peer, then wait for it to hang up.
async fn echo(conn: Conn) {
    let remote = conn.remote_addr();
    let (reader, mut writer) = tokio::io::split(conn);
    let mut reader = BufReader::with_capacity(DEFAULT_COPY_BUFFER_SIZE, reader);
    match tokio::io::copy_buf(&mut reader, &mut writer).await {
        Ok(n) => debug!(remote = %remote, bytes = n, "echo finished"),
        Err(e) => debug!(remote = %remote, error = %e, "echo failed"),
    }
    if let Err(e) = writer.shutdown().await {
        debug!(remote = %remote, error = %e, "finish failed");
    }
    let conn = reader.into_inner().unsplit(writer);
    // The peer closes the session once it has read the echo.
    let reason = conn.session().closed().await;
    debug!(remote = %remote, reason = %reason, "session closed");
}

/// Connect stdin and stdout to a remote stream.
pub async fn run_dial(args: DialArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = prepare_config(args.config.as_ref(), &args.overrides)?;
    init_tracing(&config.logging);

    let defaults = build_defaults(&config)?;
    let cancel = CancellationToken::new();
    let cancel_signal = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal_handler().await;
        cancel_signal.cancel();
    });

    let conn = dial_context_string(&defaults, &cancel, &args.remote).await?;
    info!(
        local = %conn.local_addr(),
        remote = %conn.remote_addr(),
        path = %conn.session().path().fingerprint(),
        "connected"
    );
    let (mut reader, mut writer) = tokio::io::split(conn);
    let upload = async {
        let mut stdin = BufReader::with_capacity(DEFAULT_COPY_BUFFER_SIZE, tokio::io::stdin());
        let sent = tokio::io::copy_buf(&mut stdin, &mut writer).await?;
        writer.shutdown().await?;
        Ok::<_, std::io::Error>(sent)
    };
    let download = async {
        let mut stdout = tokio::io::stdout();
        let received = tokio::io::copy(&mut reader, &mut stdout).await?;
        stdout.flush().await?;
        Ok::<_, std::io::Error>(received)
    };

    let result: Result<(u64, u64), Box<dyn std::error::Error>> = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(TransportError::Cancelled.into()),
        result = async { tokio::try_join!(upload, download) } => result.map_err(Into::into),
    };

    let conn = reader.unsplit(writer);
    conn.session().close(SESSION_CLOSE_CODE, b"done");
    conn.session().wait_idle().await;
    let (sent, received) = result?;
    debug!(sent, received, "dial finished");
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT).
async fn shutdown_signal_handler() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
