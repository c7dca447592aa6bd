//! Listener adapter yielding one [`Conn`] per accepted session.

use std::sync::Arc;

use sqnet_core::defaults::SESSION_ABORT_CODE;
use sqnet_pan::{QuicListener, ReplySelector, UdpAddr};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::conn::Conn;
use crate::error::TransportError;

/// Accepts path-aware QUIC sessions and pairs each with its first stream.
#[derive(Debug)]
pub struct Listener {
    inner: QuicListener,
}

impl Listener {
    pub(crate) fn new(inner: QuicListener) -> Self {
        Self { inner }
    }

    /// Accept the next session and the first stream its peer opens.
    ///
    /// A session whose first stream cannot be accepted is closed and the
    /// stream error returned.
    pub async fn accept(&self) -> Result<Conn, TransportError> {
        self.accept_with(&CancellationToken::new()).await
    }

    /// [`Listener::accept`], aborted when `cancel` fires.
    ///
    /// A session accepted before cancellation is closed while its first
    /// stream is awaited.
    pub async fn accept_with(&self, cancel: &CancellationToken) -> Result<Conn, TransportError> {
        let session = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            result = self.inner.accept() => result?,
        };

        let accepted = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = session.accept_stream() => Some(result),
        };

        match accepted {
            Some(Ok((send, recv))) => {
                debug!(remote = %session.remote_addr(), "accepted connection");
                Ok(Conn::new(session, send, recv))
            }
            Some(Err(e)) => {
                debug!(remote = %session.remote_addr(), error = %e, "no stream on accepted session");
                session.close(SESSION_ABORT_CODE, b"stream accept failed");
                Err(e.into())
            }
            None => {
                session.close(SESSION_ABORT_CODE, b"cancelled");
                Err(TransportError::Cancelled)
            }
        }
    }

    pub fn local_addr(&self) -> UdpAddr {
        self.inner.local_addr()
    }

    pub fn reply_selector(&self) -> &Arc<dyn ReplySelector> {
        self.inner.reply_selector()
    }

    /// Stop accepting. Pending accepts fail.
    pub fn close(&self) {
        self.inner.close();
    }
}
