//! Connection adapter: one QUIC session plus one bidirectional stream.
//!
//! Address queries go to the session, I/O and deadlines to the stream.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use quinn::{ClosedStream, RecvStream, SendStream, VarInt};
use sqnet_core::defaults::STREAM_CLOSE_CODE;
use sqnet_pan::{QuicSession, UdpAddr};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::time::{Instant, Sleep, sleep_until};

/// A bidirectional byte stream over a path-aware QUIC session.
///
/// Implements [`AsyncRead`] and [`AsyncWrite`] by delegating to the stream.
/// Dropping the connection drops the session with it.
#[derive(Debug)]
pub struct Conn {
    session: QuicSession,
    send: SendStream,
    recv: RecvStream,
    read_deadline: Deadline,
    write_deadline: Deadline,
    closed: bool,
}

impl Conn {
    pub(crate) fn new(session: QuicSession, send: SendStream, recv: RecvStream) -> Self {
        Self {
            session,
            send,
            recv,
            read_deadline: Deadline::default(),
            write_deadline: Deadline::default(),
            closed: false,
        }
    }

    pub fn local_addr(&self) -> UdpAddr {
        self.session.local_addr()
    }

    pub fn remote_addr(&self) -> UdpAddr {
        self.session.remote_addr()
    }

    pub fn session(&self) -> &QuicSession {
        &self.session
    }

    /// Set both the read and the write deadline.
    pub fn set_deadline(&mut self, deadline: Option<Instant>) {
        self.set_read_deadline(deadline);
        self.set_write_deadline(deadline);
    }

    /// Reads fail with [`io::ErrorKind::TimedOut`] once `deadline` has
    /// passed. `None` clears the deadline.
    pub fn set_read_deadline(&mut self, deadline: Option<Instant>) {
        self.read_deadline.set(deadline);
    }

    /// Writes fail with [`io::ErrorKind::TimedOut`] once `deadline` has
    /// passed. `None` clears the deadline.
    pub fn set_write_deadline(&mut self, deadline: Option<Instant>) {
        self.write_deadline.set(deadline);
    }

    /// Close the stream. The session stays open.
    ///
    /// Finishes the send half and stops the receive half; afterwards every
    /// read and write fails, even when the close itself reports an error.
    /// Returns [`ClosedStream`] if the send half was already finished, by an
    /// earlier close or by `shutdown`.
    pub fn close(&mut self) -> Result<(), ClosedStream> {
        self.closed = true;
        // The read half is already gone if the peer finished and we drained it.
        let _ = self.recv.stop(VarInt::from_u32(STREAM_CLOSE_CODE));
        self.send.finish()
    }
}

fn stream_closed() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "stream closed")
}

impl AsyncRead for Conn {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.closed {
            return Poll::Ready(Err(stream_closed()));
        }
        if this.read_deadline.poll_expired(cx) {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "read deadline exceeded",
            )));
        }
        AsyncRead::poll_read(Pin::new(&mut this.recv), cx, buf)
    }
}

impl AsyncWrite for Conn {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if this.closed {
            return Poll::Ready(Err(stream_closed()));
        }
        if this.write_deadline.poll_expired(cx) {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "write deadline exceeded",
            )));
        }
        AsyncWrite::poll_write(Pin::new(&mut this.send), cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.closed {
            return Poll::Ready(Err(stream_closed()));
        }
        AsyncWrite::poll_flush(Pin::new(&mut this.send), cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.closed {
            return Poll::Ready(Err(stream_closed()));
        }
        AsyncWrite::poll_shutdown(Pin::new(&mut this.send), cx)
    }
}

/// Optional point in time after which one direction of I/O fails.
#[derive(Debug, Default)]
struct Deadline {
    sleep: Option<Pin<Box<Sleep>>>,
}

impl Deadline {
    fn set(&mut self, at: Option<Instant>) {
        let Some(at) = at else {
            self.sleep = None;
            return;
        };
        if let Some(sleep) = self.sleep.as_mut() {
            sleep.as_mut().reset(at);
        } else {
            self.sleep = Some(Box::pin(sleep_until(at)));
        }
    }

    /// Registers the waker while the deadline is still ahead.
    fn poll_expired(&mut self, cx: &mut Context<'_>) -> bool {
        match self.sleep.as_mut() {
            Some(sleep) => {
                sleep.deadline() <= Instant::now() || sleep.as_mut().poll(cx).is_ready()
            }
            None => false,
        }
    }
}
