//! Default configuration values.
//!
//! Centralized default constants for use across all crates.

use std::net::{IpAddr, Ipv4Addr};

// ============================================================================
// Handshake Defaults
// ============================================================================

/// Protocol identifier negotiated via ALPN by the default TLS configs.
pub const DEFAULT_ALPN: &str = "hello-quic";
/// Server name sent by dialers that were not given a host and whose remote
/// has no meaningful IP literal form.
pub const DEFAULT_SERVER_NAME: &str = "localhost";

// ============================================================================
// Address Defaults
// ============================================================================

/// Host used by listeners bound by port only.
pub const DEFAULT_LISTEN_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
/// Host prefixed to bare `:port` listen strings.
pub const DEFAULT_LISTEN_HOST_LITERAL: &str = "0.0.0.0";
/// Host the CLI listens on when no address is configured.
pub const DEFAULT_CLI_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
/// Port the CLI listens on when no address is configured.
pub const DEFAULT_CLI_PORT: u16 = 4433;
/// Local ISD-AS when none is configured (wildcard).
pub const DEFAULT_LOCAL_IA: &str = "0-0";

// ============================================================================
// QUIC Transport Defaults
// ============================================================================

/// Default max idle timeout in seconds.
pub const DEFAULT_MAX_IDLE_TIMEOUT_SECS: u64 = 30;
/// Default keep-alive interval in seconds (0 = disabled).
pub const DEFAULT_KEEP_ALIVE_SECS: u64 = 0;
/// Default path MTU assumed for paths without an explicit value.
pub const DEFAULT_PATH_MTU: u16 = 1472;

// ============================================================================
// Close Codes
// ============================================================================

/// Application error code used when stopping the receive half on close.
pub const STREAM_CLOSE_CODE: u32 = 0;
/// Application error code for an orderly session close.
pub const SESSION_CLOSE_CODE: u32 = 0;
/// Application error code used when a half-established session is torn down.
pub const SESSION_ABORT_CODE: u32 = 1;

// ============================================================================
// Buffers
// ============================================================================

/// Established sessions queued on a listener before handshakes wait.
pub const DEFAULT_ACCEPT_BACKLOG: usize = 64;
/// Relay buffer size used by the CLI copy loops.
pub const DEFAULT_COPY_BUFFER_SIZE: usize = 16 * 1024;
