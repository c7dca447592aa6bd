//! Path-aware networking for sqnet.
//!
//! This crate owns everything the QUIC adapter needs from the network
//! layer:
//!
//! - [`address`]: SCION ISD-AS identifiers and UDP endpoint addresses, and
//!   their textual parser.
//! - [`path`]: forwarding paths and the [`PathSource`] that supplies them.
//! - [`selector`]: path policies and the selectors that pick one path per
//!   dial (and remember reply paths per accepted peer).
//! - [`quic`]: [`Network`], the entry point that dials and listens for QUIC
//!   sessions over a selected path.
//!
//! Packets are carried over the UDP underlay towards the path's next hop;
//! SCION header encapsulation is left to whatever sits at that hop.

pub mod address;
pub mod error;
pub mod path;
pub mod quic;
pub mod selector;

pub use address::{IsdAsn, UdpAddr};
pub use error::{AddressError, PanError};
pub use path::{Path, PathFingerprint, PathSource, StaticPaths};
pub use quic::{DialOptions, ListenOptions, Network, QuicListener, QuicSession};
pub use selector::{
    DefaultReplySelector, DefaultSelector, MaxHops, Policy, ReplySelector, Selector,
};
