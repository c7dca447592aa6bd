//! Forwarding paths and path sources.

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;

use sqnet_core::defaults::DEFAULT_PATH_MTU;

use crate::address::IsdAsn;

/// A forwarding path from the local AS to a destination AS.
///
/// The empty path (no hops) reaches hosts inside the local AS and has no
/// next hop: packets go straight to the destination host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    source: IsdAsn,
    destination: IsdAsn,
    hops: Vec<IsdAsn>,
    next_hop: Option<SocketAddr>,
    mtu: u16,
}

impl Path {
    /// Intra-AS path within `ia`.
    pub fn empty(ia: IsdAsn) -> Self {
        Self {
            source: ia,
            destination: ia,
            hops: Vec::new(),
            next_hop: None,
            mtu: DEFAULT_PATH_MTU,
        }
    }

    /// Inter-AS path traversing `hops`, handed to `next_hop` on the underlay.
    pub fn new(
        source: IsdAsn,
        destination: IsdAsn,
        hops: Vec<IsdAsn>,
        next_hop: SocketAddr,
        mtu: u16,
    ) -> Self {
        Self {
            source,
            destination,
            hops,
            next_hop: Some(next_hop),
            mtu,
        }
    }

    pub fn source(&self) -> IsdAsn {
        self.source
    }

    pub fn destination(&self) -> IsdAsn {
        self.destination
    }

    pub fn hops(&self) -> &[IsdAsn] {
        &self.hops
    }

    pub fn hop_count(&self) -> usize {
        self.hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    /// Underlay address the first packet is handed to, `None` for the
    /// empty path.
    pub fn next_hop(&self) -> Option<SocketAddr> {
        self.next_hop
    }

    pub fn mtu(&self) -> u16 {
        self.mtu
    }

    /// Identifies the path by the sequence of ASes it traverses.
    pub fn fingerprint(&self) -> PathFingerprint {
        PathFingerprint {
            source: self.source,
            destination: self.destination,
            hops: self.hops.clone(),
        }
    }
}

/// Identity of a path, independent of its underlay next hop and MTU.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathFingerprint {
    source: IsdAsn,
    destination: IsdAsn,
    hops: Vec<IsdAsn>,
}

impl fmt::Display for PathFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hops.is_empty() {
            return write!(f, "{} (local)", self.source);
        }
        for (i, hop) in self.hops.iter().enumerate() {
            if i > 0 {
                f.write_str(">")?;
            }
            write!(f, "{hop}")?;
        }
        Ok(())
    }
}

/// Supplies the local AS and the known paths towards other ASes.
pub trait PathSource: Send + Sync {
    /// AS this host lives in.
    fn local_ia(&self) -> IsdAsn;

    /// Candidate paths to `destination`, best first.
    fn paths(&self, destination: IsdAsn) -> Vec<Path>;
}

/// Path source backed by a fixed table.
///
/// Destinations inside the local AS always get the empty path. A wildcard
/// local AS treats every destination as local.
#[derive(Debug, Clone)]
pub struct StaticPaths {
    local_ia: IsdAsn,
    table: HashMap<IsdAsn, Vec<Path>>,
}

impl StaticPaths {
    pub fn new(local_ia: IsdAsn) -> Self {
        Self {
            local_ia,
            table: HashMap::new(),
        }
    }

    /// Builder-style variant of [`StaticPaths::insert`].
    pub fn with_path(mut self, path: Path) -> Self {
        self.insert(path);
        self
    }

    /// Add a path, keyed by its destination AS.
    pub fn insert(&mut self, path: Path) {
        self.table.entry(path.destination()).or_default().push(path);
    }

    fn is_local(&self, destination: IsdAsn) -> bool {
        self.local_ia.is_wildcard() || destination.is_wildcard() || destination == self.local_ia
    }
}

impl PathSource for StaticPaths {
    fn local_ia(&self) -> IsdAsn {
        self.local_ia
    }

    fn paths(&self, destination: IsdAsn) -> Vec<Path> {
        if self.is_local(destination) {
            return vec![Path::empty(self.local_ia)];
        }
        self.table.get(&destination).cloned().unwrap_or_default()
    }
}
