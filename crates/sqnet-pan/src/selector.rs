//! Path policies and selectors.
//!
//! A dial runs the candidate paths through an optional [`Policy`], hands the
//! result to a [`Selector`] and uses whatever path it picks. Listeners keep
//! a [`ReplySelector`] that remembers the path each peer was reached on.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::address::{IsdAsn, UdpAddr};
use crate::path::{Path, PathFingerprint};

/// Filters and orders candidate paths.
pub trait Policy: Send + Sync {
    fn filter(&self, paths: Vec<Path>) -> Vec<Path>;
}

impl<F> Policy for F
where
    F: Fn(Vec<Path>) -> Vec<Path> + Send + Sync,
{
    fn filter(&self, paths: Vec<Path>) -> Vec<Path> {
        self(paths)
    }
}

/// Keeps only paths with at most this many AS hops.
#[derive(Debug, Clone, Copy)]
pub struct MaxHops(pub usize);

impl Policy for MaxHops {
    fn filter(&self, mut paths: Vec<Path>) -> Vec<Path> {
        paths.retain(|p| p.hop_count() <= self.0);
        paths
    }
}

/// Chooses the path used for a dialled session.
///
/// State is kept per destination AS, so one selector can be shared by
/// concurrent dials to different remotes.
pub trait Selector: Send + Sync {
    /// Replace the candidate set for `remote` and return the path to use,
    /// if any candidate remains.
    fn select(&self, remote: &UdpAddr, paths: Vec<Path>) -> Option<Path>;

    /// Path currently selected towards `remote`.
    fn path(&self, remote: &UdpAddr) -> Option<Path>;

    /// Report a path towards `remote` as unusable.
    fn path_down(&self, remote: &UdpAddr, fingerprint: &PathFingerprint);
}

/// Sticks with the first candidate until it is reported down, then moves on
/// to the next one.
#[derive(Debug, Default)]
pub struct DefaultSelector {
    remotes: Mutex<HashMap<IsdAsn, SelectorState>>,
}

#[derive(Debug, Default)]
struct SelectorState {
    paths: Vec<Path>,
    current: usize,
}

impl SelectorState {
    fn current(&self) -> Option<&Path> {
        self.paths.get(self.current)
    }
}

impl DefaultSelector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Selector for DefaultSelector {
    fn select(&self, remote: &UdpAddr, paths: Vec<Path>) -> Option<Path> {
        let mut remotes = self.remotes.lock();
        if paths.is_empty() {
            remotes.remove(&remote.ia());
            return None;
        }
        let state = remotes.entry(remote.ia()).or_default();
        let current = state.current().map(Path::fingerprint);
        state.current = current
            .and_then(|fp| paths.iter().position(|p| p.fingerprint() == fp))
            .unwrap_or(0);
        state.paths = paths;
        state.current().cloned()
    }

    fn path(&self, remote: &UdpAddr) -> Option<Path> {
        self.remotes
            .lock()
            .get(&remote.ia())
            .and_then(|state| state.current().cloned())
    }

    fn path_down(&self, remote: &UdpAddr, fingerprint: &PathFingerprint) {
        let mut remotes = self.remotes.lock();
        let Some(state) = remotes.get_mut(&remote.ia()) else {
            return;
        };
        if state.current().is_some_and(|p| p.fingerprint() == *fingerprint) {
            state.current = (state.current + 1) % state.paths.len();
        }
    }
}

/// Remembers the path to use when replying to an accepted peer.
pub trait ReplySelector: Send + Sync {
    fn record(&self, remote: &UdpAddr, path: Path);

    fn path(&self, remote: &UdpAddr) -> Option<Path>;

    fn forget(&self, remote: &UdpAddr);
}

/// Replies on the most recently observed path per peer.
#[derive(Debug, Default)]
pub struct DefaultReplySelector {
    remotes: Mutex<HashMap<UdpAddr, Path>>,
}

impl DefaultReplySelector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReplySelector for DefaultReplySelector {
    fn record(&self, remote: &UdpAddr, path: Path) {
        self.remotes.lock().insert(*remote, path);
    }

    fn path(&self, remote: &UdpAddr) -> Option<Path> {
        self.remotes.lock().get(remote).cloned()
    }

    fn forget(&self, remote: &UdpAddr) {
        self.remotes.lock().remove(remote);
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use super::*;

    fn ia(s: &str) -> IsdAsn {
        s.parse().unwrap()
    }

    fn path_via(hops: &[&str]) -> Path {
        let hops: Vec<IsdAsn> = hops.iter().map(|h| ia(h)).collect();
        let next_hop: SocketAddr = "10.0.0.1:30041".parse().unwrap();
        Path::new(hops[0], *hops.last().unwrap(), hops, next_hop, 1400)
    }

    fn remote() -> UdpAddr {
        "1-ff00:0:112,10.0.0.9:443".parse().unwrap()
    }

    #[test]
    fn max_hops_filters_long_paths() {
        let short = path_via(&["1-ff00:0:110", "1-ff00:0:112"]);
        let long = path_via(&["1-ff00:0:110", "1-ff00:0:111", "1-ff00:0:112"]);
        let kept = MaxHops(2).filter(vec![long, short.clone()]);
        assert_eq!(kept, vec![short]);
    }

    #[test]
    fn closure_policy() {
        let reverse = |mut paths: Vec<Path>| {
            paths.reverse();
            paths
        };
        let a = path_via(&["1-ff00:0:110", "1-ff00:0:112"]);
        let b = path_via(&["1-ff00:0:110", "1-ff00:0:111", "1-ff00:0:112"]);
        assert_eq!(reverse.filter(vec![a.clone(), b.clone()]), vec![b, a]);
    }

    #[test]
    fn selector_empty_has_no_path() {
        let selector = DefaultSelector::new();
        assert!(selector.path(&remote()).is_none());
        assert!(selector.select(&remote(), Vec::new()).is_none());
        assert!(selector.path(&remote()).is_none());
    }

    #[test]
    fn selector_fails_over_on_path_down() {
        let a = path_via(&["1-ff00:0:110", "1-ff00:0:112"]);
        let b = path_via(&["1-ff00:0:110", "1-ff00:0:111", "1-ff00:0:112"]);
        let peer = remote();
        let selector = DefaultSelector::new();
        assert_eq!(selector.select(&peer, vec![a.clone(), b.clone()]), Some(a.clone()));

        // Reporting a path that is not current changes nothing.
        selector.path_down(&peer, &b.fingerprint());
        assert_eq!(selector.path(&peer), Some(a.clone()));

        selector.path_down(&peer, &a.fingerprint());
        assert_eq!(selector.path(&peer), Some(b.clone()));

        selector.path_down(&peer, &b.fingerprint());
        assert_eq!(selector.path(&peer), Some(a));
    }

    #[test]
    fn selector_keeps_current_path_across_refresh() {
        let a = path_via(&["1-ff00:0:110", "1-ff00:0:112"]);
        let b = path_via(&["1-ff00:0:110", "1-ff00:0:111", "1-ff00:0:112"]);
        let peer = remote();
        let selector = DefaultSelector::new();
        selector.select(&peer, vec![a.clone(), b.clone()]);
        selector.path_down(&peer, &a.fingerprint());

        assert_eq!(selector.select(&peer, vec![a.clone(), b.clone()]), Some(b));
        assert_eq!(selector.select(&peer, vec![a.clone()]), Some(a));
    }

    #[test]
    fn shared_selector_keeps_remotes_apart() {
        let to_112 = path_via(&["1-ff00:0:110", "1-ff00:0:112"]);
        let to_113 = path_via(&["1-ff00:0:110", "1-ff00:0:113"]);
        let peer_112 = remote();
        let peer_113: UdpAddr = "1-ff00:0:113,10.0.0.7:443".parse().unwrap();
        let selector = DefaultSelector::new();

        let first = selector.select(&peer_112, vec![to_112.clone()]);
        let second = selector.select(&peer_113, vec![to_113.clone()]);
        assert_eq!(first, Some(to_112.clone()));
        assert_eq!(second, Some(to_113.clone()));
        assert_eq!(selector.path(&peer_112), Some(to_112));
        assert_eq!(selector.path(&peer_113), Some(to_113));
    }

    #[test]
    fn concurrent_selects_get_their_own_path() {
        let selector = std::sync::Arc::new(DefaultSelector::new());
        let handles: Vec<_> = (0..8u64)
            .map(|i| {
                let selector = selector.clone();
                std::thread::spawn(move || {
                    let dst = format!("1-ff00:0:{:x}", 0x200 + i);
                    let path = path_via(&["1-ff00:0:110", &dst]);
                    let peer: UdpAddr = format!("{dst},10.0.0.9:443").parse().unwrap();
                    for _ in 0..200 {
                        let got = selector.select(&peer, vec![path.clone()]);
                        assert_eq!(got.as_ref(), Some(&path));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn reply_selector_tracks_latest_path() {
        let selector = DefaultReplySelector::new();
        let peer = remote();
        assert!(selector.path(&peer).is_none());

        let a = path_via(&["1-ff00:0:112", "1-ff00:0:110"]);
        let b = path_via(&["1-ff00:0:112", "1-ff00:0:111", "1-ff00:0:110"]);
        selector.record(&peer, a);
        selector.record(&peer, b.clone());
        assert_eq!(selector.path(&peer), Some(b));

        selector.forget(&peer);
        assert!(selector.path(&peer).is_none());
    }
}
