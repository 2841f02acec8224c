use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

/// One remote peer known to the node, usually `address:port`.
///
/// The node gives no guarantees about the format, so the identifier is kept
/// as an opaque string and rendered verbatim.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PeerEntry(String);

impl PeerEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerEntry {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PeerEntry {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Peers returned by a single fetch, in the order the node sent them.
///
/// Duplicates are kept; the list is replaced wholesale on every successful
/// fetch and never merged, sorted or de-duplicated.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct PeerList(Vec<PeerEntry>);

impl PeerList {
    pub fn new(peers: Vec<PeerEntry>) -> Self {
        Self(peers)
    }
}

impl Deref for PeerList {
    type Target = [PeerEntry];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<P: Into<PeerEntry>> FromIterator<P> for PeerList {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
