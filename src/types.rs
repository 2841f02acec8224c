use futures_util::Stream;
use std::pin::Pin;

use crate::error::FetchError;
use crate::peers::PeerList;

/// State of a peer directory, driven only by its fetch cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FetchState {
    /// Never fetched.
    #[default]
    Idle,
    /// A request is in flight.
    Loading,
    /// Result of the last successful fetch.
    Loaded(PeerList),
    /// The last attempt failed. `previous` holds the last successful list
    /// when the client retains stale lists, otherwise `None`.
    Failed {
        error: FetchError,
        previous: Option<PeerList>,
    },
}

impl FetchState {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }

    /// True once a fetch cycle has reached `Loaded` or `Failed`.
    pub fn is_settled(&self) -> bool {
        matches!(self, FetchState::Loaded(_) | FetchState::Failed { .. })
    }

    pub fn peers(&self) -> Option<&PeerList> {
        match self {
            FetchState::Loaded(peers) => Some(peers),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            FetchState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

pub type GenericBoxedStream<T> = Pin<Box<dyn Stream<Item = T> + Send>>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peers::PeerEntry;

    #[test]
    fn test_only_loaded_exposes_peers() {
        let list: PeerList = [PeerEntry::from("1.2.3.4:9000")].into_iter().collect();
        assert_eq!(FetchState::Loaded(list.clone()).peers(), Some(&list));

        let failed = FetchState::Failed {
            error: FetchError::Timeout,
            previous: Some(list),
        };
        assert_eq!(failed.peers(), None);
        assert_eq!(failed.error(), Some(&FetchError::Timeout));
        assert!(failed.is_settled());
    }

    #[test]
    fn test_loading_is_not_settled() {
        assert!(FetchState::Loading.is_loading());
        assert!(!FetchState::Loading.is_settled());
        assert!(!FetchState::Idle.is_loading());
        assert!(!FetchState::Idle.is_settled());
    }
}
