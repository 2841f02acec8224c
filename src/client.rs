//! Peer directory client.
//!
//! Owns the fetch cycle against a [`NodeApi`]: at most one request is in
//! flight per client, every transition is published to subscribers in the
//! order it happened, and a response that arrives after teardown is dropped
//! without touching state.
//!
//! ```text
//! Idle -> Loading -> Loaded | Failed -> Loading -> ...
//! ```

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::time;
use tracing::{debug, info, trace, warn};

use crate::config::{ClientConfig, StalePolicy};
use crate::error::{ClientError, FetchError};
use crate::node_api::{HttpNodeApi, NodeApi};
use crate::peers::PeerList;
use crate::shutdown::select_or_shutdown;
use crate::types::FetchState;

type Callback = Arc<dyn Fn(&FetchState) + Send + Sync>;

/// Handle to a peer directory. Clones share the same directory; dropping the
/// last handle tears it down.
#[derive(Clone)]
pub struct PeerDirectoryClient {
    inner: Arc<Inner>,
}

struct Inner {
    api: Arc<dyn NodeApi>,
    config: ClientConfig,
    runtime: Handle,
    shared: Mutex<Shared>,
    shutdown: Arc<Notify>,
}

#[derive(Default)]
struct Shared {
    state: FetchState,
    last_peers: Option<PeerList>,
    last_updated: Option<DateTime<Utc>>,
    next_request_id: u64,
    in_flight: Option<u64>,
    requests_issued: u64,
    subscribers: Vec<(u64, Callback)>,
    next_subscriber_id: u64,
    // Transitions committed but not yet delivered, oldest first
    pending: VecDeque<FetchState>,
    dispatching: bool,
    torn_down: bool,
}

impl Shared {
    fn callbacks(&self) -> Vec<Callback> {
        self.subscribers.iter().map(|(_, cb)| cb.clone()).collect()
    }

    fn transition(&mut self, state: FetchState) {
        self.pending.push_back(state.clone());
        self.state = state;
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.shutdown.notify_one();
    }
}

/// Registration returned by [`PeerDirectoryClient::subscribe`].
///
/// Dropping it does not unsubscribe; call [`Subscription::unsubscribe`].
pub struct Subscription {
    inner: Weak<Inner>,
    id: u64,
}

impl Subscription {
    /// Remove the callback. Safe to call repeatedly and after teardown.
    pub fn unsubscribe(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.lock().subscribers.retain(|(id, _)| *id != self.id);
        }
    }
}

impl PeerDirectoryClient {
    /// Create an idle client. Must be called from within a Tokio runtime,
    /// which will drive the fetches.
    pub fn new(api: Arc<dyn NodeApi>, config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| ClientError::NoRuntime)?;
        Ok(Self {
            inner: Arc::new(Inner {
                api,
                config,
                runtime,
                shared: Mutex::new(Shared::default()),
                shutdown: Arc::new(Notify::new()),
            }),
        })
    }

    /// Create an idle client fetching from `config.base_url` over HTTP.
    pub fn http(config: ClientConfig) -> Result<Self, ClientError> {
        let api = HttpNodeApi::new(&config)?;
        Self::new(Arc::new(api), config)
    }

    /// Start the first fetch cycle.
    pub fn mount(&self) {
        debug!("mounting peer directory for {}", self.inner.config.base_url);
        self.refresh();
    }

    /// Request a new fetch. No-op while a fetch is in flight or after
    /// teardown; never blocks.
    pub fn refresh(&self) {
        let inner = &self.inner;

        let request_id = {
            let mut shared = inner.lock();
            if shared.torn_down {
                trace!("refresh after teardown ignored");
                return;
            }
            if let Some(request_id) = shared.in_flight {
                trace!(request_id, "refresh ignored, fetch already in flight");
                return;
            }

            let request_id = shared.next_request_id;
            shared.next_request_id += 1;
            shared.in_flight = Some(request_id);
            shared.requests_issued += 1;
            shared.transition(FetchState::Loading);
            request_id
        };

        // Spawned before delivery so a committed Loading always has its fetch.
        debug!(request_id, "fetching active peers from {}", inner.config.base_url);
        let request = inner.api.active_peers();
        let timeout = inner.config.timeout;
        let shutdown = inner.shutdown.clone();
        let weak = Arc::downgrade(inner);

        inner.runtime.spawn(async move {
            let outcome = match select_or_shutdown(time::timeout(timeout, request), shutdown).await {
                Ok(Ok(result)) => result,
                Ok(Err(_elapsed)) => Err(FetchError::Timeout),
                Err(()) => {
                    debug!(request_id, "peer fetch cancelled by teardown");
                    return;
                }
            };

            match weak.upgrade() {
                Some(inner) => complete(&inner, request_id, outcome),
                None => debug!(request_id, "peer directory dropped, discarding response"),
            }
        });

        deliver(inner);
    }

    /// Latest known state.
    pub fn current_state(&self) -> FetchState {
        self.inner.lock().state.clone()
    }

    /// Time of the last successful fetch.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().last_updated
    }

    /// Number of requests sent to the node so far.
    pub fn requests_issued(&self) -> u64 {
        self.inner.lock().requests_issued
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Register `callback` to run on every state transition. The callback
    /// runs with no internal lock held and may call back into the client;
    /// a transition it causes is delivered once the current one has reached
    /// every subscriber.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&FetchState) + Send + Sync + 'static,
    {
        let mut shared = self.inner.lock();
        let id = shared.next_subscriber_id;
        shared.next_subscriber_id += 1;
        if !shared.torn_down {
            shared.subscribers.push((id, Arc::new(callback)));
        }
        Subscription {
            inner: Arc::downgrade(&self.inner),
            id,
        }
    }

    /// Cancel any in-flight fetch and release all subscribers. The state is
    /// left as it was; later refreshes are ignored.
    pub fn teardown(&self) {
        {
            let mut shared = self.inner.lock();
            if shared.torn_down {
                return;
            }
            shared.torn_down = true;
            if let Some(request_id) = shared.in_flight.take() {
                debug!(request_id, "cancelling in-flight peer fetch");
            }
            shared.subscribers.clear();
            shared.pending.clear();
        }
        self.inner.shutdown.notify_one();
        debug!("peer directory torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.lock().torn_down
    }
}

fn complete(inner: &Inner, request_id: u64, outcome: Result<PeerList, FetchError>) {
    {
        let mut shared = inner.lock();
        if shared.torn_down || shared.in_flight != Some(request_id) {
            debug!(request_id, "discarding stale peer list response");
            return;
        }
        shared.in_flight = None;

        let state = match outcome {
            Ok(peers) => {
                info!(request_id, "loaded {} active peers", peers.len());
                shared.last_updated = Some(Utc::now());
                shared.last_peers = Some(peers.clone());
                FetchState::Loaded(peers)
            }
            Err(error) => {
                warn!(request_id, "peer list fetch failed: {}", error);
                let previous = match inner.config.stale_policy {
                    StalePolicy::Retain => shared.last_peers.clone(),
                    StalePolicy::Discard => None,
                };
                FetchState::Failed { error, previous }
            }
        };
        shared.transition(state);
    }

    deliver(inner);
}

/// Hand queued transitions to subscribers, oldest first.
///
/// One caller drains at a time. A caller that finds delivery already under
/// way (a callback calling `refresh()`, or a second thread) only leaves its
/// transition queued, so every subscriber sees the same sequence and its last
/// notification is the current state.
fn deliver(inner: &Inner) {
    {
        let mut shared = inner.lock();
        if shared.dispatching {
            return;
        }
        shared.dispatching = true;
    }
    let _guard = Dispatching(inner);

    loop {
        let (state, callbacks) = {
            let mut shared = inner.lock();
            match shared.pending.pop_front() {
                Some(state) => (state, shared.callbacks()),
                None => {
                    // Released under the same lock that saw the queue empty,
                    // so no transition can be left behind.
                    shared.dispatching = false;
                    return;
                }
            }
        };

        for callback in &callbacks {
            callback(&state);
        }
    }
}

/// Releases the delivery slot if a callback panics, leaving undelivered
/// transitions for the next caller.
struct Dispatching<'a>(&'a Inner);

impl Drop for Dispatching<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.lock().dispatching = false;
        }
    }
}
