//! Keyed in-memory request cache with in-flight deduplication.
//!
//! Every distinct key owns one entry for the lifetime of the cache. The first
//! [`QueryCache::get`] for a ready key spawns its loader; later calls with an
//! equal key only read the entry, so at most one request per key is ever in
//! flight. Entries move `Pending -> Success | Error` exactly once and never
//! expire.

use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, watch};

const EVENT_CAPACITY: usize = 64;

/// A cache key that may not yet be able to form a request.
pub trait CacheKey: Clone + Eq + Hash + Debug + Send + Sync + 'static {
    /// `false` while any path segment of the key is empty or unresolved.
    fn is_ready(&self) -> bool;
}

/// Observable status of one cache entry.
#[derive(Debug, PartialEq)]
pub enum QueryState<V> {
    /// The key is not ready; nothing was or will be requested for it.
    Idle,
    Pending,
    Success(Arc<V>),
    /// Display text of the loader's error.
    Error(String),
}

// Manual impl: `V` itself need not be `Clone` behind the `Arc`.
impl<V> Clone for QueryState<V> {
    fn clone(&self) -> Self {
        match self {
            QueryState::Idle => QueryState::Idle,
            QueryState::Pending => QueryState::Pending,
            QueryState::Success(v) => QueryState::Success(Arc::clone(v)),
            QueryState::Error(e) => QueryState::Error(e.clone()),
        }
    }
}

impl<V> QueryState<V> {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, QueryState::Pending)
    }

    #[must_use]
    pub fn data(&self) -> Option<&Arc<V>> {
        match self {
            QueryState::Success(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            QueryState::Error(e) => Some(e),
            _ => None,
        }
    }
}

struct Shared<K, V> {
    entries: Mutex<HashMap<K, watch::Sender<QueryState<V>>>>,
    events: broadcast::Sender<K>,
}

/// Cheaply cloneable handle to a shared request cache.
pub struct QueryCache<K, V> {
    shared: Arc<Shared<K, V>>,
}

impl<K, V> Clone for QueryCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<K: CacheKey, V: Send + Sync + 'static> Default for QueryCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: CacheKey, V: Send + Sync + 'static> QueryCache<K, V> {
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                entries: Mutex::new(HashMap::new()),
                events,
            }),
        }
    }

    /// Returns the entry for `key`, starting `loader` if the key was never
    /// requested before.
    ///
    /// A key that is not ready yields [`QueryState::Idle`] and `loader` is
    /// dropped uncalled. The loader future runs on the ambient tokio runtime,
    /// so this must be called from within one.
    pub fn get<F, Fut, E>(&self, key: K, loader: F) -> QueryState<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Display,
    {
        if !key.is_ready() {
            return QueryState::Idle;
        }

        {
            let mut entries = self.lock();
            if let Some(entry) = entries.get(&key) {
                return entry.borrow().clone();
            }
            let (tx, _) = watch::channel(QueryState::Pending);
            entries.insert(key.clone(), tx);
        }

        tracing::debug!(?key, "cache miss, starting load");
        let fut = loader();
        let cache = self.clone();
        tokio::spawn(async move {
            let state = match fut.await {
                Ok(value) => QueryState::Success(Arc::new(value)),
                Err(e) => {
                    tracing::warn!(?key, error = %e, "load failed");
                    QueryState::Error(e.to_string())
                }
            };
            cache.complete(key, state);
        });

        QueryState::Pending
    }

    /// Current state of `key` without triggering a load; `None` if never requested.
    #[must_use]
    pub fn peek(&self, key: &K) -> Option<QueryState<V>> {
        self.lock().get(key).map(|entry| entry.borrow().clone())
    }

    /// Waits until the entry for `key` leaves `Pending`.
    ///
    /// Returns `None` if `key` was never requested.
    pub async fn wait(&self, key: &K) -> Option<QueryState<V>> {
        let mut rx = self.lock().get(key)?.subscribe();
        let state = rx.wait_for(|s| !s.is_pending()).await.ok()?;
        Some(state.clone())
    }

    /// Receives the key of every entry that reached a terminal state.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<K> {
        self.shared.events.subscribe()
    }

    /// Number of entries currently held, in any state.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn complete(&self, key: K, state: QueryState<V>) {
        let updated = {
            let entries = self.lock();
            match entries.get(&key) {
                Some(entry) => entry.send_if_modified(|current| {
                    if current.is_pending() {
                        *current = state;
                        true
                    } else {
                        false
                    }
                }),
                None => false,
            }
        };
        if updated {
            // No subscribers is fine; waiters also watch the entry itself.
            let _ = self.shared.events.send(key);
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, watch::Sender<QueryState<V>>>> {
        // The map is never left half-updated, so a poisoned lock is still usable.
        self.shared
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct Key(&'static str);

    impl CacheKey for Key {
        fn is_ready(&self) -> bool {
            !self.0.is_empty()
        }
    }

    fn counting_loader(
        calls: &Arc<AtomicU32>,
        value: u32,
    ) -> impl FnOnce() -> std::future::Ready<Result<u32, String>> {
        let calls = Arc::clone(calls);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(value))
        }
    }

    #[tokio::test]
    async fn identical_keys_share_one_load() {
        let cache: QueryCache<Key, u32> = QueryCache::new();
        let calls = Arc::new(AtomicU32::new(0));

        let first = cache.get(Key("a"), counting_loader(&calls, 1));
        let second = cache.get(Key("a"), counting_loader(&calls, 2));
        assert!(first.is_pending());
        assert!(second.is_pending());

        let state = cache.wait(&Key("a")).await.expect("requested");
        assert_eq!(state.data().map(|v| **v), Some(1));

        let third = cache.get(Key("a"), counting_loader(&calls, 3));
        assert_eq!(third.data().map(|v| **v), Some(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_callers_attach_to_pending_entry() {
        let cache: QueryCache<Key, u32> = QueryCache::new();
        let calls = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for i in 0..8 {
            let cache = cache.clone();
            let loader = counting_loader(&calls, i);
            handles.push(tokio::spawn(async move {
                cache.get(Key("shared"), loader);
                cache.wait(&Key("shared")).await
            }));
        }
        for handle in handles {
            let state = handle.await.expect("join").expect("requested");
            assert!(state.data().is_some());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn unready_key_is_idle_and_never_loads() {
        let cache: QueryCache<Key, u32> = QueryCache::new();
        let calls = Arc::new(AtomicU32::new(0));

        let state = cache.get(Key(""), counting_loader(&calls, 1));

        assert_eq!(state, QueryState::Idle);
        assert!(cache.peek(&Key("")).is_none());
        assert!(cache.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_load_keeps_message_and_is_not_retried() {
        let cache: QueryCache<Key, u32> = QueryCache::new();
        let calls = Arc::new(AtomicU32::new(0));

        let c = Arc::clone(&calls);
        cache.get(Key("boom"), move || {
            c.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Err::<u32, _>("upstream returned 500"))
        });
        let state = cache.wait(&Key("boom")).await.expect("requested");
        assert_eq!(state.error(), Some("upstream returned 500"));

        let again = cache.get(Key("boom"), counting_loader(&calls, 7));
        assert_eq!(again.error(), Some("upstream returned 500"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn subscribers_hear_terminal_transitions() {
        let cache: QueryCache<Key, u32> = QueryCache::new();
        let mut events = cache.subscribe();
        let calls = Arc::new(AtomicU32::new(0));

        cache.get(Key("a"), counting_loader(&calls, 1));
        let key = events.recv().await.expect("event");

        assert_eq!(key, Key("a"));
        assert!(cache.peek(&key).is_some_and(|s| s.data().is_some()));
    }

    #[tokio::test]
    async fn wait_on_unknown_key_is_none() {
        let cache: QueryCache<Key, u32> = QueryCache::new();
        assert!(cache.wait(&Key("never")).await.is_none());
    }
}
