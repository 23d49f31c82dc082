//! Session registry
//!
//! Maps opaque session ids to the vector store built for one upload. The
//! registry is bounded: past `max_sessions` the least recently used session
//! is evicted, and sessions idle longer than the configured TTL are dropped
//! on access or by the background sweeper.

use crate::utils::toml_config::SessionsConfig;
use lru::LruCache;
use parking_lot::Mutex;
use pdfchat_vector::VectorStore;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const DEFAULT_MAX_SESSIONS: NonZeroUsize = match NonZeroUsize::new(256) {
    Some(n) => n,
    None => unreachable!(),
};

struct SessionEntry {
    store: Arc<VectorStore>,
    created_at: Instant,
    last_access: Instant,
}

impl SessionEntry {
    fn is_expired(&self, ttl: Option<Duration>, now: Instant) -> bool {
        ttl.is_some_and(|ttl| now.duration_since(self.last_access) > ttl)
    }
}

pub struct SessionRegistry {
    sessions: Mutex<LruCache<String, SessionEntry>>,
    idle_ttl: Option<Duration>,
}

impl SessionRegistry {
    pub fn new(max_sessions: NonZeroUsize, idle_ttl: Option<Duration>) -> Self {
        Self {
            sessions: Mutex::new(LruCache::new(max_sessions)),
            idle_ttl,
        }
    }

    pub fn from_config(config: &SessionsConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_sessions).unwrap_or(DEFAULT_MAX_SESSIONS);
        Self::new(capacity, config.idle_ttl())
    }

    /// Register a fully built store under a fresh session id.
    pub fn insert(&self, store: VectorStore) -> String {
        let session_id = uuid::Uuid::new_v4().to_string();
        let now = Instant::now();
        let entry = SessionEntry {
            store: Arc::new(store),
            created_at: now,
            last_access: now,
        };

        let evicted = self.sessions.lock().push(session_id.clone(), entry);
        if let Some((old_id, old)) = evicted {
            warn!(
                session_id = %old_id,
                age_secs = old.created_at.elapsed().as_secs(),
                "Session registry full, evicted least recently used session"
            );
        }

        session_id
    }

    /// Look up a session's store, refreshing its recency and idle timer.
    ///
    /// An expired session is removed and reported as absent.
    pub fn get(&self, session_id: &str) -> Option<Arc<VectorStore>> {
        let now = Instant::now();
        let mut sessions = self.sessions.lock();

        let expired = sessions
            .peek(session_id)
            .map(|entry| entry.is_expired(self.idle_ttl, now))?;

        if expired {
            sessions.pop(session_id);
            debug!(session_id, "Session expired");
            return None;
        }

        let entry = sessions.get_mut(session_id)?;
        entry.last_access = now;
        Some(Arc::clone(&entry.store))
    }

    pub fn remove(&self, session_id: &str) -> bool {
        self.sessions.lock().pop(session_id).is_some()
    }

    /// Whether the session is registered, without touching its recency.
    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.lock().contains(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every session idle past the TTL. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let Some(ttl) = self.idle_ttl else {
            return 0;
        };

        let now = Instant::now();
        let mut sessions = self.sessions.lock();
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, entry)| entry.is_expired(Some(ttl), now))
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            sessions.pop(id);
        }

        expired.len()
    }

    /// Periodically purge expired sessions until the returned handle is aborted.
    pub fn spawn_sweeper(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let purged = self.purge_expired();
                if purged > 0 {
                    info!(purged, remaining = self.len(), "Purged idle sessions");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(text: &str) -> VectorStore {
        let mut store = VectorStore::new();
        store.insert(text, vec![1.0, 0.0]).unwrap();
        store
    }

    fn registry(capacity: usize, ttl: Option<Duration>) -> SessionRegistry {
        SessionRegistry::new(NonZeroUsize::new(capacity).unwrap(), ttl)
    }

    #[test]
    fn test_insert_and_get() {
        let registry = registry(4, None);
        let id = registry.insert(store_with("alpha"));

        assert!(uuid::Uuid::parse_str(&id).is_ok());
        let store = registry.get(&id).unwrap();
        assert_eq!(store.len(), 1);
        assert!(registry.get("unknown").is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        let registry = registry(4, None);
        let a = registry.insert(store_with("a"));
        let b = registry.insert(store_with("b"));
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_lru_eviction() {
        let registry = registry(2, None);
        let first = registry.insert(store_with("first"));
        let second = registry.insert(store_with("second"));

        // Touch `first` so `second` becomes least recently used
        registry.get(&first).unwrap();
        let third = registry.insert(store_with("third"));

        assert!(registry.contains(&first));
        assert!(!registry.contains(&second));
        assert!(registry.contains(&third));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_idle_expiry_on_get() {
        let registry = registry(4, Some(Duration::from_millis(20)));
        let id = registry.insert(store_with("short-lived"));

        std::thread::sleep(Duration::from_millis(60));

        assert!(registry.get(&id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let registry = registry(4, Some(Duration::from_millis(20)));
        registry.insert(store_with("a"));
        registry.insert(store_with("b"));

        std::thread::sleep(Duration::from_millis(60));
        let fresh = registry.insert(store_with("c"));

        assert_eq!(registry.purge_expired(), 2);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&fresh));
    }

    #[test]
    fn test_no_ttl_never_expires() {
        let registry = registry(4, None);
        registry.insert(store_with("a"));
        assert_eq!(registry.purge_expired(), 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove() {
        let registry = registry(4, None);
        let id = registry.insert(store_with("a"));
        assert!(registry.remove(&id));
        assert!(!registry.remove(&id));
    }

    #[tokio::test]
    async fn test_sweeper_purges() {
        let registry = Arc::new(registry(4, Some(Duration::from_millis(10))));
        registry.insert(store_with("a"));

        let handle = Arc::clone(&registry).spawn_sweeper(Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(120)).await;
        handle.abort();

        assert!(registry.is_empty());
    }
}
