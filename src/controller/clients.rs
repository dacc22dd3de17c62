use ahash::AHashMap;
use regex::Regex;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info};

use crate::backend::Backend;
use crate::mvu::runtime::PageClient;
use crate::view::dom::Document;

pub const SESSION_COOKIE: &str = "clubhouse_sid";

pub type SharedClient = Arc<AsyncMutex<PageClient>>;

/// A session cookie value: 32 lowercase hex digits.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// # Panics
    ///
    /// Will panic if the regex is invalid
    #[must_use]
    pub fn new(input: &str) -> Option<Self> {
        static REGEX: OnceLock<Regex> = OnceLock::new();
        let re = REGEX.get_or_init(|| {
            Regex::new(r"^[a-f0-9]{32}$").expect("Invalid regex pattern - this is a programming error")
        });
        re.is_match(input).then(|| SessionId(input.to_string()))
    }

    #[must_use]
    pub fn generate() -> Self {
        SessionId(uuid::Uuid::new_v4().simple().to_string())
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

/// Browser sessions untouched for this long are dropped.
pub const CLIENT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
/// Upper bound on live browser sessions; the least recently seen goes first.
pub const MAX_CLIENTS: usize = 10_000;

struct Entry {
    client: SharedClient,
    last_seen: Instant,
}

/// One [`PageClient`] per browser, keyed by the session cookie. Each client
/// sits behind its own async mutex so a browser's events are handled one
/// at a time, in arrival order.
pub struct ClientRegistry {
    backend: Arc<dyn Backend>,
    clients: Mutex<AHashMap<String, Entry>>,
    message_ttl: Duration,
    idle_timeout: Duration,
    max_clients: usize,
}

impl ClientRegistry {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, message_ttl: Duration) -> Self {
        Self::with_limits(backend, message_ttl, CLIENT_IDLE_TIMEOUT, MAX_CLIENTS)
    }

    #[must_use]
    pub fn with_limits(
        backend: Arc<dyn Backend>,
        message_ttl: Duration,
        idle_timeout: Duration,
        max_clients: usize,
    ) -> Self {
        Self {
            backend,
            clients: Mutex::new(AHashMap::new()),
            message_ttl,
            idle_timeout,
            max_clients: max_clients.max(1),
        }
    }

    fn lookup(&self, id: &SessionId) -> Option<SharedClient> {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = clients.get_mut(id.value())?;
        entry.last_seen = Instant::now();
        Some(Arc::clone(&entry.client))
    }

    /// The client behind `cookie`, if it names a live session. Never creates one.
    #[must_use]
    pub fn existing(&self, cookie: Option<&str>) -> Option<(SessionId, SharedClient)> {
        let id = cookie.and_then(SessionId::new)?;
        let client = self.lookup(&id)?;
        Some((id, client))
    }

    /// Returns the client for `cookie`, creating a fresh one (with a new
    /// session id) when the cookie is missing, malformed or unknown.
    pub async fn client_for(&self, cookie: Option<&str>) -> (SessionId, SharedClient) {
        if let Some(found) = self.existing(cookie) {
            return found;
        }

        let id = SessionId::generate();
        let client = PageClient::new(
            self.backend.new_identity(),
            self.backend.store(),
            Document::new(self.message_ttl),
        )
        .await;
        let client = Arc::new(AsyncMutex::new(client));
        {
            let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
            self.evict(&mut clients, Instant::now());
            clients.insert(
                id.value().to_string(),
                Entry {
                    client: Arc::clone(&client),
                    last_seen: Instant::now(),
                },
            );
        }
        info!(session = id.value(), "new browser session");
        (id, client)
    }

    /// Drops idle sessions, then the least recently seen ones until there
    /// is room for one more.
    fn evict(&self, clients: &mut AHashMap<String, Entry>, now: Instant) {
        let before = clients.len();
        clients.retain(|_, e| now.duration_since(e.last_seen) < self.idle_timeout);
        while clients.len() >= self.max_clients {
            let Some(oldest) = clients
                .iter()
                .min_by_key(|(_, e)| e.last_seen)
                .map(|(k, _)| k.clone())
            else {
                break;
            };
            clients.remove(&oldest);
        }
        let evicted = before - clients.len();
        if evicted > 0 {
            debug!(evicted, remaining = clients.len(), "dropped browser sessions");
        }
    }

    #[must_use]
    pub fn message_ttl(&self) -> Duration {
        self.message_ttl
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_simple_uuids() {
        let id = SessionId::generate();
        assert_eq!(SessionId::new(id.value()), Some(id));
        assert!(SessionId::new("../../etc/passwd").is_none());
        assert!(SessionId::new("").is_none());
    }

    fn registry(idle: Duration, max: usize) -> ClientRegistry {
        let backend: Arc<dyn Backend> = Arc::new(crate::backend::MemoryBackend::new());
        ClientRegistry::with_limits(backend, Duration::from_secs(3), idle, max)
    }

    #[tokio::test]
    async fn idle_sessions_are_dropped_on_next_insert() {
        let registry = registry(Duration::ZERO, 100);
        let (first, _) = registry.client_for(None).await;
        let (second, _) = registry.client_for(None).await;
        assert_eq!(registry.len(), 1);
        assert!(registry.existing(Some(first.value())).is_none());
        assert!(registry.existing(Some(second.value())).is_some());
    }

    #[tokio::test]
    async fn least_recently_seen_goes_when_full() {
        let registry = registry(Duration::from_secs(3600), 2);
        let (a, _) = registry.client_for(None).await;
        let (b, _) = registry.client_for(None).await;
        // touch a so b is the oldest
        registry.client_for(Some(a.value())).await;
        let (c, _) = registry.client_for(None).await;
        assert_eq!(registry.len(), 2);
        assert!(registry.existing(Some(a.value())).is_some());
        assert!(registry.existing(Some(b.value())).is_none());
        assert!(registry.existing(Some(c.value())).is_some());
    }

    #[tokio::test]
    async fn existing_never_creates() {
        let registry = registry(Duration::from_secs(3600), 10);
        assert!(registry.existing(None).is_none());
        assert!(registry.existing(Some("0123456789abcdef0123456789abcdef")).is_none());
        assert!(registry.is_empty());
    }
}
