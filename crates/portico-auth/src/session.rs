//! Session storage.
//!
//! A session binds an opaque token (carried in a cookie) to a principal's
//! stable identifier. Expiration is enforced here, not by the gate: a
//! session lives `ttl` past its last write, and reads refresh it.
//!
//! Consistency under concurrent access is the store's concern. The
//! in-memory store takes a plain last-write-wins approach: two requests
//! authenticating the same user concurrently both succeed, and the later
//! write stands. External stores (configured by address in the auth
//! document) implement this trait over their own client.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Server-side session storage.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Binds a token to a principal identifier, resetting its lifetime.
    async fn insert(&self, token: &str, principal_id: &str);

    /// Resolves a token to a principal identifier.
    ///
    /// Returns `None` for unknown or expired tokens. A successful read
    /// refreshes the session's lifetime.
    async fn get(&self, token: &str) -> Option<String>;

    /// Destroys the session bound to the token.
    async fn remove(&self, token: &str);
}

/// Generates a fresh opaque session token.
#[must_use]
pub fn new_token() -> String {
    Uuid::now_v7().simple().to_string()
}

#[derive(Debug, Clone)]
struct SessionRecord {
    principal_id: String,
    expires_at: Instant,
}

/// In-process session store backed by a locked map.
///
/// Suitable for a single instance; multi-instance deployments configure
/// an external store instead.
#[derive(Debug)]
pub struct MemorySessionStore {
    ttl: Duration,
    entries: RwLock<HashMap<String, SessionRecord>>,
}

impl MemorySessionStore {
    /// Creates a store whose sessions expire `ttl` after the last write.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of live (possibly expired, not yet reaped) sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True if the store holds no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, token: &str, principal_id: &str) {
        let record = SessionRecord {
            principal_id: principal_id.to_string(),
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.write().insert(token.to_string(), record);
    }

    async fn get(&self, token: &str) -> Option<String> {
        let mut entries = self.entries.write();
        match entries.get_mut(token) {
            Some(record) if record.expires_at > Instant::now() => {
                record.expires_at = Instant::now() + self.ttl;
                Some(record.principal_id.clone())
            }
            Some(_) => {
                entries.remove(token);
                None
            }
            None => None,
        }
    }

    async fn remove(&self, token: &str) {
        self.entries.write().remove(token);
    }
}
