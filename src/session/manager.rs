//! Session manager for tracking all connected controllers

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// A connected controller
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub id: u64,
    pub addr: SocketAddr,
    pub connected_at: Instant,
}

/// Tracks live sessions.
///
/// Every session drives the same device; commands are serialized by the
/// device queue, not here.
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<u64, SessionInfo>>>,
    next_id: AtomicU64,
    max_sessions: Option<usize>,
}

impl SessionManager {
    /// Create a session manager, optionally capping concurrent sessions
    pub fn new(max_sessions: Option<usize>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            next_id: AtomicU64::new(0),
            max_sessions,
        }
    }

    /// Register a new session, returning its id.
    ///
    /// Returns `None` when the session cap is reached.
    pub async fn register(&self, addr: SocketAddr) -> Option<u64> {
        let mut sessions = self.sessions.write().await;
        if let Some(max) = self.max_sessions {
            if sessions.len() >= max {
                return None;
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        sessions.insert(
            id,
            SessionInfo {
                id,
                addr,
                connected_at: Instant::now(),
            },
        );
        Some(id)
    }

    /// Unregister a session
    pub async fn unregister(&self, id: u64) -> Option<SessionInfo> {
        self.sessions.write().await.remove(&id)
    }

    /// Get info about a specific session
    pub async fn get(&self, id: u64) -> Option<SessionInfo> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Get the number of connected sessions
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "127.0.0.1:50000".parse().unwrap()
    }

    #[tokio::test]
    async fn test_register_and_unregister() {
        let manager = SessionManager::default();
        let a = manager.register(addr()).await.unwrap();
        let b = manager.register(addr()).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(manager.count().await, 2);

        assert_eq!(manager.unregister(a).await.map(|s| s.id), Some(a));
        assert!(manager.get(a).await.is_none());
        assert_eq!(manager.count().await, 1);
    }

    #[tokio::test]
    async fn test_session_cap() {
        let manager = SessionManager::new(Some(1));
        let first = manager.register(addr()).await.unwrap();
        assert!(manager.register(addr()).await.is_none());

        manager.unregister(first).await;
        assert!(manager.register(addr()).await.is_some());
    }
}
