//! In-memory session store.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::{SESSION_KEY, SessionError, SessionStore, SessionToken};

/// Session store that lives only as long as the process.
///
/// Cheaply cloneable; clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    keys: Arc<RwLock<HashMap<String, String>>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `token`.
    #[must_use]
    pub fn with_token(token: &SessionToken) -> Self {
        let mut keys = HashMap::new();
        keys.insert(SESSION_KEY.to_string(), token.expose().to_string());
        Self {
            keys: Arc::new(RwLock::new(keys)),
        }
    }

    /// Number of keys currently stored.
    pub async fn len(&self) -> usize {
        self.keys.read().await.len()
    }

    /// Whether no keys are stored.
    pub async fn is_empty(&self) -> bool {
        self.keys.read().await.is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    async fn store(&self, token: &SessionToken) -> Result<(), SessionError> {
        self.keys
            .write()
            .await
            .insert(SESSION_KEY.to_string(), token.expose().to_string());
        Ok(())
    }

    async fn load(&self) -> Result<Option<SessionToken>, SessionError> {
        Ok(self.keys.read().await.get(SESSION_KEY).map(SessionToken::new))
    }

    async fn clear(&self) -> Result<(), SessionError> {
        self.keys.write().await.clear();
        Ok(())
    }
}
