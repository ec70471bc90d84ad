//! Per-browser session state and the visit counter

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

use crate::error::AppResult;

/// Values kept for one browser session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub num_visits: u64,
}

/// Keyed storage for session data
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, session_key: &str) -> AppResult<Option<SessionData>>;
    async fn save(&self, session_key: &str, data: &SessionData) -> AppResult<()>;
}

/// In-process store; sessions are lost on restart
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionData>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, session_key: &str) -> AppResult<Option<SessionData>> {
        Ok(self.sessions.read().await.get(session_key).cloned())
    }

    async fn save(&self, session_key: &str, data: &SessionData) -> AppResult<()> {
        self.sessions
            .write()
            .await
            .insert(session_key.to_string(), data.clone());
        Ok(())
    }
}

#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn SessionStore>,
}

impl SessionService {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Count a visit to the home page.
    /// Returns the number of earlier visits in this session and stores one more.
    pub async fn record_visit(&self, session_key: &str) -> AppResult<u64> {
        let mut data = self.store.load(session_key).await?.unwrap_or_default();
        let previous = data.num_visits;

        data.num_visits = previous + 1;
        self.store.save(session_key, &data).await?;

        tracing::debug!(session = %session_key, num_visits = previous, "Recorded visit");
        Ok(previous)
    }
}
