//! Redis-backed session store

use async_trait::async_trait;
use redis::{AsyncCommands, Client};

use crate::error::{AppError, AppResult};

use super::sessions::{SessionData, SessionStore};

#[derive(Clone)]
pub struct RedisSessionStore {
    client: Client,
    ttl_seconds: u64,
}

impl RedisSessionStore {
    /// Create a new Redis session store
    pub async fn new(url: &str, ttl_seconds: u64) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Session(format!("Failed to create Redis client: {}", e)))?;

        // Test connection
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Session(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Session(format!("Redis connection test failed: {}", e)))?;

        Ok(Self { client, ttl_seconds })
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Session(format!("Failed to get Redis connection: {}", e)))
    }

    fn key(session_key: &str) -> String {
        format!("session:{}", session_key)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, session_key: &str) -> AppResult<Option<SessionData>> {
        let mut conn = self.connection().await?;

        let raw: Option<String> = conn
            .get(Self::key(session_key))
            .await
            .map_err(|e| AppError::Session(format!("Failed to read session from Redis: {}", e)))?;

        match raw {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| AppError::Session(format!("Corrupt session payload: {}", e))),
            None => Ok(None),
        }
    }

    async fn save(&self, session_key: &str, data: &SessionData) -> AppResult<()> {
        let mut conn = self.connection().await?;

        let json = serde_json::to_string(data)
            .map_err(|e| AppError::Session(format!("Failed to serialize session: {}", e)))?;

        // Sliding expiry: every save pushes the deadline out again
        conn.set_ex::<_, _, ()>(Self::key(session_key), json, self.ttl_seconds)
            .await
            .map_err(|e| AppError::Session(format!("Failed to store session in Redis: {}", e)))?;

        Ok(())
    }
}
