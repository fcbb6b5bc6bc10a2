//! Session storage keyed by opaque session token.
//!
//! Both backends are safe to share across request workers: the in-memory
//! store guards its map with an async `RwLock`, and Redis is the
//! synchronization point for the distributed one. Expiry is enforced by the
//! backend (lazy eviction in memory, `EX` in Redis), never by callers.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_redis::{Config, Pool, Runtime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use shared_models::auth::{Role, User};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: i64,
    pub role: Role,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionData {
    pub fn for_user(user: &User, ttl: Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(1));
        Self {
            user_id: user.id,
            role: user.role,
            email: user.email.clone(),
            expires_at: Utc::now() + ttl,
        }
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.user_id,
            email: self.email.clone(),
            role: self.role,
            metadata: None,
            created_at: None,
        }
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session backend unavailable: {0}")]
    Backend(String),

    #[error("Session serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<redis::RedisError> for SessionError {
    fn from(err: redis::RedisError) -> Self {
        SessionError::Backend(err.to_string())
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, token: &str) -> Result<Option<SessionData>, SessionError>;
    async fn set(&self, token: &str, session: SessionData, ttl: Duration) -> Result<(), SessionError>;
    async fn delete(&self, token: &str) -> Result<(), SessionError>;
}

struct StoredSession {
    data: SessionData,
    evict_at: Instant,
}

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, StoredSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry; returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, stored| stored.evict_at > now);
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, token: &str) -> Result<Option<SessionData>, SessionError> {
        {
            let sessions = self.sessions.read().await;
            match sessions.get(token) {
                None => return Ok(None),
                Some(stored) if stored.evict_at > Instant::now() => {
                    return Ok(Some(stored.data.clone()));
                }
                Some(_) => {}
            }
        }

        // Expired: evict under the write lock, re-checking in case it was refreshed.
        let mut sessions = self.sessions.write().await;
        if let Some(stored) = sessions.get(token) {
            if stored.evict_at > Instant::now() {
                return Ok(Some(stored.data.clone()));
            }
            sessions.remove(token);
            debug!("Evicted expired session");
        }
        Ok(None)
    }

    async fn set(&self, token: &str, session: SessionData, ttl: Duration) -> Result<(), SessionError> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, stored| stored.evict_at > now);
        sessions.insert(token.to_string(), StoredSession {
            data: session,
            evict_at: now + ttl,
        });
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<(), SessionError> {
        self.sessions.write().await.remove(token);
        Ok(())
    }
}

pub struct RedisSessionStore {
    pool: Pool,
}

impl RedisSessionStore {
    pub async fn new(redis_url: &str) -> Result<Self, SessionError> {
        let cfg = Config::from_url(redis_url);
        let pool = cfg.create_pool(Some(Runtime::Tokio1))
            .map_err(|e| SessionError::Backend(format!("Pool creation error: {}", e)))?;

        let mut conn = pool.get().await
            .map_err(|e| SessionError::Backend(format!("Connection error: {}", e)))?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        info!("Redis session store initialized successfully");

        Ok(Self { pool })
    }

    async fn connection(&self) -> Result<deadpool_redis::Connection, SessionError> {
        self.pool.get().await
            .map_err(|e| SessionError::Backend(format!("Connection error: {}", e)))
    }

    fn key(token: &str) -> String {
        format!("session:{}", token)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, token: &str) -> Result<Option<SessionData>, SessionError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = redis::cmd("GET")
            .arg(Self::key(token))
            .query_async(&mut conn)
            .await?;

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, token: &str, session: SessionData, ttl: Duration) -> Result<(), SessionError> {
        let mut conn = self.connection().await?;
        let payload = serde_json::to_string(&session)?;
        let seconds = ttl.as_secs().max(1);

        let _: () = redis::cmd("SET")
            .arg(Self::key(token))
            .arg(payload)
            .arg("EX")
            .arg(seconds)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<(), SessionError> {
        let mut conn = self.connection().await?;
        let _: () = redis::cmd("DEL")
            .arg(Self::key(token))
            .query_async(&mut conn)
            .await?;
        Ok(())
    }
}
