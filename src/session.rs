//! Login sessions.
//!
//! `SessionStore` is the single authority for "which token belongs to whom". Handlers and
//! extractors only see the trait; `main` picks the backend from `SESSION_STORE`.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::MAX_SESSION_TTL_DAYS;
use crate::models::{Role, SessionUser, User};

/// Session
///
/// Snapshot of the user taken at login. Role changes revoke the user's sessions, so the
/// snapshot never outlives the role it carries.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    fn new(user: &User, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            token: generate_token(),
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn user(&self) -> SessionUser {
        SessionUser {
            id: self.user_id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Token format: `sess_` + 32 bytes of OS randomness as hex (69 chars).
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::fill(&mut bytes);
    format!("sess_{}", hex::encode(bytes))
}

/// SessionStore
///
/// Expired entries are never returned by `get`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, user: &User) -> anyhow::Result<Session>;
    async fn get(&self, token: &str) -> anyhow::Result<Option<Session>>;
    /// Unknown tokens are not an error.
    async fn delete(&self, token: &str) -> anyhow::Result<()>;
    /// Revokes every session of one user except `keep`; returns how many were removed.
    async fn delete_for_user(&self, user_id: Uuid, keep: Option<&str>) -> anyhow::Result<u64>;
    async fn purge_expired(&self) -> anyhow::Result<u64>;
}

pub type SessionState = Arc<dyn SessionStore>;

fn ttl_from_days(days: i64) -> Duration {
    Duration::days(days.clamp(1, MAX_SESSION_TTL_DAYS))
}

// --- In-memory backend ---

/// InMemorySessionStore
///
/// Single-instance backend. Sessions are lost on restart.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl InMemorySessionStore {
    pub fn new(ttl_days: i64) -> Self {
        Self::with_ttl(ttl_from_days(ttl_days))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, user: &User) -> anyhow::Result<Session> {
        let session = Session::new(user, self.ttl);
        self.sessions
            .write()
            .await
            .insert(session.token.clone(), session.clone());
        Ok(session)
    }

    async fn get(&self, token: &str) -> anyhow::Result<Option<Session>> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(token) {
                None => return Ok(None),
                Some(session) if !session.is_expired(now) => return Ok(Some(session.clone())),
                Some(_) => {}
            }
        }
        self.sessions.write().await.remove(token);
        Ok(None)
    }

    async fn delete(&self, token: &str) -> anyhow::Result<()> {
        self.sessions.write().await.remove(token);
        Ok(())
    }

    async fn delete_for_user(&self, user_id: Uuid, keep: Option<&str>) -> anyhow::Result<u64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|token, s| s.user_id != user_id || Some(token.as_str()) == keep);
        Ok((before - sessions.len()) as u64)
    }

    async fn purge_expired(&self) -> anyhow::Result<u64> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        Ok((before - sessions.len()) as u64)
    }
}

// --- Postgres backend ---

/// PostgresSessionStore
///
/// Shared backend for multi-instance deployments (`sessions` table).
pub struct PostgresSessionStore {
    pool: PgPool,
    ttl: Duration,
}

impl PostgresSessionStore {
    pub fn new(pool: PgPool, ttl_days: i64) -> Self {
        Self::with_ttl(pool, ttl_from_days(ttl_days))
    }

    pub fn with_ttl(pool: PgPool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn create(&self, user: &User) -> anyhow::Result<Session> {
        let session = Session::new(user, self.ttl);
        sqlx::query(
            r#"
            INSERT INTO sessions (token, user_id, name, email, role, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&session.token)
        .bind(session.user_id)
        .bind(&session.name)
        .bind(&session.email)
        .bind(session.role.as_str())
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(session)
    }

    async fn get(&self, token: &str) -> anyhow::Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT token, user_id, name, email, role, created_at, expires_at
            FROM sessions
            WHERE token = $1 AND expires_at > now()
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    async fn delete(&self, token: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_for_user(&self, user_id: Uuid, keep: Option<&str>) -> anyhow::Result<u64> {
        let result = sqlx::query(
            "DELETE FROM sessions WHERE user_id = $1 AND ($2::text IS NULL OR token <> $2)",
        )
        .bind(user_id)
        .bind(keep)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn purge_expired(&self) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Starts the background task that drops expired sessions every `interval_secs`.
pub fn spawn_sweeper(store: SessionState, interval_secs: u64) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_secs.max(1)));
        // first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match store.purge_expired().await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "purged expired sessions"),
                Err(e) => tracing::error!(error = %e, "session sweep failed"),
            }
        }
    })
}
