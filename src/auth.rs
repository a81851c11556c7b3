use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use std::{
    collections::HashMap,
    sync::LazyLock,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::AppError,
    models::{Role, SessionUser},
    session::{Session, SessionState},
};

pub const SESSION_COOKIE: &str = "sessionId";
pub const MIN_PASSWORD_LENGTH: usize = 8;

// --- Passwords ---

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hash failed: {e}"))?
        .to_string();
    Ok(hash)
}

/// A stored hash that does not parse is an internal error, not a failed login.
pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed =
        PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("invalid password hash: {e}"))?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Hash checked when the email is unknown, so both failure paths cost one Argon2 verify.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("church-portal-dummy-password").ok());

/// Runs a full verify against a hash nobody can log in with. Always `false`.
pub fn verify_dummy_password(plain: &str) -> bool {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(plain, hash);
    }
    false
}

pub fn validate_new_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::invalid(format!(
            "비밀번호는 최소 {MIN_PASSWORD_LENGTH}자 이상이어야 합니다."
        )));
    }
    Ok(())
}

// --- Cookies ---

/// `Set-Cookie` value carrying a fresh session token.
pub fn session_cookie(token: &str, config: &AppConfig) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        config.session_max_age_secs()
    );
    if config.secure_cookies() {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that makes the browser drop the session cookie.
pub fn clear_cookie(config: &AppConfig) -> String {
    let mut cookie = format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0");
    if config.secure_cookies() {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Reads the session token out of every `Cookie` header of the request.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

// --- Extractors ---

/// AuthUser
///
/// The identity behind a valid session cookie. Usable as a handler argument anywhere a
/// login is required; rejects with `Unauthorized` when the cookie is missing, unknown or
/// expired.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// The token the request was authenticated with.
    pub token: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn user(&self) -> SessionUser {
        SessionUser {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

impl From<Session> for AuthUser {
    fn from(session: Session) -> Self {
        Self {
            id: session.user_id,
            name: session.name,
            email: session.email,
            role: session.role,
            token: session.token,
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    SessionState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let token = session_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        let sessions = SessionState::from_ref(state);
        let session = sessions
            .get(&token)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let user = AuthUser::from(session);
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

/// AdminUser
///
/// `AuthUser` whose role is admin; any other role is rejected with `Forbidden`.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    SessionState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            tracing::warn!(user_id = %user.id, "non-admin attempted an admin operation");
            return Err(AppError::Forbidden);
        }
        Ok(AdminUser(user))
    }
}

// --- Login throttle ---

/// LoginThrottle
///
/// Fixed-window counter of login attempts per email. Each attempt is counted before the
/// password is checked, so concurrent guesses cannot slip past the limit; once more than
/// `max_attempts` land inside one window the rest are refused until it ends. A successful
/// login clears the counter.
pub struct LoginThrottle {
    max_attempts: u32,
    window: Duration,
    inner: Mutex<ThrottleWindows>,
}

struct ThrottleWindows {
    attempts: HashMap<String, (u32, Instant)>,
    last_prune: Instant,
}

impl LoginThrottle {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            inner: Mutex::new(ThrottleWindows {
                attempts: HashMap::new(),
                last_prune: Instant::now(),
            }),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.login_max_attempts,
            Duration::from_secs(config.login_window_secs),
        )
    }

    /// Counts one attempt for `email` and refuses it when the window is already full.
    pub async fn attempt(&self, email: &str) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();

        // Drop finished windows at most once per window length.
        if now.duration_since(inner.last_prune) >= self.window {
            let window = self.window;
            inner
                .attempts
                .retain(|_, (_, started)| now.duration_since(*started) < window);
            inner.last_prune = now;
        }

        let entry = inner
            .attempts
            .entry(email.to_string())
            .or_insert((0, now));
        if now.duration_since(entry.1) >= self.window {
            *entry = (0, now);
        }
        entry.0 = entry.0.saturating_add(1);

        if entry.0 > self.max_attempts {
            return Err(AppError::TooManyRequests);
        }
        Ok(())
    }

    pub async fn reset(&self, email: &str) {
        self.inner.lock().await.attempts.remove(email);
    }

    /// Number of emails with an open window.
    pub async fn tracked(&self) -> usize {
        self.inner.lock().await.attempts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("correct-horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct-horse", &hash).unwrap());
        assert!(!verify_password("wrong-horse", &hash).unwrap());
        assert!(verify_password("x", "not-a-hash").is_err());
    }

    #[test]
    fn dummy_verify_never_matches() {
        assert!(!verify_dummy_password("church-portal-dummy-password"));
        assert!(!verify_dummy_password(""));
    }

    #[test]
    fn short_password_is_rejected() {
        assert!(validate_new_password("1234567").is_err());
        assert!(validate_new_password("12345678").is_ok());
    }

    #[test]
    fn cookie_attributes_follow_env() {
        let local = AppConfig::default();
        let cookie = session_cookie("sess_abc", &local);
        assert_eq!(
            cookie,
            "sessionId=sess_abc; HttpOnly; SameSite=Lax; Path=/; Max-Age=604800"
        );

        let production = AppConfig {
            env: crate::config::Env::Production,
            ..AppConfig::default()
        };
        assert!(session_cookie("sess_abc", &production).ends_with("; Secure"));
        assert!(clear_cookie(&production).contains("Max-Age=0"));
    }

    #[test]
    fn token_is_found_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; sessionId=sess_123; lang=ko"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("sess_123"));

        headers.insert(header::COOKIE, HeaderValue::from_static("sessionId="));
        assert_eq!(session_token(&headers), None);
    }

    #[tokio::test]
    async fn throttle_locks_after_max_attempts() {
        let throttle = LoginThrottle::new(3, Duration::from_secs(60));
        for _ in 0..3 {
            assert!(throttle.attempt("a@church.kr").await.is_ok());
        }
        assert!(matches!(
            throttle.attempt("a@church.kr").await,
            Err(AppError::TooManyRequests)
        ));
        assert!(throttle.attempt("b@church.kr").await.is_ok());

        throttle.reset("a@church.kr").await;
        assert!(throttle.attempt("a@church.kr").await.is_ok());
    }

    #[tokio::test]
    async fn throttle_window_expires() {
        let throttle = LoginThrottle::new(1, Duration::from_millis(0));
        assert!(throttle.attempt("a@church.kr").await.is_ok());
        assert!(throttle.attempt("a@church.kr").await.is_ok());
    }

    #[tokio::test]
    async fn concurrent_attempts_cannot_exceed_limit() {
        let throttle = std::sync::Arc::new(LoginThrottle::new(3, Duration::from_secs(60)));
        let handles: Vec<_> = (0..20)
            .map(|_| {
                let throttle = std::sync::Arc::clone(&throttle);
                tokio::spawn(async move { throttle.attempt("a@church.kr").await.is_ok() })
            })
            .collect();

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 3);
    }

    #[tokio::test]
    async fn finished_windows_are_pruned() {
        let throttle = LoginThrottle::new(5, Duration::from_millis(200));
        for i in 0..50 {
            throttle.attempt(&format!("guess{i}@church.kr")).await.unwrap();
        }
        assert_eq!(throttle.tracked().await, 50);

        tokio::time::sleep(Duration::from_millis(250)).await;
        throttle.attempt("late@church.kr").await.unwrap();
        assert_eq!(throttle.tracked().await, 1);
    }
}
