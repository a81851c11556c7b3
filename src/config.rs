use std::{env, path::PathBuf, str::FromStr};

/// Longest session lifetime accepted from `SESSION_TTL_DAYS`.
pub const MAX_SESSION_TTL_DAYS: i64 = 3650;

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at startup and
/// immutable afterwards; handlers pull it out of `AppState` via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Runtime environment marker. Controls cookie security and fail-fast rules.
    pub env: Env,
    /// Postgres connection string. `None` runs the whole site in memory (local only).
    pub db_url: Option<String>,
    /// Socket address the HTTP server binds to.
    pub bind_addr: String,
    /// Directory uploaded images are written to and served from under `/uploads`.
    pub upload_dir: PathBuf,
    /// Upper bound for a single uploaded image, in bytes.
    pub max_upload_bytes: usize,
    /// Which backend holds login sessions.
    pub session_store: SessionBackend,
    /// Lifetime of a session and of its cookie.
    pub session_ttl_days: i64,
    /// Interval of the expired-session sweep task.
    pub session_sweep_secs: u64,
    /// Login attempts allowed per email inside one window; a success clears the count.
    pub login_max_attempts: u32,
    pub login_window_secs: u64,
    /// Account created at startup when no administrator exists yet.
    pub seed_admin: Option<SeedAdmin>,
}

/// Env
///
/// Local runs pretty logs, insecure cookies, in-memory defaults and a default admin.
/// Production runs JSON logs, `Secure` cookies and refuses to start half-configured.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Production,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SessionBackend {
    Memory,
    Postgres,
}

impl FromStr for SessionBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" => Ok(Self::Postgres),
            other => Err(ConfigError::Invalid("SESSION_STORE", other.to_string())),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SeedAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in {1}")]
    Missing(&'static str, &'static str),
    #[error("{0} has an invalid value: {1}")]
    Invalid(&'static str, String),
}

impl Default for AppConfig {
    /// Safe in-memory configuration used by tests.
    fn default() -> Self {
        Self {
            env: Env::Local,
            db_url: None,
            bind_addr: "127.0.0.1:3000".to_string(),
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 10 * 1024 * 1024,
            session_store: SessionBackend::Memory,
            session_ttl_days: 7,
            session_sweep_secs: 3600,
            login_max_attempts: 5,
            login_window_secs: 900,
            seed_admin: None,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads all parameters from environment variables.
    ///
    /// Production demands `DATABASE_URL`, and never invents an admin password: the seed
    /// admin only exists there when both `ADMIN_EMAIL` and `ADMIN_PASSWORD` are set.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").unwrap_or_else(|_| "local".to_string()).as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let db_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());
        if env == Env::Production && db_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL", "production"));
        }

        let session_store = match env::var("SESSION_STORE") {
            Ok(value) => value.parse()?,
            Err(_) if db_url.is_some() && env == Env::Production => SessionBackend::Postgres,
            Err(_) => SessionBackend::Memory,
        };
        if session_store == SessionBackend::Postgres && db_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL", "SESSION_STORE=postgres"));
        }

        let max_upload_mb: usize = parse_var("MAX_UPLOAD_MB", 10)?;
        let max_upload_bytes = max_upload_mb
            .checked_mul(1024 * 1024)
            .filter(|bytes| *bytes > 0)
            .ok_or_else(|| ConfigError::Invalid("MAX_UPLOAD_MB", max_upload_mb.to_string()))?;

        let session_ttl_days: i64 = parse_var("SESSION_TTL_DAYS", 7)?;
        if !(1..=MAX_SESSION_TTL_DAYS).contains(&session_ttl_days) {
            return Err(ConfigError::Invalid(
                "SESSION_TTL_DAYS",
                session_ttl_days.to_string(),
            ));
        }

        Ok(Self {
            env,
            db_url,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
            max_upload_bytes,
            session_store,
            session_ttl_days,
            session_sweep_secs: parse_var("SESSION_SWEEP_SECS", 3600)?,
            login_max_attempts: parse_var("LOGIN_MAX_ATTEMPTS", 5)?,
            login_window_secs: parse_var("LOGIN_WINDOW_SECS", 900)?,
            seed_admin: seed_admin(env),
        })
    }

    /// Cookies carry the `Secure` attribute only behind production TLS.
    pub fn secure_cookies(&self) -> bool {
        self.env == Env::Production
    }

    pub fn session_max_age_secs(&self) -> i64 {
        self.session_ttl_days.clamp(1, MAX_SESSION_TTL_DAYS) * 24 * 60 * 60
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

fn seed_admin(env: Env) -> Option<SeedAdmin> {
    let name = env::var("ADMIN_NAME").unwrap_or_else(|_| "관리자".to_string());
    let email = env::var("ADMIN_EMAIL").ok();
    let password = env::var("ADMIN_PASSWORD").ok();
    match env {
        Env::Production => Some(SeedAdmin {
            name,
            email: email?,
            password: password?,
        }),
        Env::Local => Some(SeedAdmin {
            name,
            email: email.unwrap_or_else(|| "admin@church.local".to_string()),
            password: password.unwrap_or_else(|| "changeme123".to_string()),
        }),
    }
}
