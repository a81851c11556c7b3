use church_portal::{
    AppState, ContentStores, InMemoryRepository, InMemorySessionStore, LocalDiskStorage,
    PostgresRepository, PostgresSessionStore,
    auth::LoginThrottle,
    bootstrap,
    config::{AppConfig, Env, SessionBackend},
    create_router,
    repository::RepositoryState,
    session::{self, SessionState},
    storage::{StorageService, StorageState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, sets up logging, picks the storage backends, seeds the first
/// admin and serves the HTTP API.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast on a half-configured production environment)
    dotenv::dotenv().ok();
    let config = AppConfig::load().expect("FATAL: invalid configuration");

    // 2. Logging: pretty locally, JSON in production for the log aggregator.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "church_portal=debug,tower_http=info,axum=trace".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Persistence: Postgres when DATABASE_URL is set, otherwise everything in memory.
    let pool = match &config.db_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await
                .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");
            sqlx::migrate!()
                .run(&pool)
                .await
                .expect("FATAL: database migrations failed");
            Some(pool)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; content is kept in memory and lost on restart");
            None
        }
    };

    let (repo, content) = match &pool {
        Some(pool) => {
            let backend = Arc::new(PostgresRepository::new(pool.clone()));
            (
                Arc::clone(&backend) as RepositoryState,
                ContentStores::from_backend(backend),
            )
        }
        None => {
            let backend = Arc::new(InMemoryRepository::new());
            (
                Arc::clone(&backend) as RepositoryState,
                ContentStores::from_backend(backend),
            )
        }
    };

    let sessions: SessionState = match (config.session_store, &pool) {
        (SessionBackend::Postgres, Some(pool)) => {
            Arc::new(PostgresSessionStore::new(pool.clone(), config.session_ttl_days))
        }
        _ => Arc::new(InMemorySessionStore::new(config.session_ttl_days)),
    };
    tracing::info!("Session store: {:?}", config.session_store);

    // 4. Image storage on local disk, served back under /uploads.
    let disk = LocalDiskStorage::new(&config.upload_dir);
    disk.ensure_ready()
        .await
        .expect("FATAL: upload directory is not writable");
    let storage = Arc::new(disk) as StorageState;

    // 5. First administrator
    if let Some(seed) = &config.seed_admin {
        if let Err(e) = bootstrap::seed_admin(&repo, seed).await {
            tracing::error!(error = %e, "failed to seed admin account");
        }
    } else {
        tracing::warn!("ADMIN_EMAIL/ADMIN_PASSWORD not set; no admin will be seeded");
    }

    let _sweeper = session::spawn_sweeper(Arc::clone(&sessions), config.session_sweep_secs);

    let bind_addr = config.bind_addr.clone();
    let app_state = AppState {
        repo,
        content,
        sessions,
        storage,
        throttle: Arc::new(LoginThrottle::from_config(&config)),
        config,
    };

    // 6. Router and server
    let app = create_router(app_state);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: could not bind the HTTP listener");

    tracing::info!("Listening on {bind_addr}");
    tracing::info!("API Documentation (Swagger UI) available at: http://{bind_addr}/swagger-ui");

    axum::serve(listener, app).await.expect("HTTP server error");
}
