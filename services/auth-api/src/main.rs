//! Todo Auth API
//!
//! Login-or-register, logout and token validation over HTTP.

mod config;
mod error;
mod extractors;
mod handlers;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use todo_auth_core::{AuthService, TokenCodec, UserService};
use todo_cache::{DenyList, RedisStore, SharedStore, UserCache};
use todo_db::Repositories;
use todo_types::{SharedClock, SystemClock};

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!("Starting Todo Auth API");

    let pool = todo_db::create_pool_with_options(
        &config.database_url,
        config.auth.repository.into(),
    )
    .await?;
    todo_db::run_migrations(&pool).await?;

    let store: SharedStore = Arc::new(RedisStore::connect(&config.redis_url).await?);
    tracing::info!("Connected to cache");

    let clock: SharedClock = Arc::new(SystemClock);
    let repos = Repositories::new(pool.clone());
    let identities = Arc::new(repos.identities);

    let user_cache = UserCache::new(
        store.clone(),
        config.auth.cache.user_prefix.clone(),
        config.auth.cache.user_ttl,
    );
    let deny_list = DenyList::new(store.clone(), config.auth.cache.deny_prefix.clone());
    let codec = TokenCodec::new(&config.auth.token, clock.clone())?;

    let users = Arc::new(UserService::new(
        Arc::new(repos.users),
        identities.clone(),
        user_cache,
    ));
    let auth = AuthService::new(users, identities, codec, deny_list, clock);

    let port = config.http_port;
    let state = AppState::new(auth, pool, store, config);

    // Build router
    let app = Router::new()
        .route("/api/v1/auth/login", post(handlers::login))
        .route("/api/v1/auth/logout", post(handlers::logout))
        .route("/api/v1/auth/validate", get(handlers::validate))
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
