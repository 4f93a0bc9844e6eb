//! Lectern Backend
//!
//! JSON API over a course and instructor catalogue with SQLite persistence,
//! bearer-token authentication and per-client rate limiting.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod filters;
mod models;
mod ratelimit;
mod validator;

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as CorsAny, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use errors::AppError;
use ratelimit::RateLimiter;

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub limiter: Arc<RateLimiter>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(env = %config.env, "Starting Lectern Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if !config.limiter.enabled {
        tracing::warn!("Rate limiting is disabled (LECTERN_LIMITER_ENABLED=false)");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path, config.db_max_connections).await?;
    let repo = Arc::new(Repository::new(pool));

    let limiter = Arc::new(RateLimiter::new(config.limiter.clone()));
    let sweeper = RateLimiter::spawn_sweeper(&limiter);

    let state = AppState {
        repo,
        limiter,
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweeper.abort();
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections");
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/healthcheck", get(api::healthcheck))
        // Courses
        .route("/courses", get(api::list_courses))
        .route("/courses/{id}", get(api::get_course))
        // Instructors
        .route("/instructors", get(api::list_instructors))
        .route("/instructors/{id}", get(api::get_instructor))
        // Accounts
        .route("/users", post(api::register_user))
        .route("/users/activated", put(api::activate_user))
        .route("/tokens/authentication", post(api::create_authentication_token));

    let activated_routes = Router::new()
        .route("/courses", post(api::create_course))
        .route("/courses/{id}", patch(api::update_course))
        .route("/courses/{id}", delete(api::delete_course))
        .route("/instructors", post(api::create_instructor))
        .route("/instructors/{id}", patch(api::update_instructor))
        .route("/instructors/{id}", delete(api::delete_instructor))
        .route_layer(middleware::from_fn(auth::require_activated_user));

    let authenticated_routes = Router::new()
        .route(
            "/tokens/authentication",
            delete(api::delete_authentication_tokens),
        )
        .route_layer(middleware::from_fn(auth::require_authenticated_user));

    let v1_routes = public_routes
        .merge(activated_routes)
        .merge(authenticated_routes);

    with_middleware(Router::new().nest("/v1", v1_routes), state)
}

/// Wrap `routes` in the shared fallback and middleware stack.
fn with_middleware(routes: Router<AppState>, state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(CorsAny)
        .allow_methods(CorsAny)
        .allow_headers(CorsAny);

    // Layers run bottom-up: the last one added sees the request first.
    routes
        .fallback(api::not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            ratelimit::rate_limit_layer,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

/// Turn a handler panic into the generic 500 envelope.
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::Internal(format!("handler panicked: {}", detail)).into_response()
}
