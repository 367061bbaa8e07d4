//! SplitLedger API Server
//!
//! Tracks shared group expenses and works out who owes whom.
//! Uses hexagonal (ports & adapters) architecture for clean separation of concerns.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use sea_orm::{Database, DatabaseConnection};
use serde::Serialize;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::GovernorLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod adapters;
mod app;
mod auth;
mod config;
mod domain;
mod entity;
mod error;
mod handlers;

#[cfg(test)]
mod test_utils;


use adapters::{
    LocalImageStore, PostgresExpenseRepository, PostgresGroupRepository, PostgresUserRepository,
};
use app::{AuthService, ExpenseService, GroupService, UploadService, UserService};
use config::Config;

/// Largest accepted upload body
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService<PostgresUserRepository>>,
    pub user_service:
        Arc<UserService<PostgresUserRepository, PostgresExpenseRepository, LocalImageStore>>,
    pub group_service: Arc<
        GroupService<
            PostgresGroupRepository,
            PostgresUserRepository,
            PostgresExpenseRepository,
            LocalImageStore,
        >,
    >,
    pub expense_service: Arc<ExpenseService<PostgresExpenseRepository, PostgresGroupRepository>>,
    pub upload_service: Arc<UploadService<LocalImageStore>>,
}

impl AppState {
    /// Wire adapters into services
    pub fn new(db: DatabaseConnection, images: Arc<LocalImageStore>, config: &Config) -> Self {
        let user_repo = Arc::new(PostgresUserRepository::new(db.clone()));
        let group_repo = Arc::new(PostgresGroupRepository::new(db.clone()));
        let expense_repo = Arc::new(PostgresExpenseRepository::new(db));

        let auth_service = Arc::new(AuthService::new(
            user_repo.clone(),
            config.secret_key.clone(),
            config.access_token_expire_minutes,
        ));

        let user_service = Arc::new(UserService::new(
            user_repo.clone(),
            expense_repo.clone(),
            images.clone(),
            config.expense_fetch_limit,
        ));

        let group_service = Arc::new(GroupService::new(
            group_repo.clone(),
            user_repo,
            expense_repo.clone(),
            images.clone(),
            config.expense_fetch_limit,
        ));

        let expense_service = Arc::new(ExpenseService::new(
            expense_repo,
            group_repo,
            config.expense_fetch_limit,
        ));

        let upload_service = Arc::new(UploadService::new(images));

        Self {
            auth_service,
            user_service,
            group_service,
            expense_service,
            upload_service,
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the HTTP router, everything under `/api`
pub fn router(state: AppState) -> anyhow::Result<Router> {
    // Rate limiting config: 2 req/sec sustained, burst of 5
    // Uses PeerIpKeyExtractor to get client IP from socket connection
    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(PeerIpKeyExtractor)
            .per_second(2)
            .burst_size(5)
            .finish()
            .context("Failed to build governor config")?,
    );

    // Rate-limited routes (registration, login)
    let rate_limited_routes = Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .layer(GovernorLayer {
            config: governor_config,
        });

    let protected_routes = Router::new()
        // Users
        .route("/users/me", get(handlers::me))
        .route("/users/update", put(handlers::update_me))
        .route("/users/disable", post(handlers::disable_me))
        .route("/users/stats", get(handlers::my_stats))
        // Groups
        .route("/groups/create", post(handlers::create_group))
        .route("/groups/join/:invite_code", post(handlers::join_group))
        .route("/groups/my", get(handlers::my_groups))
        .route(
            "/groups/:id",
            get(handlers::get_group)
                .put(handlers::update_group)
                .delete(handlers::delete_group),
        )
        .route("/groups/:id/export", get(handlers::export_group))
        // Expenses
        .route("/expenses/add", post(handlers::add_expense))
        .route(
            "/expenses/:id",
            get(handlers::get_expense)
                .put(handlers::update_expense)
                .delete(handlers::delete_expense),
        )
        .route(
            "/expenses/group/:group_id",
            get(handlers::list_group_expenses),
        )
        .route(
            "/expenses/group/:group_id/balances",
            get(handlers::group_balances),
        )
        // Uploads
        .route(
            "/upload",
            post(handlers::upload_image).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    let api = Router::new()
        // Health check (no auth)
        .route("/health", get(health))
        .merge(rate_limited_routes)
        .merge(protected_routes);

    Ok(Router::new()
        .nest("/api", api)
        // Middleware
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,splitledger_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting SplitLedger API...");

    // Load configuration
    let config = Config::from_env()?;

    // Connect to PostgreSQL
    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    let images = Arc::new(LocalImageStore::new(config.upload_dir.clone()));
    images
        .ensure_dir()
        .await
        .with_context(|| format!("Failed to create upload dir {}", config.upload_dir.display()))?;

    let state = AppState::new(db, images, &config);
    let app = router(state)?;

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
