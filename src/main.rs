//! Shelfmark Server - Personal Media Library
//!
//! A self-hosted REST API server for cataloging and tracking personal
//! media collections.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shelfmark_server::{
    api,
    config::AppConfig,
    repository::Repository,
    services::Services,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("shelfmark_server={},tower_http=debug", config.logging.level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Shelfmark Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create repository and services
    let repository = Repository::new(pool);
    let services = Services::new(
        repository,
        config.auth.clone(),
        config.storage.clone(),
        config.lookup.clone(),
    )
    .expect("Failed to create services");

    // A fresh database gets the configured admin account
    services
        .auth
        .ensure_admin_user()
        .await
        .expect("Failed to seed admin user");

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Brute-force protection on the login route
    let governor_conf = Box::new(
        GovernorConfigBuilder::default()
            .per_second(2)
            .burst_size(10)
            .finish()
            .expect("Invalid governor configuration"),
    );
    let login_routes = Router::new()
        .route("/auth/login", post(api::auth::login))
        .layer(GovernorLayer {
            config: Box::leak(governor_conf),
        });

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication
        .route("/auth/me", get(api::auth::me))
        // Items (catalog)
        .route("/items", get(api::items::list_items))
        .route("/items", post(api::items::create_item))
        .route("/items/tags", get(api::items::list_tags))
        .route("/items/:id", get(api::items::get_item))
        .route("/items/:id", put(api::items::update_item))
        .route("/items/:id", delete(api::items::delete_item))
        .route("/items/:id/cover", post(api::items::upload_cover))
        // Reading status
        .route("/items/:id/reading", get(api::reading::get_status))
        .route("/items/:id/reading", put(api::reading::upsert_status))
        .route("/items/:id/reading", delete(api::reading::delete_status))
        .route("/reading", get(api::reading::list))
        .route("/reading/stats", get(api::reading::stats))
        // Metadata lookup
        .route("/lookup/isbn/:isbn", get(api::lookup::resolve_isbn))
        .route("/lookup/books", get(api::lookup::search_books))
        .route("/lookup/tmdb", get(api::lookup::search_tmdb))
        .route("/lookup/tmdb/:kind/:id", get(api::lookup::resolve_tmdb))
        .route("/lookup/jellyfin", get(api::lookup::search_jellyfin))
        .route("/lookup/jellyfin/:id", get(api::lookup::resolve_jellyfin))
        .route("/lookup/jellyfin/image/:id", get(api::lookup::jellyfin_image))
        .route("/lookup/comicvine", get(api::lookup::search_comicvine))
        .route("/lookup/comicvine/:kind/:id", get(api::lookup::resolve_comicvine))
        .route("/lookup/musicbrainz", get(api::lookup::search_musicbrainz))
        .route("/lookup/musicbrainz/:id", get(api::lookup::resolve_musicbrainz))
        // Users
        .route("/users", get(api::users::list_users))
        .route("/users", post(api::users::create_user))
        .route("/users/:id", get(api::users::get_user))
        .route("/users/:id", put(api::users::update_user))
        .route("/users/:id", delete(api::users::delete_user))
        // Loans
        .route("/loans", get(api::loans::open_loans))
        .route("/loans", post(api::loans::create_loan))
        .route("/loans/:id/return", post(api::loans::return_loan))
        .route("/items/:id/loans", get(api::loans::item_loans))
        // Settings
        .route("/settings", get(api::settings::get_settings))
        .route("/settings", put(api::settings::update_settings))
        .merge(login_routes)
        .with_state(state.clone());

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .nest_service("/covers", ServeDir::new(&state.config.storage.cover_dir))
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
