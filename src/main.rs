//! Checklist Reports Backend
//!
//! Restaurant checklist completion reports over SQLite, with Tantivy template
//! search and debounced cache invalidation driven by an in-process change feed.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod realtime;
mod render;
mod reports;
mod search;
mod views;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::ApiKeys;
use config::Config;
use db::Repository;
use realtime::ChangeFeed;
use reports::{ReportCache, ReportService};
use search::SearchIndex;
use views::SessionStore;

const CHANGE_FEED_CAPACITY: usize = 1024;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub search: Arc<SearchIndex>,
    pub config: Arc<Config>,
    pub changes: ChangeFeed,
    pub reports: ReportService,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    /// Wire up services around an opened repository and index.
    pub fn new(repo: Arc<Repository>, search: Arc<SearchIndex>, config: Config) -> Self {
        let cache = Arc::new(ReportCache::new());
        let reports = ReportService::new(repo.clone(), cache);
        Self {
            sessions: Arc::new(SessionStore::new(
                reports.clone(),
                config.session_idle_timeout,
            )),
            repo,
            search,
            config: Arc::new(config),
            changes: ChangeFeed::new(CHANGE_FEED_CAPACITY),
            reports,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Checklist Reports Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Index path: {:?}", config.index_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!(
        "Default locale: {}, invalidation debounce: {:?}, session idle timeout: {:?}",
        config.default_locale.code(),
        config.invalidation_debounce,
        config.session_idle_timeout
    );

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (REPORTS_API_PSK). Authentication is disabled!");
    } else if config.viewer_psk.is_none() {
        tracing::info!("No viewer PSK configured (REPORTS_VIEWER_PSK); only the admin key is accepted");
    }

    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    let search = Arc::new(SearchIndex::open(&config.index_path)?);
    let templates = repo.list_templates(false).await?;
    search.rebuild(&templates).await?;

    let state = AppState::new(repo, search, config.clone());
    realtime::spawn_invalidator(
        &state.changes,
        state.reports.cache(),
        config.invalidation_debounce,
    );
    views::spawn_session_sweeper(state.sessions.clone());

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let keys = ApiKeys {
        admin: state.config.api_psk.clone(),
        viewer: state.config.viewer_psk.clone(),
    };

    let api_routes = Router::new()
        .route("/revision", get(api::get_revision))
        // Restaurants
        .route(
            "/restaurants",
            get(api::list_restaurants).post(api::create_restaurant),
        )
        .route(
            "/restaurants/{id}",
            get(api::get_restaurant).put(api::update_restaurant),
        )
        .route(
            "/restaurants/{id}/assignments",
            get(api::list_restaurant_assignments),
        )
        .route(
            "/restaurants/{id}/notifications",
            get(api::list_notifications),
        )
        .route(
            "/restaurants/{id}/notifications/read-all",
            post(api::mark_all_notifications_read),
        )
        // Templates
        .route(
            "/templates",
            get(api::list_templates).post(api::create_template),
        )
        .route("/templates/catalog", get(api::template_catalog))
        .route("/templates/search", get(api::search_templates))
        .route(
            "/templates/{id}",
            get(api::get_template).put(api::update_template),
        )
        // Assignments
        .route("/assignments", post(api::create_assignment))
        .route(
            "/assignments/{id}",
            put(api::update_assignment).delete(api::delete_assignment),
        )
        // Submissions
        .route(
            "/submissions",
            get(api::list_submissions).post(api::create_submission),
        )
        .route("/submissions/{id}", get(api::get_submission))
        // Notifications
        .route("/notifications", post(api::create_notification))
        .route("/notifications/{id}", delete(api::delete_notification))
        .route("/notifications/{id}/read", put(api::mark_notification_read))
        // Reports
        .route("/reports/overview", get(api::fleet_overview))
        .route("/reports/restaurants/{id}", get(api::restaurant_report))
        .route("/reports/submissions/{id}", get(api::submission_report))
        // Navigation sessions
        .route("/sessions", post(api::create_session))
        .route(
            "/sessions/{id}",
            get(api::get_session).delete(api::delete_session),
        )
        .route("/sessions/{id}/navigate", post(api::navigate_session))
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(keys.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
