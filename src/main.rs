//! Castle Crew Glazing site backend
//!
//! Customer reviews, multi-step lead intake with draft autosave, and email
//! delivery of submitted leads, over a small SQLite key/value store.

mod api;
mod config;
mod db;
mod errors;
mod intake;
mod models;
mod notify;
mod reviews;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::{Config, LogFormat};
use db::{SqliteStore, Store};
use intake::SessionRegistry;
use notify::{DisabledSender, NotificationSender, ResendMailer};
use reviews::ReviewStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub reviews: Arc<ReviewStore>,
    pub sender: Arc<dyn NotificationSender>,
    pub sessions: Arc<SessionRegistry>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        sender: Arc<dyn NotificationSender>,
        config: Config,
    ) -> Self {
        Self {
            reviews: Arc::new(ReviewStore::new(store.clone())),
            store,
            sender,
            sessions: Arc::new(SessionRegistry::new(config.session_idle)),
            config: Arc::new(config),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let json = config.log_format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(fmt::layer))
        .init();

    tracing::info!("Starting glazing site backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Lead inbox: {}", config.business_email);

    // Initialize store
    let pool = db::init_database(&config.db_path).await?;
    let store: Arc<dyn Store> = Arc::new(SqliteStore::new(pool));

    // Email delivery is optional; without a key every submission fails over
    // to the fallback phone message
    let sender: Arc<dyn NotificationSender> = match &config.resend_api_key {
        Some(key) => Arc::new(ResendMailer::new(
            key.clone(),
            config.mail_from.clone(),
            config.fallback_phone.clone(),
            &config.resend_base_url,
        )?),
        None => {
            tracing::warn!("No RESEND_API_KEY configured. Email delivery is disabled!");
            Arc::new(DisabledSender)
        }
    };

    let bind_addr = config.bind_addr;
    let state = AppState::new(store, sender, config);

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Reviews
        .route("/reviews", get(api::list_reviews).post(api::create_review))
        .route("/reviews/stats", get(api::review_stats))
        .route("/reviews/page", get(api::review_page))
        // Intake wizard
        .route("/intake", post(api::create_session))
        .route(
            "/intake/{id}",
            get(api::get_session).delete(api::delete_session),
        )
        .route("/intake/{id}/fields/{field}", put(api::set_field))
        .route("/intake/{id}/fields/{field}/toggle", post(api::toggle_option))
        .route("/intake/{id}/advance", post(api::advance))
        .route("/intake/{id}/retreat", post(api::retreat))
        .route("/intake/{id}/submit", post(api::submit))
        .route("/intake/{id}/retry", post(api::retry))
        // Direct delivery
        .route("/send-email", post(api::send_email));

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
