//! Study Simple Backend
//!
//! REST backend for the Study Simple student site: blogs, event proposals,
//! support tickets, podcast subscribers and marketplace listings on SQLite,
//! plus email, image hosting and Spotify integrations.

mod adapters;
mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use adapters::{CloudinaryUploader, ImageHost, Mailer, PlaylistSource, ResendMailer, SpotifyClient};
use config::Config;
use db::{Database, PoolSettings, Repository};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Arc<Config>,
    pub mailer: Option<Arc<dyn Mailer>>,
    pub images: Option<Arc<dyn ImageHost>>,
    pub playlists: Option<Arc<dyn PlaylistSource>>,
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

    tracing::info!("Starting Study Simple Backend");
    tracing::info!("Database: {}", config.database_url);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.admin_key.is_none() {
        tracing::warn!("No admin key configured (STUDY_ADMIN_KEY). Moderation routes are open!");
    }

    let mailer: Option<Arc<dyn Mailer>> = match &config.email {
        Some(email) => Some(Arc::new(ResendMailer::new(email))),
        None => {
            tracing::warn!("RESEND_API_KEY or EMAIL_FROM not set. Tutor contact is disabled");
            None
        }
    };
    let images: Option<Arc<dyn ImageHost>> = match &config.cloudinary {
        Some(cloudinary) => Some(Arc::new(CloudinaryUploader::new(cloudinary))),
        None => {
            tracing::warn!("Cloudinary credentials not set. Image URLs are stored as given");
            None
        }
    };
    let playlists: Option<Arc<dyn PlaylistSource>> = match &config.spotify {
        Some(spotify) => Some(Arc::new(SpotifyClient::new(spotify))),
        None => {
            tracing::warn!("Spotify credentials not set. Playlist endpoint is disabled");
            None
        }
    };

    // Open the pool up front so a bad DATABASE_URL fails at startup
    let settings = PoolSettings {
        max_connections: config.db_max_connections,
        ..PoolSettings::default()
    };
    let database = Arc::new(Database::new(config.database_url.clone(), settings));
    database.connect().await?;
    let repo = Arc::new(Repository::new(database));

    // Create application state
    let state = AppState {
        repo,
        config: Arc::new(config.clone()),
        mailer,
        images,
        playlists,
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

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

    // Guard for moderation methods; public methods on the same path stay open
    let admin_key = state.config.admin_key.clone();
    let admin = middleware::from_fn(move |req: Request, next: middleware::Next| {
        auth::admin_key_layer(admin_key.clone(), req, next)
    });

    // Image uploads need more room than axum's default body cap
    let upload_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    let api_routes = Router::new()
        // Blogs
        .route(
            "/blogs",
            get(api::list_blog_posts)
                .post(api::create_blog_post)
                .layer(upload_limit),
        )
        .route(
            "/blogs/{id}",
            patch(api::update_blog_post)
                .delete(api::delete_blog_post)
                .route_layer(admin.clone())
                .get(api::get_blog_post),
        )
        .route(
            "/blogs/{id}/comments",
            get(api::list_comments).post(api::add_comment),
        )
        .route("/blogs/{id}/like", post(api::like_blog_post))
        .route("/blogs/{id}/dislike", post(api::dislike_blog_post))
        .route("/blogs/{id}/unlike", post(api::unlike_blog_post))
        // Event proposals
        .route(
            "/event-proposals",
            get(api::list_event_proposals)
                .route_layer(admin.clone())
                .post(api::create_event_proposal),
        )
        .route(
            "/event-proposals/{id}",
            get(api::get_event_proposal)
                .patch(api::update_event_proposal)
                .delete(api::delete_event_proposal)
                .route_layer(admin.clone()),
        )
        // Support tickets
        .route(
            "/support",
            get(api::list_support_tickets)
                .route_layer(admin.clone())
                .post(api::create_support_ticket),
        )
        .route(
            "/support/{id}",
            get(api::get_support_ticket)
                .patch(api::update_support_ticket)
                .delete(api::delete_support_ticket)
                .route_layer(admin.clone()),
        )
        // Podcast subscribers
        .route(
            "/podcast-subscribers",
            get(api::list_subscribers)
                .route_layer(admin.clone())
                .post(api::subscribe),
        )
        .route(
            "/podcast-subscribers/{id}",
            get(api::get_subscriber)
                .patch(api::update_subscriber)
                .route_layer(admin)
                .delete(api::unsubscribe),
        )
        // Listings
        .route(
            "/listings",
            get(api::list_listings)
                .post(api::create_listing)
                .layer(upload_limit),
        )
        .route(
            "/listings/{id}",
            get(api::get_listing)
                .patch(api::update_listing)
                .delete(api::delete_listing),
        )
        // Integrations
        .route("/spotify/playlists", get(api::list_playlists))
        .route("/tutors/contact", post(api::contact_tutor));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
