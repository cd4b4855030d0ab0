// Library exports for testing and external use

pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    error_handling::HandleErrorLayer,
    routing::{get, post},
    Router,
};
use std::{sync::Arc, time::Duration};
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use handlers::{auth, categories, health, posts, upload, users};
use services::{media_storage::MediaStorage, store::BlogStore, token::TokenService};
use utils::config::AppConfig;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn BlogStore>,
    pub media: Arc<dyn MediaStorage>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn BlogStore>,
        media: Arc<dyn MediaStorage>,
    ) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, config.jwt_expiry_hours);
        Self {
            config: Arc::new(config),
            store,
            media,
            tokens: Arc::new(tokens),
        }
    }
}

/// Builds the full application router with its middleware stack
pub fn build_router(app_state: AppState) -> Router {
    let timeout = Duration::from_secs(app_state.config.request_timeout_seconds);

    // The original frontend is served from another origin
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_origin(Any);

    let api = Router::new()
        .route("/upload", post(upload::upload_image))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/users", get(users::list_users).post(auth::register))
        .route("/users/me", get(users::current_user))
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route(
            "/posts/:id",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        .route(
            "/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/categories/:id",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
        .method_not_allowed_fallback(health::method_not_allowed);

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .nest("/api", api)
        .fallback(health::not_found)
        .method_not_allowed_fallback(health::method_not_allowed)
        .with_state(app_state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(HandleErrorLayer::new(health::handle_middleware_error))
                .layer(TimeoutLayer::new(timeout))
                .layer(cors),
        )
}
