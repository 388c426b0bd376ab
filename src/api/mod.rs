pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    Router,
    routing::{get, post},
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::TraceLayer,
};
use std::sync::Arc;

use crate::{
    config::Settings,
    service::ServiceContext,
};
use state::AppState;

/// Room for the text fields of a multipart post on top of the attachment.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn create_app(
    service_context: Arc<ServiceContext>,
    settings: Arc<Settings>,
) -> Router {
    let app_state = AppState::new(service_context, settings);

    Router::new()
        // Root and health endpoints
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))

        // API routes
        .nest("/api", api_routes(app_state.clone()))

        // Add state to the router
        .with_state(app_state)

        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/feed", feed_routes(state))
}

fn feed_routes(state: AppState) -> Router<AppState> {
    let body_limit = state.settings.feed.max_attachment_bytes + FORM_OVERHEAD_BYTES;

    Router::new()
        .route(
            "/",
            get(handlers::feed::list)
                .post(handlers::feed::create)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/:id", axum::routing::delete(handlers::feed::delete))
        .route(
            "/:id/read",
            post(handlers::feed::mark_read).delete(handlers::feed::mark_unread),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_auth,
        ))
}
