mod errors;
mod handlers;
mod middleware;
mod state;

use axum::{Router, extract::DefaultBodyLimit, middleware as axum_middleware, routing::post};
use tower_http::trace::TraceLayer;

pub use errors::HttpError;
pub use state::{HttpState, TOKEN_HEADER, generate_token};

/// Largest accepted upload body.
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

pub fn router(state: HttpState) -> Router<()> {
    let api = Router::new()
        .route("/gpx_ingest", post(handlers::gpx_ingest))
        .route(
            "/gpx_ingest_upload",
            post(handlers::gpx_ingest_upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/runs_list", post(handlers::runs_list))
        .route("/run_get", post(handlers::run_get))
        .route("/runs_stats", post(handlers::runs_stats))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_token,
        ));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
