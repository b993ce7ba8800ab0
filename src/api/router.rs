//! Triage API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//!
//! Layers (outermost → innermost):
//! 1. Request tracing → 2. `Cache-Control: no-store` → 3. Body size limit

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::header::{HeaderValue, CACHE_CONTROL};
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::pipeline::triage::TriagePipeline;

/// Largest accepted request body. A chat history is plain text.
pub const MAX_BODY_BYTES: usize = 256 * 1024;

/// Build the triage API router around a shared pipeline.
pub fn triage_router(pipeline: Arc<TriagePipeline>) -> Router {
    let ctx = ApiContext::new(pipeline);

    Router::new()
        .route("/chat", post(endpoints::chat::submit))
        .route("/healthz", get(endpoints::health::check))
        .route("/config", get(endpoints::health::client_config))
        .with_state(ctx)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                // Triage answers are per-person; never cache them
                .layer(SetResponseHeaderLayer::overriding(
                    CACHE_CONTROL,
                    HeaderValue::from_static("no-store"),
                ))
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
}
