//! Health check and client configuration endpoints.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;
use crate::config::{APP_NAME, APP_VERSION};

#[derive(Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub version: &'static str,
}

/// `GET /healthz`: liveness check.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        version: APP_VERSION,
    })
}

#[derive(Serialize)]
pub struct ClientConfig {
    pub app_name: &'static str,
    pub require_password: bool,
}

/// `GET /config`: what the demo UI needs to render its form.
pub async fn client_config(State(ctx): State<ApiContext>) -> Json<ClientConfig> {
    Json(ClientConfig {
        app_name: APP_NAME,
        require_password: ctx.pipeline.require_password(),
    })
}
