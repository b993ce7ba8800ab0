//! Triage submission endpoint.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::pipeline::triage::types::{ChatMessage, TriageResponse};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub password: Option<String>,
}

/// `POST /chat`: run the triage pipeline over a conversation.
pub async fn submit(
    State(ctx): State<ApiContext>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<TriageResponse>, ApiError> {
    let Json(request) = payload?;
    let response = ctx
        .pipeline
        .handle(&request.messages, request.password.as_deref())
        .await?;
    Ok(Json(response))
}
