//! HTTP surface for the triage pipeline.
//!
//! A thin axum layer: `POST /chat` submits a conversation, `GET /healthz`
//! and `GET /config` serve the demo UI. All triage logic lives in
//! `crate::pipeline`.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use router::triage_router;
pub use server::{start_server_on, ServerError, TriageServer};
pub use types::ApiContext;
