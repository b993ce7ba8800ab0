//! Shared types for the HTTP layer.

use std::sync::Arc;

use crate::pipeline::triage::TriagePipeline;

/// Shared context for all routes. Cloned per request; the pipeline is
/// immutable after startup.
#[derive(Clone)]
pub struct ApiContext {
    pub pipeline: Arc<TriagePipeline>,
}

impl ApiContext {
    pub fn new(pipeline: Arc<TriagePipeline>) -> Self {
        Self { pipeline }
    }
}
