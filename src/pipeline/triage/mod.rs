pub mod types;
pub mod parser;
pub mod prompt;
pub mod orchestrator;

pub use types::*;
pub use parser::*;
pub use prompt::*;
pub use orchestrator::*;

use thiserror::Error;

use crate::pipeline::llm::LlmError;

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Language model unavailable: {0}")]
    UpstreamUnavailable(String),
}

impl From<LlmError> for TriageError {
    fn from(err: LlmError) -> Self {
        TriageError::UpstreamUnavailable(err.to_string())
    }
}
