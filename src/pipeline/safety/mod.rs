pub mod types;
pub mod urgency;
pub mod redact;
pub mod guardrails;

pub use types::*;
pub use urgency::*;
pub use redact::*;
pub use guardrails::*;
