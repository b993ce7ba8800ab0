pub mod llm;
pub mod safety;
pub mod triage;
