//! Remote tokenizer and commit message inference service.

pub mod client;
pub mod types;

pub use client::{DEFAULT_ENDPOINT, HttpInferenceService, InferenceService};
pub use types::{InferenceRequest, PerFileMessage, Route, TokenizeRequest, TokenizeResponse};

#[cfg(test)]
pub use client::MockInferenceService;
