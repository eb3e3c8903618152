//! Inference provider adapters.
//!
//! Each adapter implements [`gw_core::InferenceBackend`] and performs a
//! single attempt; retries and timeouts live in the governance layer.

pub mod factory;
pub mod openai;
pub mod synthetic;

pub use factory::build_backend;
pub use openai::OpenAiBackend;
pub use synthetic::SyntheticBackend;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Provider '{0}' requires an API key")]
    MissingApiKey(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error)
}
