//! # Commentary Gateway Core
//!
//! Shared types and traits for the commentary gateway.
//!
//! This crate provides:
//! - The five-field market input and its validated form
//! - Field bounds and all-violations validation
//! - Prompt construction for the inference service
//! - The [`InferenceBackend`] trait every upstream strategy implements

pub mod prompt;
pub mod traits;
pub mod types;
pub mod validation;

pub use prompt::CommentaryRequest;
pub use traits::InferenceBackend;
pub use types::{ClientId, Commentary, MarketField, MarketInput, MarketParams, Usage};
pub use validation::FieldBounds;
