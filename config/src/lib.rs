//! # Configuration System
//!
//! Centralized configuration management for the commentary gateway.
//!
//! This crate provides:
//! - Configuration structures for every gateway component
//! - Environment variable loading (12-factor app principles)
//! - Configuration file loading (TOML/YAML)
//! - Configuration precedence (CLI > env > file > defaults)
//! - Configuration validation
//!
//! # Best Practices
//!
//! - Uses `validator` crate for input validation
//! - Follows 12-factor app configuration principles
//! - Never serializes or logs the upstream API key

pub mod config;
pub mod file_loader;
pub mod loader;
pub mod precedence;
pub mod validation;

pub use config::{
    CacheConfig, Config, ObservabilityConfig, RateLimitConfig, RetryConfig, ServerConfig,
    UpstreamConfig
};
pub use file_loader::{ConfigFileError, load_from_file, load_from_toml, load_from_yaml};
pub use loader::load_from_env;
pub use precedence::{ConfigOverrides, merge_configs};
pub use validation::validate;
