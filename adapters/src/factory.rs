use crate::{AdapterError, OpenAiBackend, SyntheticBackend};
use config::UpstreamConfig;
use gw_core::InferenceBackend;
use std::sync::Arc;

/// Builds the inference backend named by `upstream.provider`.
///
/// `auto` picks OpenAI when an API key is configured and the synthetic
/// backend otherwise.
pub fn build_backend(config: &UpstreamConfig) -> Result<Arc<dyn InferenceBackend>, AdapterError> {
    match config.provider.as_str() {
        "openai" => openai(config),
        "synthetic" => {
            tracing::warn!("Synthetic backend selected, commentary will not come from a model");
            Ok(Arc::new(SyntheticBackend::new()))
        }
        "auto" if config.has_api_key() => openai(config),
        "auto" => {
            tracing::warn!("No API key configured, falling back to synthetic backend");
            Ok(Arc::new(SyntheticBackend::new()))
        }
        other => Err(AdapterError::UnknownProvider(other.to_string()))
    }
}

fn openai(config: &UpstreamConfig) -> Result<Arc<dyn InferenceBackend>, AdapterError> {
    let backend = OpenAiBackend::from_config(config)?;
    tracing::info!(model = backend.model(), url = %config.api_url, "Using OpenAI backend");
    Ok(Arc::new(backend))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream(provider: &str, api_key: Option<&str>) -> UpstreamConfig {
        UpstreamConfig {
            provider: provider.to_string(),
            api_key: api_key.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_auto_without_key_is_synthetic() {
        let backend = build_backend(&upstream("auto", None)).unwrap();
        assert!(backend.is_synthetic());

        let backend = build_backend(&upstream("auto", Some("  "))).unwrap();
        assert!(backend.is_synthetic());
    }

    #[test]
    fn test_auto_with_key_is_openai() {
        let backend = build_backend(&upstream("auto", Some("sk-test"))).unwrap();
        assert_eq!(backend.name(), "openai");
        assert!(!backend.is_synthetic());
    }

    #[test]
    fn test_explicit_openai_requires_key() {
        assert!(matches!(
            build_backend(&upstream("openai", None)),
            Err(AdapterError::MissingApiKey(_))
        ));
    }

    #[test]
    fn test_explicit_synthetic_ignores_key() {
        let backend = build_backend(&upstream("synthetic", Some("sk-test"))).unwrap();
        assert!(backend.is_synthetic());
    }

    #[test]
    fn test_unknown_provider() {
        assert!(matches!(
            build_backend(&upstream("bedrock", None)),
            Err(AdapterError::UnknownProvider(p)) if p == "bedrock"
        ));
    }
}
