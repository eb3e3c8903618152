use crate::prompt::CommentaryRequest;
use crate::types::Commentary;
use async_trait::async_trait;
use errors::UpstreamFailure;

/// A strategy that turns a rendered request into commentary.
///
/// Implementations perform exactly one attempt and classify its failure;
/// timeouts and retries are layered on top by the resilient client.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Short identifier used in logs and health reports.
    fn name(&self) -> &str;

    /// True for offline strategies that never reach a real model.
    fn is_synthetic(&self) -> bool {
        false
    }

    async fn generate(&self, request: &CommentaryRequest) -> Result<Commentary, UpstreamFailure>;
}
