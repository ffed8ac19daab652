use async_trait::async_trait;

use super::types::ProviderError;

/// Anything that turns a prompt into a complete text response.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}
