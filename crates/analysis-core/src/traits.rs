use async_trait::async_trait;
use crate::GenerationError;

/// Remote language model seam: one prompt in, one block of prose out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    fn model_name(&self) -> &str;
}
