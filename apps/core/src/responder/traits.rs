use crate::error::AppError;
use async_trait::async_trait;

/// Defines the public interface for an external text-generation service.
///
/// This trait abstracts the remote inference API so the selector can be built with a real
/// HTTP client in production and with doubles in tests.
#[async_trait]
pub trait ExternalResponder: Send + Sync + 'static {
    /// Generates a reply for the raw user message.
    ///
    /// Implementations return an error for anything that is not a usable, non-empty text.
    async fn generate(&self, utterance: &str) -> Result<String, AppError>;
}
