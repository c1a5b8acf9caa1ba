use super::types::{GenerateContentRequest, GenerateContentResponse, VideoGenerationRequest};
use crate::operations::OperationHandle;
use std::future::Future;
use std::pin::Pin;

/// Provider call surface used by the facade and poller. Implemented by the
/// real HTTP client and by scripted mocks in tests.
pub trait MediaProvider: Send + Sync {
    /// Synchronous generation: text, vision, image-out, structured output.
    fn generate<'a>(
        &'a self,
        model: &'a str,
        request: &'a GenerateContentRequest,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<GenerateContentResponse>> + Send + 'a>>;

    /// Submit a long-running video job; returns its handle.
    fn start_video<'a>(
        &'a self,
        model: &'a str,
        request: &'a VideoGenerationRequest,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<OperationHandle>> + Send + 'a>>;

    /// Re-query a pending operation by name.
    fn poll_operation<'a>(
        &'a self,
        operation_name: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<OperationHandle>> + Send + 'a>>;

    /// Fetch artifact bytes with the same credential used for generation.
    fn download<'a>(
        &'a self,
        uri: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<u8>>> + Send + 'a>>;
}

/// Builds a provider per logical request. Keeping construction behind a
/// factory (instead of a shared singleton) makes credential rotation safe and
/// lets tests inject scripted providers.
pub trait ProviderFactory: Send + Sync {
    fn create(&self) -> anyhow::Result<Box<dyn MediaProvider>>;
}
