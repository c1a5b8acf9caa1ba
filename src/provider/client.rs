//! HTTP client for the generative-media provider.

use super::http_client::build_provider_client;
use super::scrub::sanitize_api_error;
use super::traits::{MediaProvider, ProviderFactory};
use super::types::{
    GenerateContentRequest, GenerateContentResponse, Operation, VideoGenerationRequest,
};
use crate::config::ProviderConfig;
use crate::credentials::CredentialBroker;
use crate::operations::OperationHandle;
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub struct GeminiClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl GeminiClient {
    pub fn new(config: &ProviderConfig, api_key: String) -> Self {
        Self {
            base_url: config.base_url.clone(),
            api_key,
            client: build_provider_client(config.request_timeout_secs),
        }
    }

    fn model_path(model: &str) -> String {
        if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        }
    }

    async fn post_json<Req: serde::Serialize, Resp: serde::de::DeserializeOwned>(
        &self,
        url: String,
        request: &Req,
    ) -> anyhow::Result<Resp> {
        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await?;
        let response = Self::ensure_success_status(response).await?;
        Ok(response.json().await?)
    }

    async fn ensure_success_status(
        response: reqwest::Response,
    ) -> anyhow::Result<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            let sanitized = sanitize_api_error(&error_text);
            anyhow::bail!("provider API error ({status}): {sanitized}");
        }
        Ok(response)
    }

    fn handle_from(operation: Operation) -> OperationHandle {
        let video_uri = operation.video_uri().map(String::from);
        OperationHandle {
            name: operation.name,
            done: operation.done,
            video_uri,
            failure: operation.error.map(|e| sanitize_api_error(&e.message)),
        }
    }
}

impl MediaProvider for GeminiClient {
    fn generate<'a>(
        &'a self,
        model: &'a str,
        request: &'a GenerateContentRequest,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<GenerateContentResponse>> + Send + 'a>> {
        Box::pin(async move {
            let url = format!(
                "{}/{}:generateContent",
                self.base_url,
                Self::model_path(model)
            );
            let result: GenerateContentResponse = self.post_json(url, request).await?;
            if let Some(err) = result.error.as_ref() {
                anyhow::bail!("provider API error: {}", sanitize_api_error(&err.message));
            }
            Ok(result)
        })
    }

    fn start_video<'a>(
        &'a self,
        model: &'a str,
        request: &'a VideoGenerationRequest,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<OperationHandle>> + Send + 'a>> {
        Box::pin(async move {
            let url = format!(
                "{}/{}:predictLongRunning",
                self.base_url,
                Self::model_path(model)
            );
            let operation: Operation = self.post_json(url, request).await?;
            Ok(Self::handle_from(operation))
        })
    }

    fn poll_operation<'a>(
        &'a self,
        operation_name: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<OperationHandle>> + Send + 'a>> {
        Box::pin(async move {
            let url = format!("{}/{operation_name}", self.base_url);
            let response = self
                .client
                .get(url)
                .query(&[("key", self.api_key.as_str())])
                .send()
                .await?;
            let response = Self::ensure_success_status(response).await?;
            let operation: Operation = response.json().await?;
            Ok(Self::handle_from(operation))
        })
    }

    fn download<'a>(
        &'a self,
        uri: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<u8>>> + Send + 'a>> {
        Box::pin(async move {
            let response = self
                .client
                .get(uri)
                .query(&[("key", self.api_key.as_str())])
                .send()
                .await?;
            let response = Self::ensure_success_status(response).await?;
            Ok(response.bytes().await?.to_vec())
        })
    }
}

/// Builds a [`GeminiClient`] per request, resolving the credential fresh each
/// time through the broker.
pub struct GeminiFactory {
    config: ProviderConfig,
    broker: Arc<dyn CredentialBroker>,
}

impl GeminiFactory {
    pub fn new(config: ProviderConfig, broker: Arc<dyn CredentialBroker>) -> Self {
        Self { config, broker }
    }
}

impl ProviderFactory for GeminiFactory {
    fn create(&self) -> anyhow::Result<Box<dyn MediaProvider>> {
        let api_key = self.broker.resolve()?;
        Ok(Box::new(GeminiClient::new(&self.config, api_key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_path_prefixes_bare_names() {
        assert_eq!(GeminiClient::model_path("veo-3.1"), "models/veo-3.1");
        assert_eq!(GeminiClient::model_path("models/veo-3.1"), "models/veo-3.1");
    }

    #[test]
    fn handle_from_maps_failure_and_uri() {
        let operation: Operation = serde_json::from_value(serde_json::json!({
            "name": "operations/abc",
            "done": true,
            "error": { "message": "internal failure key=secret123" }
        }))
        .unwrap();
        let handle = GeminiClient::handle_from(operation);
        assert!(handle.done);
        assert!(handle.video_uri.is_none());
        let failure = handle.failure.unwrap();
        assert!(failure.contains("internal failure"));
        assert!(!failure.contains("secret123"));
    }
}
