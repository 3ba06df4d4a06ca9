use crate::error::AppError;
use crate::responder::traits::ExternalResponder;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

/// Client for the Hugging Face hosted inference API.
#[derive(Clone)]
pub struct HuggingFaceResponder {
    client: Client,
    model_url: Url,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

/// The API answers with a list for text2text models and a bare object for some others.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Batch(Vec<GeneratedText>),
    Single(GeneratedText),
}

impl InferenceResponse {
    fn into_text(self) -> Option<String> {
        match self {
            InferenceResponse::Batch(items) => items.into_iter().next().map(|g| g.generated_text),
            InferenceResponse::Single(g) => Some(g.generated_text),
        }
    }
}

impl HuggingFaceResponder {
    /// Creates a responder; `timeout` bounds every request end to end.
    pub fn new(model_url: Url, api_key: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            model_url,
            api_key: api_key.into(),
        })
    }

    fn build_request(&self, utterance: &str) -> Result<reqwest::RequestBuilder, AppError> {
        let mut headers = HeaderMap::new();
        let auth_value = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| AppError::Config(format!("Invalid API key header: {}", e)))?;
        headers.insert(AUTHORIZATION, auth_value);

        Ok(self
            .client
            .post(self.model_url.clone())
            .headers(headers)
            .json(&InferenceRequest { inputs: utterance }))
    }
}

#[async_trait]
impl ExternalResponder for HuggingFaceResponder {
    #[instrument(skip(self, utterance), fields(model = %self.model_url))]
    async fn generate(&self, utterance: &str) -> Result<String, AppError> {
        info!("Requesting generated text ({} chars)", utterance.len());

        let res = self.build_request(utterance)?.send().await?;
        let status = res.status();

        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(AppError::Responder(format!(
                "Inference request failed with status {}: {}",
                status, body
            )));
        }

        let payload: InferenceResponse = res
            .json()
            .await
            .map_err(|e| AppError::Responder(format!("Malformed inference payload: {}", e)))?;

        match payload.into_text() {
            Some(text) if !text.trim().is_empty() => Ok(text),
            Some(_) => Err(AppError::Responder("Inference returned empty text".to_string())),
            None => Err(AppError::Responder("Inference returned no candidates".to_string())),
        }
    }
}
