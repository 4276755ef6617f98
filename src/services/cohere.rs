// src/services/cohere.rs
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum CohereError {
    #[error("API key not configured")]
    NotConfigured,

    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}

/// Converts text into a fixed-length embedding vector.
///
/// The matching pipeline only talks to this trait so scoring runs can be
/// exercised without the remote model.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CohereError>;
}

/// Produces free text from a prompt (candidate feedback).
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, CohereError>;
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    texts: Vec<&'a str>,
    model: &'a str,
    input_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    generations: Vec<Generation>,
}

#[derive(Debug, Deserialize)]
struct Generation {
    text: String,
}

const EMBED_MODEL: &str = "embed-english-v3.0";
const GENERATE_MODEL: &str = "command";

#[derive(Debug)]
pub struct CohereService {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl CohereService {
    pub fn new(api_key: Option<String>, base_url: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.cohere.com".to_string()),
        }
    }

    fn api_key(&self) -> Result<&str, CohereError> {
        self.api_key.as_deref().ok_or(CohereError::NotConfigured)
    }

    /// Embed a single text as a search document
    pub async fn embed_text(&self, text: &str) -> Result<Vec<f32>, CohereError> {
        let request = EmbedRequest {
            texts: vec![text],
            model: EMBED_MODEL,
            input_type: "search_document",
        };

        debug!(chars = text.len(), "Sending Cohere embed request");

        let response: EmbedResponse = self
            .post_with_retry("v1/embed", &request)
            .await?
            .json()
            .await
            .map_err(|e| CohereError::InvalidResponse(e.to_string()))?;

        response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| CohereError::InvalidResponse("No embeddings in response".to_string()))
    }

    /// Generate a short completion for a prompt
    pub async fn generate_text(&self, prompt: &str) -> Result<String, CohereError> {
        let request = GenerateRequest {
            model: GENERATE_MODEL,
            prompt,
            max_tokens: 100,
            temperature: 0.4,
        };

        debug!(chars = prompt.len(), "Sending Cohere generate request");

        let response: GenerateResponse = self
            .post_with_retry("v1/generate", &request)
            .await?
            .json()
            .await
            .map_err(|e| CohereError::InvalidResponse(e.to_string()))?;

        let text = response
            .generations
            .first()
            .map(|g| g.text.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CohereError::InvalidResponse("No generations in response".to_string()))?;

        info!(chars = text.len(), "Cohere text generation completed");

        Ok(text)
    }

    /// POST with retry and exponential backoff
    async fn post_with_retry<T: Serialize>(
        &self,
        endpoint: &str,
        request: &T,
    ) -> Result<reqwest::Response, CohereError> {
        let max_retries = 3;
        let mut last_error = None;

        for attempt in 1..=max_retries {
            match self.post(endpoint, request).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    warn!(
                        attempt = attempt,
                        max_retries = max_retries,
                        error = %e,
                        "Cohere API request failed, retrying..."
                    );
                    last_error = Some(e);

                    if attempt < max_retries {
                        let delay = std::time::Duration::from_millis(1000 * 2_u64.pow(attempt - 1));
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| CohereError::RequestFailed("Unknown error".to_string())))
    }

    /// Make a single API request
    async fn post<T: Serialize>(
        &self,
        endpoint: &str,
        request: &T,
    ) -> Result<reqwest::Response, CohereError> {
        let api_key = self.api_key()?;
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| CohereError::RequestFailed(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(CohereError::RateLimitExceeded);
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "Cohere API request failed");
            return Err(CohereError::RequestFailed(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl Embedder for CohereService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CohereError> {
        self.embed_text(text).await
    }
}

#[async_trait]
impl TextGenerator for CohereService {
    async fn generate(&self, prompt: &str) -> Result<String, CohereError> {
        self.generate_text(prompt).await
    }
}
