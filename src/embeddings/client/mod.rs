
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::api::{ApiError, classify_ureq_error};

const DEFAULT_TIMEOUT_SECONDS: u64 = 120;

const IMAGE_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp", ".svg", ".tiff",
];

/// Client for the embedding generation service
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    base_url: Url,
    agent: ureq::Agent,
}

/// Classification of content handed to the embedding service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Image,
}

/// One weighted field of a combined multi-field embedding request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldInput {
    pub content: String,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub weight: f32,
    pub model_name: String,
}

#[derive(Debug, Serialize)]
struct TextEmbeddingRequest<'a> {
    texts: &'a [String],
    model_name: &'a str,
    normalize: bool,
}

#[derive(Debug, Serialize)]
struct ImageEmbeddingRequest<'a> {
    images: &'a [String],
    model_name: &'a str,
    normalize: bool,
}

#[derive(Debug, Serialize)]
struct MultiFieldEmbeddingRequest<'a> {
    fields: &'a [FieldInput],
    combine_method: &'a str,
    normalize: bool,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embeddings: Vec<Vec<f32>>,
    #[serde(default)]
    #[expect(dead_code, reason = "part of the service's response contract")]
    model_name: String,
    #[serde(default)]
    #[expect(dead_code, reason = "part of the service's response contract")]
    dimensions: usize,
}

impl EmbeddingClient {
    #[inline]
    pub fn new(base_url: Url) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Self { base_url, agent }
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        self
    }

    /// Check that the embedding service is reachable
    #[inline]
    pub fn health_check(&self) -> Result<(), ApiError> {
        let url = self.join("embeddings/models")?;
        debug!("Checking embedding service at {}", url);

        self.agent
            .get(url.as_str())
            .call()
            .map_err(classify_ureq_error)?;

        Ok(())
    }

    /// Generate normalized text embeddings, one per input
    #[inline]
    pub fn embed_text(
        &self,
        texts: &[String],
        model_name: &str,
        normalize: bool,
    ) -> Result<Vec<Vec<f32>>, ApiError> {
        debug!(
            "Requesting text embeddings for {} inputs with model {}",
            texts.len(),
            model_name
        );

        let request = TextEmbeddingRequest {
            texts,
            model_name,
            normalize,
        };
        self.post_embeddings("embeddings/text", &request)
    }

    /// Generate normalized image embeddings from URLs or data URIs
    #[inline]
    pub fn embed_image(
        &self,
        images: &[String],
        model_name: &str,
        normalize: bool,
    ) -> Result<Vec<Vec<f32>>, ApiError> {
        debug!(
            "Requesting image embeddings for {} inputs with model {}",
            images.len(),
            model_name
        );

        let request = ImageEmbeddingRequest {
            images,
            model_name,
            normalize,
        };
        self.post_embeddings("embeddings/image", &request)
    }

    /// Generate a single embedding from several weighted fields, blended
    /// server-side as a weighted average
    #[inline]
    pub fn embed_multi_field(
        &self,
        fields: &[FieldInput],
        normalize: bool,
    ) -> Result<Vec<Vec<f32>>, ApiError> {
        debug!(
            "Requesting combined embedding from {} fields",
            fields.len()
        );

        let request = MultiFieldEmbeddingRequest {
            fields,
            combine_method: "weighted_average",
            normalize,
        };
        self.post_embeddings("embeddings/multi-field", &request)
    }

    fn post_embeddings<T: Serialize>(
        &self,
        path: &str,
        request: &T,
    ) -> Result<Vec<Vec<f32>>, ApiError> {
        let url = self.join(path)?;
        let body = serde_json::to_string(request)
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        let response_text = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .send(&body)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(classify_ureq_error)?;

        let response: EmbeddingResponse = serde_json::from_str(&response_text)
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        Ok(response.embeddings)
    }

    fn join(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::Url(e.to_string()))
    }
}

/// Classify row content for embedding: image URLs and data URIs go to the
/// image model, everything else is text.
#[inline]
pub fn classify_content(content: &str) -> ContentKind {
    let trimmed = content.trim();

    if trimmed.starts_with("data:image/") {
        return ContentKind::Image;
    }

    let lower = trimmed.to_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        let path = lower.split(['?', '#']).next().unwrap_or(&lower);
        if IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            return ContentKind::Image;
        }
    }

    ContentKind::Text
}
