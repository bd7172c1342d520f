use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentRequest, GenerationConfig, InlineData, Part};
use crate::ai::{ImageGenerationService, VendorRequest, VendorResponse, VendorResult};
use async_trait::async_trait;
use std::time::Duration;

pub struct GeminiImageClient {
    http: GeminiHttpClient,
}

impl GeminiImageClient {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        Self::new_with_client(api_key, model, timeout, reqwest::Client::new())
    }

    pub fn new_with_client(
        api_key: String,
        model: String,
        timeout: Duration,
        client: reqwest::Client,
    ) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(api_key, model, timeout, client),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    fn build_request(request: &VendorRequest) -> GenerateContentRequest {
        let mut parts = Vec::with_capacity(request.images.len() + 1);
        parts.push(Part::Text {
            text: request.instruction.clone(),
        });
        parts.extend(request.images.iter().map(|image| Part::InlineData {
            inline_data: InlineData {
                mime_type: image.mime_type.clone(),
                data: image.data.clone(),
            },
        }));

        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
            },
        }
    }
}

#[async_trait]
impl ImageGenerationService for GeminiImageClient {
    fn model(&self) -> &str {
        self.http.model()
    }

    async fn generate(&self, request: &VendorRequest) -> VendorResult<VendorResponse> {
        let body = Self::build_request(request);

        tracing::debug!(
            "Sending try-on request to Gemini model {} with {} image(s)",
            self.http.model(),
            request.images.len()
        );

        self.http.generate_content(&body).await
    }
}
