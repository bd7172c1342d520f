use super::types::ErrorEnvelope;
use crate::ai::{VendorError, VendorResult};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Lightweight Gemini REST client.
pub struct GeminiHttpClient {
    pub(crate) client: Client,
    pub(crate) api_key: String,
    model: String,
    pub(crate) base_url: String,
    timeout: Duration,
}

impl GeminiHttpClient {
    /// Construct a Gemini client.
    ///
    /// `model` should be the bare model ID (for example `gemini-2.5-flash-image`);
    /// a leading `models/` is stripped.
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        Self::new_with_client(api_key, model, timeout, Client::new())
    }

    pub fn new_with_client(
        api_key: String,
        model: String,
        timeout: Duration,
        client: Client,
    ) -> Self {
        let model = model.strip_prefix("models/").unwrap_or(&model).to_string();

        Self {
            client,
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Returns the configured model ID without the `models/` prefix.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Calls Gemini's `generateContent` endpoint.
    pub async fn generate_content<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        request: &Req,
    ) -> VendorResult<Resp> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to Gemini: {}", e);
                VendorError::Failure(format!("request failed: {}", e))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::error!("Failed to read Gemini response body: {}", e);
            VendorError::Failure(format!("failed to read body: {}", e))
        })?;

        if !status.is_success() {
            tracing::error!("Gemini API error (status {}): {}", status, body);
            return Err(classify_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}", e);
            VendorError::Failure(format!("Failed to parse Gemini response: {}", e))
        })
    }
}

/// Map a non-2xx Gemini response onto the vendor error taxonomy.
pub(crate) fn classify_error(status: StatusCode, body: &str) -> VendorError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let message = envelope
        .as_ref()
        .and_then(|e| e.error.message.clone())
        .unwrap_or_else(|| body.to_string());

    let is_quota = status == StatusCode::TOO_MANY_REQUESTS
        || envelope.as_ref().is_some_and(|e| e.error.is_quota());

    if is_quota {
        VendorError::QuotaExceeded(format!("status {}: {}", status, message))
    } else {
        VendorError::Failure(format!("status {}: {}", status, message))
    }
}
