use super::{ImageGenerationService, ResponsePart, VendorRequest, VendorResponse, VendorResult};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Image returned when no scripted outcome is configured ("mock-image").
pub const DEFAULT_MOCK_IMAGE: &str = "bW9jay1pbWFnZQ==";

/// Scripted stand-in for the vendor, recording every request it receives.
#[derive(Clone)]
pub struct MockImageGenerationClient {
    outcomes: Arc<Mutex<Vec<VendorResult<VendorResponse>>>>,
    requests: Arc<Mutex<Vec<VendorRequest>>>,
    call_count: Arc<Mutex<usize>>,
    delay: Option<Duration>,
}

impl MockImageGenerationClient {
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            delay: None,
        }
    }

    pub fn with_outcome(self, outcome: VendorResult<VendorResponse>) -> Self {
        self.outcomes.lock().unwrap().push(outcome);
        self
    }

    pub fn with_response(self, response: VendorResponse) -> Self {
        self.with_outcome(Ok(response))
    }

    /// Sleep this long before answering, to exercise caller timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn requests(&self) -> Vec<VendorRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockImageGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageGenerationService for MockImageGenerationClient {
    fn model(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &VendorRequest) -> VendorResult<VendorResponse> {
        let outcome = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            self.requests.lock().unwrap().push(request.clone());

            let outcomes = self.outcomes.lock().unwrap();
            if outcomes.is_empty() {
                Ok(VendorResponse::with_parts(vec![ResponsePart::image(
                    "image/png",
                    DEFAULT_MOCK_IMAGE,
                )]))
            } else {
                outcomes[(*count - 1) % outcomes.len()].clone()
            }
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        outcome
    }
}
