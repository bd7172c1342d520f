//! AI service integration for try-on image generation
//!
//! Defines the vendor-neutral image generation capability, its request and
//! response shapes, and the Gemini implementation behind it.

pub mod gemini;
pub mod mime;
pub mod mock;
pub mod types;

pub use gemini::GeminiImageClient;
pub use mock::MockImageGenerationClient;
pub use types::{
    Candidate, CandidateContent, InlineImage, ResponsePart, VendorRequest, VendorResponse,
};

use async_trait::async_trait;
use thiserror::Error;

/// Vendor call failures, classified at the client boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VendorError {
    #[error("vendor quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("vendor call failed: {0}")]
    Failure(String),
}

pub type VendorResult<T> = std::result::Result<T, VendorError>;

#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    /// Model identifier, for logging.
    fn model(&self) -> &str;

    /// Send one generation request. Never retried by callers.
    async fn generate(&self, request: &VendorRequest) -> VendorResult<VendorResponse>;
}
