//! Try-on generation: stage uploads, call the vendor once, and always hand
//! back an image.
//!
//! Vendor-side failures never escape [`LookGenerator::generate`]; they are
//! folded into [`GenerationResult::Fallback`] with a reason code. Only a
//! failure to stage or read back the uploads is returned as an error.

use crate::ai::{ImageGenerationService, VendorError, VendorRequest, VendorResponse};
use crate::encoding::{Base64Encoder, ImageEncoder};
use crate::models::{Config, EncodedImage, FallbackReason, GarmentCategory, GenerationResult};
use crate::staging::{TransientInputFile, UploadStager};
use crate::{ai::mime, prompts, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const DEFAULT_GENERATED_MIME: &str = "image/png";

/// An uploaded image as received at the HTTP boundary.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl UploadedImage {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: None,
        }
    }
}

/// One try-on request. Both images are required by construction.
#[derive(Debug, Clone)]
pub struct TryOnRequest {
    pub category: GarmentCategory,
    pub subject_image: UploadedImage,
    pub garment_image: UploadedImage,
}

/// Outcome of walking a vendor response for the generated image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageExtraction {
    NoCandidates,
    NoContent,
    NoParts,
    NoInlineImage,
    Found { mime_type: String, data: String },
}

/// Select the first inline image part of the first candidate.
pub fn extract_image(response: &VendorResponse) -> ImageExtraction {
    let candidate = match response.candidates.as_deref() {
        Some([first, ..]) => first,
        _ => return ImageExtraction::NoCandidates,
    };

    let Some(content) = &candidate.content else {
        return ImageExtraction::NoContent;
    };

    let parts = match content.parts.as_deref() {
        Some(parts) if !parts.is_empty() => parts,
        _ => return ImageExtraction::NoParts,
    };

    parts
        .iter()
        .filter_map(|part| part.inline_data.as_ref())
        .find_map(|inline| {
            let data = inline.data.as_deref().filter(|d| !d.is_empty())?;
            let mime_type = inline
                .mime_type
                .as_deref()
                .filter(|m| !m.is_empty())
                .unwrap_or(DEFAULT_GENERATED_MIME);
            Some(ImageExtraction::Found {
                mime_type: mime_type.to_string(),
                data: data.to_string(),
            })
        })
        .unwrap_or(ImageExtraction::NoInlineImage)
}

/// Options that shape a [`LookGenerator`], taken from [`Config`].
#[derive(Debug, Clone)]
pub struct LookOptions {
    pub mock_mode: bool,
    pub vendor_timeout: Duration,
    pub detect_upload_mime: bool,
}

impl From<&Config> for LookOptions {
    fn from(config: &Config) -> Self {
        Self {
            mock_mode: config.use_mock_ai,
            vendor_timeout: config.vendor_timeout,
            detect_upload_mime: config.detect_upload_mime,
        }
    }
}

pub struct LookGenerator {
    client: Arc<dyn ImageGenerationService>,
    encoder: Box<dyn ImageEncoder>,
    stager: UploadStager,
    options: LookOptions,
}

impl LookGenerator {
    pub fn new(
        client: Arc<dyn ImageGenerationService>,
        stager: UploadStager,
        options: LookOptions,
    ) -> Self {
        Self::with_encoder(client, Box::new(Base64Encoder), stager, options)
    }

    pub fn with_encoder(
        client: Arc<dyn ImageGenerationService>,
        encoder: Box<dyn ImageEncoder>,
        stager: UploadStager,
        options: LookOptions,
    ) -> Self {
        Self {
            client,
            encoder,
            stager,
            options,
        }
    }

    pub fn stager(&self) -> &UploadStager {
        &self.stager
    }

    /// Generate a try-on image, falling back to the placeholder on any
    /// vendor-side problem.
    pub async fn generate(&self, request: TryOnRequest) -> Result<GenerationResult> {
        info!(
            "Try-on request: category={}, subject={} bytes ({}), garment={} bytes ({})",
            request.category,
            request.subject_image.bytes.len(),
            request.subject_image.content_type.as_deref().unwrap_or("unknown"),
            request.garment_image.bytes.len(),
            request.garment_image.content_type.as_deref().unwrap_or("unknown"),
        );

        let subject = self
            .stager
            .stage("subject", request.subject_image.bytes)
            .await?;
        let garment = self
            .stager
            .stage("garment", request.garment_image.bytes)
            .await?;

        let outcome = self.run(&request.category, &subject, &garment).await;

        subject.release();
        garment.release();

        let result = outcome?;
        match result.fallback_reason() {
            Some(reason) => warn!("Returning placeholder image ({})", reason),
            None => info!("Returning generated image ({})", result.mime_type()),
        }
        Ok(result)
    }

    async fn run(
        &self,
        category: &GarmentCategory,
        subject: &TransientInputFile,
        garment: &TransientInputFile,
    ) -> Result<GenerationResult> {
        if self.options.mock_mode {
            info!("Mock mode enabled, skipping vendor call");
            return Ok(GenerationResult::fallback(FallbackReason::MockMode));
        }

        let subject = self.encode(subject).await?;
        let garment = self.encode(garment).await?;
        debug!(
            "Encoded uploads: subject={} chars, garment={} chars",
            subject.data.len(),
            garment.data.len()
        );

        let request = VendorRequest {
            instruction: prompts::try_on_instruction(category.label()),
            images: vec![subject, garment],
        };

        info!("Calling image model {}", self.client.model());

        let response = match tokio::time::timeout(
            self.options.vendor_timeout,
            self.client.generate(&request),
        )
        .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(VendorError::QuotaExceeded(msg))) => {
                error!("Vendor quota exceeded: {}", msg);
                return Ok(GenerationResult::fallback(FallbackReason::QuotaExceeded));
            }
            Ok(Err(VendorError::Failure(msg))) => {
                error!("Vendor call failed: {}", msg);
                return Ok(GenerationResult::fallback(FallbackReason::GenericError));
            }
            Err(_) => {
                error!(
                    "Vendor call timed out after {:?}",
                    self.options.vendor_timeout
                );
                return Ok(GenerationResult::fallback(FallbackReason::GenericError));
            }
        };

        debug!("Vendor returned {} candidate(s)", response.candidate_count());

        Ok(match extract_image(&response) {
            ImageExtraction::Found { mime_type, data } => {
                debug!("Found inline image: {} ({} chars)", mime_type, data.len());
                GenerationResult::Generated {
                    mime_type,
                    image_data: data,
                }
            }
            missing => {
                warn!("No image in vendor response: {:?}", missing);
                GenerationResult::fallback(FallbackReason::NoImageReturned)
            }
        })
    }

    async fn encode(&self, staged: &TransientInputFile) -> Result<EncodedImage> {
        let bytes = staged.read().await?;
        Ok(EncodedImage {
            mime_type: mime::outbound_mime(&bytes, self.options.detect_upload_mime).to_string(),
            data: self.encoder.encode(&bytes),
        })
    }
}
