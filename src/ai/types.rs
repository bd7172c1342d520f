//! Vendor-neutral request and response shapes.
//!
//! Every level of the response is optional: the vendor only promises this
//! structure on the happy path, and a missing level means "no image".

use crate::models::EncodedImage;
use serde::{Deserialize, Serialize};

/// Instruction text followed by the input images, in the order they are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorRequest {
    pub instruction: String,
    pub images: Vec<EncodedImage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VendorResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponsePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(
        default,
        rename = "inlineData",
        skip_serializing_if = "Option::is_none"
    )]
    pub inline_data: Option<InlineImage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl VendorResponse {
    /// Response with a single candidate holding the given parts.
    pub fn with_parts(parts: Vec<ResponsePart>) -> Self {
        Self {
            candidates: Some(vec![Candidate {
                content: Some(CandidateContent { parts: Some(parts) }),
            }]),
        }
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.as_ref().map_or(0, Vec::len)
    }
}

impl ResponsePart {
    pub fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            inline_data: None,
        }
    }

    pub fn image(mime_type: &str, data: &str) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineImage {
                mime_type: Some(mime_type.to_string()),
                data: Some(data.to_string()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_happy_path_shape() {
        let response: VendorResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "here you go" },
                        { "inlineData": { "mimeType": "image/png", "data": "AAAA" } }
                    ]
                },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "totalTokenCount": 10 }
        }))
        .unwrap();

        assert_eq!(response.candidate_count(), 1);
        let parts = response.candidates.unwrap()[0]
            .content
            .clone()
            .unwrap()
            .parts
            .unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(
            parts[1].inline_data.as_ref().unwrap().data.as_deref(),
            Some("AAAA")
        );
    }

    #[test]
    fn test_tolerates_missing_and_null_levels() {
        let empty: VendorResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.candidates.is_none());

        let no_content: VendorResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert!(no_content.candidates.unwrap()[0].content.is_none());

        let null_parts: VendorResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":null}}]}"#).unwrap();
        assert!(null_parts.candidates.unwrap()[0]
            .content
            .as_ref()
            .unwrap()
            .parts
            .is_none());
    }
}
