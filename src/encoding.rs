//! Portable text encoding for uploaded images.

use base64::Engine as _;

/// Turns raw image bytes into the text form the vendor accepts.
pub trait ImageEncoder: Send + Sync {
    fn encode(&self, bytes: &[u8]) -> String;
}

/// Standard-alphabet, padded base64.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Encoder;

impl ImageEncoder for Base64Encoder {
    fn encode(&self, bytes: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }
}
