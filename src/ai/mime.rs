/// MIME type declared for outbound images unless sniffing is enabled.
pub const DEFAULT_OUTBOUND_MIME: &str = "image/jpeg";

/// Identify an image format from its magic bytes.
pub fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        _ => None,
    }
}

/// MIME type to declare for an uploaded image.
///
/// Without `detect`, every upload is labelled `image/jpeg` whatever it really is.
pub fn outbound_mime(bytes: &[u8], detect: bool) -> &'static str {
    if !detect {
        return DEFAULT_OUTBOUND_MIME;
    }

    sniff_image_mime(bytes).unwrap_or_else(|| {
        tracing::warn!(
            "Unrecognized upload format (first 4 bytes: {:02X?}), declaring image/png",
            &bytes[..bytes.len().min(4)]
        );
        "image/png"
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A];

    #[test]
    fn test_sniff_known_formats() {
        assert_eq!(sniff_image_mime(PNG), Some("image/png"));
        assert_eq!(sniff_image_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(
            sniff_image_mime(&[
                0x52, 0x49, 0x46, 0x46, 0x00, 0x00, 0x00, 0x00, 0x57, 0x45, 0x42, 0x50
            ]),
            Some("image/webp")
        );
        assert_eq!(sniff_image_mime(b"GIF89a"), Some("image/gif"));
        assert_eq!(sniff_image_mime(&[]), None);
    }

    #[test]
    fn test_outbound_mime_defaults_to_jpeg() {
        assert_eq!(outbound_mime(PNG, false), "image/jpeg");
    }

    #[test]
    fn test_outbound_mime_sniffs_when_enabled() {
        assert_eq!(outbound_mime(PNG, true), "image/png");
        assert_eq!(outbound_mime(&[0x00, 0x01, 0x02, 0x03], true), "image/png");
    }
}
