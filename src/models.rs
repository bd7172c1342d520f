//! Data models and structures
//!
//! Defines the try-on domain types, the user records shared with the
//! auth store, and the process-wide configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU64;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// 1x1 PNG returned whenever a real generated image cannot be produced.
pub const FALLBACK_IMAGE_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR4nGNgYAAAAAMAASsJTYQAAAAASUVORK5CYII=";
pub const FALLBACK_MIME_TYPE: &str = "image/png";

/// Garment category sent alongside a try-on request.
///
/// Known labels map to dedicated variants; anything else is carried through
/// verbatim so the instruction text still names what the user picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GarmentCategory {
    Top,
    Bottom,
    Swimwear,
    DressSet,
    Other(String),
}

impl GarmentCategory {
    pub const DEFAULT_LABEL: &'static str = "look";

    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "top" => Self::Top,
            "bottom" => Self::Bottom,
            "swimwear" => Self::Swimwear,
            "dress_set" => Self::DressSet,
            "" => Self::Other(Self::DEFAULT_LABEL.to_string()),
            other => Self::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Swimwear => "swimwear",
            Self::DressSet => "dress_set",
            Self::Other(label) => label,
        }
    }
}

impl Default for GarmentCategory {
    fn default() -> Self {
        Self::Other(Self::DEFAULT_LABEL.to_string())
    }
}

impl fmt::Display for GarmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Image bytes in their portable text form, tagged with a declared MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime_type: String,
    pub data: String,
}

/// Why a request ended with the placeholder image instead of a generated one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    NoImageReturned,
    QuotaExceeded,
    GenericError,
    MockMode,
}

impl FallbackReason {
    pub fn code(self) -> &'static str {
        match self {
            Self::NoImageReturned => "NO_IMAGE_RETURNED",
            Self::QuotaExceeded => "QUOTA_EXCEEDED",
            Self::GenericError => "GENERIC_ERROR",
            Self::MockMode => "MOCK_MODE",
        }
    }

    /// Code surfaced to clients; only vendor failures carry one.
    pub fn error_code(self) -> Option<&'static str> {
        match self {
            Self::QuotaExceeded | Self::GenericError => Some(self.code()),
            Self::NoImageReturned | Self::MockMode => None,
        }
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Outcome of one try-on generation. Always carries an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    Generated { mime_type: String, image_data: String },
    Fallback { reason: FallbackReason },
}

impl GenerationResult {
    pub fn fallback(reason: FallbackReason) -> Self {
        Self::Fallback { reason }
    }

    pub fn mime_type(&self) -> &str {
        match self {
            Self::Generated { mime_type, .. } => mime_type,
            Self::Fallback { .. } => FALLBACK_MIME_TYPE,
        }
    }

    pub fn image_data(&self) -> &str {
        match self {
            Self::Generated { image_data, .. } => image_data,
            Self::Fallback { .. } => FALLBACK_IMAGE_BASE64,
        }
    }

    pub fn fallback_reason(&self) -> Option<FallbackReason> {
        match self {
            Self::Generated { .. } => None,
            Self::Fallback { reason } => Some(*reason),
        }
    }
}

/// Row of the `users` table as stored by the user store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub plan: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a new user row.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub plan: String,
}

/// Public view of a user returned by the auth endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub plan: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for UserProfile {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            email: record.email,
            phone: record.phone,
            plan: record.plan,
            created_at: record.created_at,
        }
    }
}

// Configuration
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_JWT_SECRET: &str = "fitflick_secret_key_change_in_production";

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub image_model: String,
    pub use_mock_ai: bool,
    pub supabase_url: Option<String>,
    pub supabase_service_key: Option<String>,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub vendor_timeout: Duration,
    pub detect_upload_mime: bool,
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            use_mock_ai: false,
            supabase_url: None,
            supabase_service_key: None,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            port: 3000,
            upload_dir: PathBuf::from("uploads"),
            vendor_timeout: Duration::from_secs(120),
            detect_upload_mime: false,
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Self {
            gemini_api_key: non_empty("GEMINI_API_KEY"),
            image_model: non_empty("GEMINI_MODEL_IMAGE").unwrap_or(defaults.image_model),
            use_mock_ai: lookup("USE_MOCK_AI").as_deref() == Some("true"),
            supabase_url: non_empty("SUPABASE_URL"),
            supabase_service_key: non_empty("SUPABASE_SERVICE_KEY"),
            jwt_secret: non_empty("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            token_ttl: parse_var(&lookup, "TOKEN_TTL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.token_ttl),
            port: parse_var(&lookup, "PORT")?.unwrap_or(defaults.port),
            upload_dir: non_empty("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            vendor_timeout: parse_var::<NonZeroU64, _>(&lookup, "VENDOR_TIMEOUT_SECS")?
                .map(|secs| Duration::from_secs(secs.get()))
                .unwrap_or(defaults.vendor_timeout),
            detect_upload_mime: lookup("DETECT_UPLOAD_MIME").as_deref() == Some("true"),
            max_upload_bytes: parse_var(&lookup, "MAX_UPLOAD_BYTES")?
                .unwrap_or(defaults.max_upload_bytes),
        };

        if config.gemini_api_key.is_none() && !config.use_mock_ai {
            return Err(crate::Error::Config(
                "GEMINI_API_KEY not set (set USE_MOCK_AI=true to run without it)".to_string(),
            ));
        }

        Ok(config)
    }

    /// Supabase credentials, when both halves are configured.
    pub fn supabase(&self) -> Option<(&str, &str)> {
        match (&self.supabase_url, &self.supabase_service_key) {
            (Some(url), Some(key)) => Some((url.as_str(), key.as_str())),
            _ => None,
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> crate::Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| crate::Error::Config(format!("Invalid {} value '{}': {}", key, raw, e))),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_garment_category_labels() {
        assert_eq!(GarmentCategory::from_label("top"), GarmentCategory::Top);
        assert_eq!(
            GarmentCategory::from_label("dress_set"),
            GarmentCategory::DressSet
        );
        assert_eq!(
            GarmentCategory::from_label("jacket"),
            GarmentCategory::Other("jacket".to_string())
        );
        assert_eq!(GarmentCategory::from_label("  ").label(), "look");
        assert_eq!(GarmentCategory::Swimwear.to_string(), "swimwear");
    }

    #[test]
    fn test_fallback_result_uses_placeholder() {
        let result = GenerationResult::fallback(FallbackReason::QuotaExceeded);
        assert_eq!(result.mime_type(), "image/png");
        assert_eq!(result.image_data(), FALLBACK_IMAGE_BASE64);
        assert_eq!(result.fallback_reason(), Some(FallbackReason::QuotaExceeded));
    }

    #[test]
    fn test_error_code_only_for_vendor_failures() {
        assert_eq!(
            FallbackReason::QuotaExceeded.error_code(),
            Some("QUOTA_EXCEEDED")
        );
        assert_eq!(
            FallbackReason::GenericError.error_code(),
            Some("GENERIC_ERROR")
        );
        assert_eq!(FallbackReason::NoImageReturned.error_code(), None);
        assert_eq!(FallbackReason::MockMode.error_code(), None);
    }

    #[test]
    fn test_user_profile_serializes_camel_case() {
        let record = UserRecord {
            id: "u1".to_string(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            phone: "11999999999".to_string(),
            password_hash: "secret".to_string(),
            plan: "free".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(UserProfile::from(record)).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("password_hash").is_none());
        assert!(json.get("passwordHash").is_none());
    }

    #[test]
    fn test_config_defaults_in_mock_mode() {
        let config = Config::from_lookup(lookup_from(&[("USE_MOCK_AI", "true")])).unwrap();
        assert!(config.use_mock_ai);
        assert_eq!(config.image_model, DEFAULT_IMAGE_MODEL);
        assert_eq!(config.port, 3000);
        assert_eq!(config.vendor_timeout, Duration::from_secs(120));
        assert!(!config.detect_upload_mime);
        assert!(config.supabase().is_none());
    }

    #[test]
    fn test_config_requires_api_key_outside_mock_mode() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_config_mock_flag_is_literal_true() {
        let config = Config::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "key"),
            ("USE_MOCK_AI", "TRUE"),
        ]))
        .unwrap();
        assert!(!config.use_mock_ai);
    }

    #[test]
    fn test_config_rejects_invalid_port() {
        let err = Config::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "key"),
            ("PORT", "not-a-port"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_config_rejects_zero_vendor_timeout() {
        let err = Config::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "key"),
            ("VENDOR_TIMEOUT_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, crate::Error::Config(ref m) if m.contains("VENDOR_TIMEOUT_SECS")));
    }

    #[test]
    fn test_config_reads_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "key"),
            ("GEMINI_MODEL_IMAGE", "gemini-custom"),
            ("SUPABASE_URL", "https://db.example.com"),
            ("SUPABASE_SERVICE_KEY", "service"),
            ("PORT", "8080"),
            ("VENDOR_TIMEOUT_SECS", "5"),
            ("DETECT_UPLOAD_MIME", "true"),
        ]))
        .unwrap();

        assert_eq!(config.image_model, "gemini-custom");
        assert_eq!(config.port, 8080);
        assert_eq!(config.vendor_timeout, Duration::from_secs(5));
        assert!(config.detect_upload_mime);
        assert_eq!(
            config.supabase(),
            Some(("https://db.example.com", "service"))
        );
    }
}
