//! Data models and structures
//!
//! Defines the wire envelope shared by the generation endpoint and its
//! clients, plus the error taxonomy both sides classify against.

use serde::{Deserialize, Serialize};

/// Closed set of machine-readable failure codes carried by the envelope.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidApiKey,
    QuotaExceeded,
    RateLimitExceeded,
    GeminiApiError,
    InvalidJson,
    InternalError,
    MethodNotAllowed,
    NetworkError,
}

/// Coarse failure taxonomy used to decide what the user can do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Client-correctable input problem; fix and resubmit.
    Validation,
    /// The credential was refused; a new key is required.
    Credential,
    /// Quota or rate limit; the same request may succeed later.
    RateLimit,
    Backend,
    Network,
    Internal,
}

impl ErrorCode {
    pub fn kind(self) -> ErrorKind {
        match self {
            ErrorCode::InvalidJson | ErrorCode::MethodNotAllowed => ErrorKind::Validation,
            ErrorCode::InvalidApiKey => ErrorKind::Credential,
            ErrorCode::QuotaExceeded | ErrorCode::RateLimitExceeded => ErrorKind::RateLimit,
            ErrorCode::GeminiApiError => ErrorKind::Backend,
            ErrorCode::NetworkError => ErrorKind::Network,
            ErrorCode::InternalError => ErrorKind::Internal,
        }
    }

    /// True when resubmitting the identical request later may succeed.
    /// Nothing in the crate retries automatically.
    pub fn is_retryable_later(self) -> bool {
        self.kind() == ErrorKind::RateLimit
    }
}

/// JSON body accepted by `POST /api/generate-image`.
///
/// Every field is optional on the wire so that an absent field is reported
/// as a missing-field validation error rather than a parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequestBody {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub image_data: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Base64 image payload returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub data: String,
    pub mime_type: String,
}

impl GeneratedImage {
    /// Subtype used as a file extension, e.g. `png` for `image/png`.
    pub fn extension(&self) -> &str {
        self.mime_type
            .split_once('/')
            .map(|(_, subtype)| subtype)
            .filter(|subtype| !subtype.is_empty())
            .unwrap_or("png")
    }
}

/// Success branch of the envelope. `image` is always serialized, as `null`
/// when the backend produced text only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessEnvelope {
    pub success: bool,
    pub image: Option<GeneratedImage>,
    pub text: String,
    pub original_prompt: String,
    pub message: String,
    pub timestamp: String,
}

/// Failure branch of the envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

pub const NETWORK_ERROR_MESSAGE: &str = "Failed to connect to the server. Please try again.";

/// Client-side view of either envelope branch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<GeneratedImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl GenerationResult {
    /// Result synthesized locally when the request never produced a
    /// decodable response.
    pub fn network_error() -> Self {
        Self {
            success: false,
            error: Some(NETWORK_ERROR_MESSAGE.to_string()),
            code: Some(ErrorCode::NetworkError),
            ..Self::default()
        }
    }

    /// Failure kind, treating a code-less failure as a validation error.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        if self.success {
            return None;
        }
        Some(self.code.map_or(ErrorKind::Validation, ErrorCode::kind))
    }

    /// Text offered alongside the image when sharing.
    pub fn share_caption(&self) -> Option<&str> {
        [self.original_prompt.as_deref(), self.text.as_deref()]
            .into_iter()
            .flatten()
            .find(|caption| !caption.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_code_wire_names() {
        let json = serde_json::to_string(&ErrorCode::GeminiApiError).unwrap();
        assert_eq!(json, "\"GEMINI_API_ERROR\"");

        let code: ErrorCode = serde_json::from_str("\"RATE_LIMIT_EXCEEDED\"").unwrap();
        assert_eq!(code, ErrorCode::RateLimitExceeded);
    }

    #[test]
    fn test_only_rate_limits_are_retryable_later() {
        assert!(ErrorCode::QuotaExceeded.is_retryable_later());
        assert!(ErrorCode::RateLimitExceeded.is_retryable_later());
        assert!(!ErrorCode::InvalidApiKey.is_retryable_later());
        assert!(!ErrorCode::NetworkError.is_retryable_later());
        assert!(!ErrorCode::GeminiApiError.is_retryable_later());
    }

    #[test]
    fn test_success_envelope_serializes_null_image() {
        let envelope = SuccessEnvelope {
            success: true,
            image: None,
            text: "hello".to_string(),
            original_prompt: "a cat".to_string(),
            message: "Content generated successfully!".to_string(),
            timestamp: "2026-01-01T00:00:00.000Z".to_string(),
        };

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["image"], serde_json::Value::Null);
        assert_eq!(value["originalPrompt"], "a cat");
    }

    #[test]
    fn test_error_envelope_omits_missing_code() {
        let envelope = ErrorEnvelope {
            success: false,
            error: "Missing required fields".to_string(),
            code: None,
            details: None,
        };

        let value = serde_json::to_value(&envelope).unwrap();
        assert!(value.get("code").is_none());
        assert!(value.get("details").is_none());
    }

    #[test]
    fn test_result_decodes_error_branch() {
        let result: GenerationResult = serde_json::from_str(
            r#"{"success":false,"error":"Invalid API key.","code":"INVALID_API_KEY"}"#,
        )
        .unwrap();

        assert!(!result.success);
        assert_eq!(result.code, Some(ErrorCode::InvalidApiKey));
        assert_eq!(result.error_kind(), Some(ErrorKind::Credential));
    }

    #[test]
    fn test_codeless_failure_is_validation() {
        let result = GenerationResult {
            success: false,
            error: Some("Missing required fields".to_string()),
            ..GenerationResult::default()
        };
        assert_eq!(result.error_kind(), Some(ErrorKind::Validation));
    }

    #[test]
    fn test_share_caption_prefers_original_prompt() {
        let result = GenerationResult {
            success: true,
            text: Some("model text".to_string()),
            original_prompt: Some("a cat".to_string()),
            ..GenerationResult::default()
        };
        assert_eq!(result.share_caption(), Some("a cat"));

        let text_only = GenerationResult {
            success: true,
            text: Some("model text".to_string()),
            ..GenerationResult::default()
        };
        assert_eq!(text_only.share_caption(), Some("model text"));
    }

    #[test]
    fn test_image_extension_from_mime() {
        let image = GeneratedImage {
            data: String::new(),
            mime_type: "image/webp".to_string(),
        };
        assert_eq!(image.extension(), "webp");

        let odd = GeneratedImage {
            data: String::new(),
            mime_type: "binary".to_string(),
        };
        assert_eq!(odd.extension(), "png");
    }
}
