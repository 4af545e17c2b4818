//! `POST /api/generate-image`: validation, backend invocation and mapping of
//! every failure onto the stable JSON envelope.

use super::AppState;
use crate::models::{ErrorCode, ErrorEnvelope, GenerationRequestBody, SuccessEnvelope};
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use std::any::Any;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

pub const GENERATE_IMAGE_PATH: &str = "/api/generate-image";

/// Every failure the endpoint can report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    MissingFields,
    InvalidJson,
    InvalidApiKey,
    QuotaExceeded,
    RateLimitExceeded,
    /// Unclassified backend failure, carrying the raw message.
    Backend(String),
    /// Anything outside the backend boundary. `details` is only populated
    /// when the environment allows exposing internals.
    Internal { details: Option<String> },
    MethodNotAllowed,
}

impl ApiError {
    /// Classify a backend failure by substring, first match wins.
    pub fn classify_backend(message: &str) -> Self {
        if message.contains("API_KEY_INVALID") {
            ApiError::InvalidApiKey
        } else if message.contains("QUOTA_EXCEEDED") {
            ApiError::QuotaExceeded
        } else if message.contains("RATE_LIMIT_EXCEEDED") {
            ApiError::RateLimitExceeded
        } else {
            ApiError::Backend(message.to_string())
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingFields | ApiError::InvalidJson => StatusCode::BAD_REQUEST,
            ApiError::InvalidApiKey => StatusCode::UNAUTHORIZED,
            ApiError::QuotaExceeded | ApiError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Backend(_) | ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ApiError::MissingFields => None,
            ApiError::InvalidJson => Some(ErrorCode::InvalidJson),
            ApiError::InvalidApiKey => Some(ErrorCode::InvalidApiKey),
            ApiError::QuotaExceeded => Some(ErrorCode::QuotaExceeded),
            ApiError::RateLimitExceeded => Some(ErrorCode::RateLimitExceeded),
            ApiError::Backend(_) => Some(ErrorCode::GeminiApiError),
            ApiError::Internal { .. } => Some(ErrorCode::InternalError),
            ApiError::MethodNotAllowed => Some(ErrorCode::MethodNotAllowed),
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::MissingFields => {
                "Missing required fields: prompt and apiKey are required".to_string()
            }
            ApiError::InvalidJson => {
                "Invalid request format. Please check your request data.".to_string()
            }
            ApiError::InvalidApiKey => {
                "Invalid API key. Please check your Gemini API key and try again.".to_string()
            }
            ApiError::QuotaExceeded => {
                "API quota exceeded. Please check your Gemini API usage limits.".to_string()
            }
            ApiError::RateLimitExceeded => {
                "Rate limit exceeded. Please wait a moment and try again.".to_string()
            }
            ApiError::Backend(message) if message.is_empty() => {
                "Gemini API Error: Unknown error occurred".to_string()
            }
            ApiError::Backend(message) => format!("Gemini API Error: {}", message),
            ApiError::Internal { .. } => {
                "Internal server error. Please try again later.".to_string()
            }
            ApiError::MethodNotAllowed => {
                "Method not allowed. Use POST to generate images.".to_string()
            }
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            success: false,
            error: self.message(),
            code: self.code(),
            details: match self {
                ApiError::Internal { details } => details.clone(),
                _ => None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.envelope())).into_response()
    }
}

pub async fn generate_image(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let request_id = Uuid::new_v4();

    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!("[{}] Could not read request body: {}", request_id, rejection);
            return ApiError::InvalidJson.into_response();
        }
    };

    let request: GenerationRequestBody = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("[{}] Malformed request body: {}", request_id, e);
            return ApiError::InvalidJson.into_response();
        }
    };

    let (prompt, api_key) = match (request.prompt, request.api_key) {
        (Some(prompt), Some(api_key)) if !prompt.is_empty() && !api_key.is_empty() => {
            (prompt, api_key)
        }
        _ => {
            warn!("[{}] Rejected request with missing prompt or apiKey", request_id);
            return ApiError::MissingFields.into_response();
        }
    };
    let image_data = request.image_data.filter(|data| !data.is_empty());

    info!(
        "[{}] Generating (prompt: {} chars, reference image: {})",
        request_id,
        prompt.len(),
        image_data.is_some()
    );

    let output = match state
        .adapter
        .generate(&api_key, &prompt, image_data.as_deref())
        .await
    {
        Ok(output) => output,
        Err(e) => {
            let message = e.to_string();
            error!("[{}] Gemini API Error: {}", request_id, message);
            return ApiError::classify_backend(&message).into_response();
        }
    };

    let message = if output.image.is_some() {
        "Image generated successfully!"
    } else {
        "Content generated successfully!"
    };
    info!("[{}] {}", request_id, message);

    let envelope = SuccessEnvelope {
        success: true,
        image: output.image,
        text: output.text,
        original_prompt: prompt,
        message: message.to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    };
    (StatusCode::OK, Json(envelope)).into_response()
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Response for a panic caught at the outer boundary.
pub fn internal_error_for_panic(panic: Box<dyn Any + Send + 'static>, expose_details: bool) -> Response {
    let message = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    error!("Server Error: request handler panicked: {}", message);
    ApiError::Internal {
        details: expose_details.then_some(message),
    }
    .into_response()
}
