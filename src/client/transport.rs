//! Delivery of one generation request to the server.

use crate::models::{GenerationRequestBody, GenerationResult};
use crate::server::GENERATE_IMAGE_PATH;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::{Arc, Mutex};

#[async_trait]
pub trait GenerationTransport: Send + Sync {
    /// Post the request and decode whichever envelope comes back. An `Err`
    /// means no decodable response was received.
    async fn send(&self, body: &GenerationRequestBody) -> Result<GenerationResult>;
}

pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    /// `base_url` is the server origin, e.g. `http://127.0.0.1:3000`.
    pub fn new(base_url: &str) -> Self {
        Self::new_with_client(base_url, Client::new())
    }

    pub fn new_with_client(base_url: &str, client: Client) -> Self {
        Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), GENERATE_IMAGE_PATH),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GenerationTransport for HttpTransport {
    async fn send(&self, body: &GenerationRequestBody) -> Result<GenerationResult> {
        tracing::debug!("Posting generation request to {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach generation server: {}", e);
                e
            })?;

        // The envelope is decoded whatever the status; failures carry it too.
        let status = response.status();
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                "Undecodable response (status {}): {}\nBody: {}",
                status,
                e,
                text
            );
            Error::Serialization(e)
        })
    }
}

/// Scripted transport: replays responses in order, cycling when exhausted.
/// With no scripted responses every call fails as if offline.
#[derive(Clone, Default)]
pub struct MockTransport {
    responses: Arc<Mutex<Vec<GenerationResult>>>,
    sent: Arc<Mutex<Vec<GenerationRequestBody>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, response: GenerationResult) -> Self {
        self.responses.lock().unwrap().push(response);
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn get_sent(&self) -> Vec<GenerationRequestBody> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationTransport for MockTransport {
    async fn send(&self, body: &GenerationRequestBody) -> Result<GenerationResult> {
        let index = {
            let mut sent = self.sent.lock().unwrap();
            sent.push(body.clone());
            sent.len() - 1
        };

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(Error::Backend("mock transport is offline".to_string()));
        }
        Ok(responses[index % responses.len()].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorCode;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn body() -> GenerationRequestBody {
        GenerationRequestBody {
            prompt: Some("a banana".to_string()),
            image_data: None,
            api_key: Some("k".to_string()),
        }
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let transport = HttpTransport::new("http://localhost:3000/");
        assert_eq!(
            transport.endpoint(),
            "http://localhost:3000/api/generate-image"
        );
    }

    #[tokio::test]
    async fn test_error_status_still_decodes_envelope() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_IMAGE_PATH))
            .and(body_json(serde_json::json!({
                "prompt": "a banana",
                "imageData": null,
                "apiKey": "k"
            })))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "success": false,
                "error": "Invalid API key.",
                "code": "INVALID_API_KEY"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = HttpTransport::new(&server.uri()).send(&body()).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.code, Some(ErrorCode::InvalidApiKey));
    }

    #[tokio::test]
    async fn test_non_json_response_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_IMAGE_PATH))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let err = HttpTransport::new(&server.uri()).send(&body()).await.unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_an_error() {
        let err = HttpTransport::new("http://127.0.0.1:1")
            .send(&body())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }

    #[tokio::test]
    async fn test_mock_transport_offline_by_default() {
        let transport = MockTransport::new();
        assert!(transport.send(&body()).await.is_err());
        assert_eq!(transport.get_call_count(), 1);
    }
}
