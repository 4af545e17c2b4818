use super::sse::SseDecoder;
use super::types::{GenerateContentRequest, GenerateContentResponse, GenerationChunk};
use crate::ai::{ChunkStream, GenerationBackend};
use crate::config::DEFAULT_GEMINI_BASE_URL;
use crate::{Error, Result};
use async_stream::try_stream;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::Client;

/// Gemini REST client for streamed `generateContent` calls.
///
/// The API key is supplied per call: every request carries the end user's
/// own credential.
pub struct GeminiClient {
    client: Client,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// `model` should be the bare model ID (for example
    /// `gemini-2.5-flash-image-preview`); a `models/` prefix is stripped.
    pub fn new(model: String) -> Self {
        Self::new_with_client(model, Client::new())
    }

    pub fn new_with_client(model: String, client: Client) -> Self {
        let model = model.strip_prefix("models/").unwrap_or(&model).to_string();

        Self {
            client,
            model,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Returns the configured model ID without the `models/` prefix.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl GenerationBackend for GeminiClient {
    async fn stream_generate(
        &self,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<ChunkStream> {
        tracing::debug!("Opening Gemini stream for model {}", self.model);

        let response = self
            .client
            .post(self.stream_url())
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to Gemini: {}", e);
                e
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!("Gemini API error (status {}): {}", status, error_text);
            return Err(Error::Backend(format!(
                "Gemini API error (status {}): {}",
                status, error_text
            )));
        }

        Ok(Box::pin(decode_chunks(response.bytes_stream())))
    }
}

/// Turns the raw SSE byte stream into parsed chunks, one per event.
fn decode_chunks<S, B>(bytes: S) -> impl Stream<Item = Result<GenerationChunk>> + Send
where
    S: Stream<Item = reqwest::Result<B>> + Send + 'static,
    B: AsRef<[u8]> + Send,
{
    try_stream! {
        let mut bytes = Box::pin(bytes);
        let mut decoder = SseDecoder::new();

        while let Some(read) = bytes.next().await {
            let read = read?;
            for event in decoder.push(read.as_ref())? {
                if let Some(chunk) = parse_event(&event)? {
                    yield chunk;
                }
            }
        }

        if let Some(event) = decoder.finish()? {
            if let Some(chunk) = parse_event(&event)? {
                yield chunk;
            }
        }
    }
}

fn parse_event(event: &str) -> Result<Option<GenerationChunk>> {
    let event = event.trim();
    if event.is_empty() || event == "[DONE]" {
        return Ok(None);
    }

    let response: GenerateContentResponse = serde_json::from_str(event).map_err(|e| {
        tracing::error!("Failed to parse Gemini stream event: {}\nEvent: {}", e, event);
        Error::Stream(format!("Failed to parse Gemini stream event: {}", e))
    })?;

    if let Some(error) = &response.error {
        tracing::error!("Gemini reported an in-stream error: {}", error);
        return Err(Error::Backend(format!("Gemini stream error: {}", error)));
    }

    Ok(Some(response.into()))
}
