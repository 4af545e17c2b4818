//! Owns the outbound generation call and folds its stream into one result.

use super::gemini::{GenerateContentRequest, GenerationConfig};
use super::normalizer::build_contents;
use super::{ChunkStream, GenerationBackend};
use crate::models::GeneratedImage;
use crate::Result;
use futures::StreamExt;
use std::sync::Arc;

/// Modalities requested on every call; both are always asked for.
const RESPONSE_MODALITIES: [&str; 2] = ["IMAGE", "TEXT"];

/// Aggregated output of one streamed generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationOutput {
    pub image: Option<GeneratedImage>,
    pub text: String,
}

#[derive(Clone)]
pub struct GenerationAdapter {
    backend: Arc<dyn GenerationBackend>,
}

impl GenerationAdapter {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    pub fn request_for(prompt: &str, image_data: Option<&str>) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: build_contents(prompt, image_data),
            generation_config: GenerationConfig {
                response_modalities: RESPONSE_MODALITIES.iter().map(|m| m.to_string()).collect(),
            },
        }
    }

    /// Run one generation to completion. Errors from stream setup or from
    /// any chunk propagate unchanged; nothing is retried.
    pub async fn generate(
        &self,
        api_key: &str,
        prompt: &str,
        image_data: Option<&str>,
    ) -> Result<GenerationOutput> {
        let request = Self::request_for(prompt, image_data);
        let stream = self.backend.stream_generate(api_key, &request).await?;
        Self::aggregate(stream).await
    }

    /// Consume the stream chunk by chunk. The last inline image wins; text
    /// is concatenated in arrival order.
    pub async fn aggregate(mut stream: ChunkStream) -> Result<GenerationOutput> {
        let mut output = GenerationOutput::default();
        let mut chunk_count = 0usize;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            chunk_count += 1;

            if let Some(inline) = chunk.image {
                tracing::debug!(
                    "Chunk {} carried a {} image ({} base64 chars)",
                    chunk_count,
                    inline.mime_type,
                    inline.data.len()
                );
                output.image = Some(GeneratedImage {
                    data: inline.data,
                    mime_type: inline.mime_type,
                });
            }
            if let Some(text) = chunk.text {
                output.text.push_str(&text);
            }
        }

        tracing::info!(
            "Stream finished after {} chunks (image: {}, text: {} chars)",
            chunk_count,
            output.image.is_some(),
            output.text.len()
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::gemini::{GenerationChunk, Part};
    use crate::ai::MockBackend;
    use crate::Error;
    use pretty_assertions::assert_eq;

    fn adapter_for(backend: MockBackend) -> GenerationAdapter {
        GenerationAdapter::new(Arc::new(backend))
    }

    #[tokio::test]
    async fn test_last_inline_image_wins() {
        let backend = MockBackend::new().with_chunks(vec![
            GenerationChunk::image("image/png", "FIRST"),
            GenerationChunk::text("between"),
            GenerationChunk::image("image/jpeg", "LAST"),
            GenerationChunk::text(" after"),
        ]);

        let output = adapter_for(backend).generate("key", "p", None).await.unwrap();

        assert_eq!(
            output.image,
            Some(GeneratedImage {
                data: "LAST".to_string(),
                mime_type: "image/jpeg".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_text_is_ordered_concatenation_skipping_empty_chunks() {
        let backend = MockBackend::new().with_chunks(vec![
            GenerationChunk::text("A "),
            GenerationChunk::default(),
            GenerationChunk::image("image/png", "IMG"),
            GenerationChunk::text("banana "),
            GenerationChunk::text("in space"),
        ]);

        let output = adapter_for(backend).generate("key", "p", None).await.unwrap();
        assert_eq!(output.text, "A banana in space");
    }

    #[tokio::test]
    async fn test_chunk_with_both_image_and_text_contributes_both() {
        let backend = MockBackend::new().with_chunks(vec![GenerationChunk {
            text: Some("caption".to_string()),
            image: Some(crate::ai::gemini::InlineData {
                mime_type: "image/png".to_string(),
                data: "IMG".to_string(),
            }),
        }]);

        let output = adapter_for(backend).generate("key", "p", None).await.unwrap();
        assert_eq!(output.text, "caption");
        assert_eq!(output.image.unwrap().data, "IMG");
    }

    #[tokio::test]
    async fn test_empty_stream_yields_empty_output() {
        let output = adapter_for(MockBackend::new())
            .generate("key", "p", None)
            .await
            .unwrap();
        assert_eq!(output, GenerationOutput::default());
    }

    #[tokio::test]
    async fn test_request_carries_modalities_and_normalized_parts() {
        let backend = MockBackend::new();
        let probe = backend.clone();

        adapter_for(backend)
            .generate("secret", "edit this", Some("data:image/webp;base64,UklGR"))
            .await
            .unwrap();

        let calls = probe.get_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].api_key, "secret");

        let request = &calls[0].request;
        assert_eq!(
            request.generation_config.response_modalities,
            vec!["IMAGE".to_string(), "TEXT".to_string()]
        );
        assert_eq!(request.contents[0].parts.len(), 2);
        assert!(matches!(
            &request.contents[0].parts[1],
            Part::InlineData { inline_data } if inline_data.mime_type == "image/webp"
        ));
    }

    #[tokio::test]
    async fn test_setup_error_propagates() {
        let backend = MockBackend::new().with_setup_error("API_KEY_INVALID: bad key");

        let err = adapter_for(backend)
            .generate("key", "p", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Backend(msg) if msg.contains("API_KEY_INVALID")));
    }

    #[tokio::test]
    async fn test_mid_stream_error_propagates() {
        let backend = MockBackend::new()
            .with_chunks(vec![GenerationChunk::text("partial")])
            .with_stream_error("RATE_LIMIT_EXCEEDED");

        let err = adapter_for(backend)
            .generate("key", "p", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("RATE_LIMIT_EXCEEDED"));
    }

    #[tokio::test]
    async fn test_identical_requests_are_not_deduplicated() {
        let backend = MockBackend::new().with_chunks(vec![GenerationChunk::text("x")]);
        let probe = backend.clone();
        let adapter = adapter_for(backend);

        adapter.generate("key", "same", None).await.unwrap();
        adapter.generate("key", "same", None).await.unwrap();

        assert_eq!(probe.get_call_count(), 2);
    }
}
