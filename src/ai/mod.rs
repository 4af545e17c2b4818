//! Generative backend integration
//!
//! Normalizes prompt and reference-image input into Gemini's content shape,
//! opens a streamed generation session and folds the streamed chunks into a
//! single image/text result.

pub mod adapter;
pub mod gemini;
pub mod mime;
pub mod mock;
pub mod normalizer;

pub use adapter::{GenerationAdapter, GenerationOutput};
pub use gemini::GeminiClient;
pub use mock::MockBackend;

use crate::Result;
use async_trait::async_trait;
use futures::Stream;
use gemini::{GenerateContentRequest, GenerationChunk};
use std::pin::Pin;

/// Finite stream of parsed chunks, terminated by the backend.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<GenerationChunk>> + Send>>;

#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Open a streamed generation session authenticated with `api_key`.
    async fn stream_generate(
        &self,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<ChunkStream>;
}
