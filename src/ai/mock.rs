use super::gemini::{GenerateContentRequest, GenerationChunk};
use super::{ChunkStream, GenerationBackend};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// One recorded `stream_generate` invocation.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub api_key: String,
    pub request: GenerateContentRequest,
}

/// Scripted backend: replays the same chunks on every call, optionally
/// failing at setup or after the scripted chunks.
#[derive(Clone, Default)]
pub struct MockBackend {
    chunks: Arc<Mutex<Vec<GenerationChunk>>>,
    setup_error: Arc<Mutex<Option<String>>>,
    stream_error: Arc<Mutex<Option<String>>>,
    panic_message: Arc<Mutex<Option<String>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunks(self, chunks: Vec<GenerationChunk>) -> Self {
        self.chunks.lock().unwrap().extend(chunks);
        self
    }

    /// Fail before any chunk is produced.
    pub fn with_setup_error(self, message: &str) -> Self {
        *self.setup_error.lock().unwrap() = Some(message.to_string());
        self
    }

    /// Fail after the scripted chunks have been yielded.
    pub fn with_stream_error(self, message: &str) -> Self {
        *self.stream_error.lock().unwrap() = Some(message.to_string());
        self
    }

    /// Panic inside the call, simulating a defect outside error handling.
    pub fn with_panic(self, message: &str) -> Self {
        *self.panic_message.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn get_calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationBackend for MockBackend {
    async fn stream_generate(
        &self,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<ChunkStream> {
        self.calls.lock().unwrap().push(RecordedCall {
            api_key: api_key.to_string(),
            request: request.clone(),
        });

        let panic_message = self.panic_message.lock().unwrap().clone();
        if let Some(message) = panic_message {
            panic!("{}", message);
        }

        let setup_error = self.setup_error.lock().unwrap().clone();
        if let Some(message) = setup_error {
            return Err(Error::Backend(message));
        }

        let mut items: Vec<Result<GenerationChunk>> =
            self.chunks.lock().unwrap().iter().cloned().map(Ok).collect();
        let stream_error = self.stream_error.lock().unwrap().clone();
        if let Some(message) = stream_error {
            items.push(Err(Error::Backend(message)));
        }

        Ok(Box::pin(futures::stream::iter(items)))
    }
}
