pub mod client;
pub mod sse;
pub mod types;

pub use client::GeminiClient;
pub use types::{
    Content, GenerateContentRequest, GenerationChunk, GenerationConfig, InlineData, Part,
};
