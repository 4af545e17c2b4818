//! Gemini payload types for streamed `generateContent` calls.

use serde::{Deserialize, Serialize};

/// Gemini content container used in both requests and responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Untagged union of text and inline media content parts.
///
/// Variant order matters for `#[serde(untagged)]` decoding. `Other` absorbs
/// part shapes this crate does not use (thought signatures, function calls).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Part {
    /// Model reasoning; never part of the answer text.
    Thought {
        text: String,
        thought: bool,
    },
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Other(serde_json::Value),
}

/// Base64 inline payload, without any `data:` URI prefix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
}

/// One streamed `generateContent` response object.
///
/// Gemini may report a failure in-band after the stream has started; that
/// arrives as an object with an `error` member instead of candidates.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

/// The part of a streamed response the aggregator cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationChunk {
    pub text: Option<String>,
    pub image: Option<InlineData>,
}

impl GenerationChunk {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            image: None,
        }
    }

    pub fn image(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: None,
            image: Some(InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            }),
        }
    }
}

impl From<GenerateContentResponse> for GenerationChunk {
    /// Reads the first candidate only: text parts are concatenated and the
    /// last inline-data part is kept.
    fn from(response: GenerateContentResponse) -> Self {
        let Some(content) = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
        else {
            return Self::default();
        };

        let mut text: Option<String> = None;
        let mut image = None;
        for part in content.parts {
            match part {
                Part::Thought { thought: true, .. } => {}
                Part::Text { text: piece } | Part::Thought { text: piece, .. } => {
                    text.get_or_insert_with(String::new).push_str(&piece)
                }
                Part::InlineData { inline_data } => image = Some(inline_data),
                Part::Other(_) => {}
            }
        }

        Self { text, image }
    }
}
