//! Converts a prompt and optional reference image into the single
//! conversational turn sent to the backend.

use super::gemini::{Content, InlineData, Part};
use super::mime::{mime_from_data_uri, strip_data_uri};

const FALLBACK_MIME: &str = "image/jpeg";

/// Derive the backend-bound inline part from a data-URI.
pub fn inline_part_from_data_uri(data_uri: &str) -> InlineData {
    InlineData {
        mime_type: mime_from_data_uri(data_uri)
            .unwrap_or(FALLBACK_MIME)
            .to_string(),
        data: strip_data_uri(data_uri).to_string(),
    }
}

/// One `user` turn: the prompt text, then the image if present.
pub fn build_contents(prompt: &str, image_data: Option<&str>) -> Vec<Content> {
    let mut parts = vec![Part::Text {
        text: prompt.to_string(),
    }];

    if let Some(data_uri) = image_data {
        parts.push(Part::InlineData {
            inline_data: inline_part_from_data_uri(data_uri),
        });
    }

    vec![Content {
        role: Some("user".to_string()),
        parts,
    }]
}
