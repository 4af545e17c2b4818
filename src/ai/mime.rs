use base64::Engine as _;
use regex::Regex;
use std::sync::LazyLock;

static DATA_URI_MIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"data:([a-zA-Z0-9]+/[a-zA-Z0-9\-.+]+)").expect("static data-URI pattern is valid")
});

const BASE64_MARKER: &str = ";base64,";

/// Identify an image by its magic bytes. Anything unrecognized is `None`.
pub fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        [0x42, 0x4D, ..] => Some("image/bmp"),
        _ => None,
    }
}

/// MIME type embedded in a `data:<type>/<subtype>` prefix, if any.
pub fn mime_from_data_uri(uri: &str) -> Option<&str> {
    DATA_URI_MIME
        .captures(uri)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// Payload after the `;base64,` marker. Strings without the marker are
/// returned unchanged; the payload itself is never validated.
pub fn strip_data_uri(uri: &str) -> &str {
    uri.split_once(BASE64_MARKER)
        .map(|(_, payload)| payload)
        .unwrap_or(uri)
}

pub fn to_data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{}{}{}",
        mime_type,
        BASE64_MARKER,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}
