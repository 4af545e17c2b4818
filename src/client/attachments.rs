//! Reference-image attachments: acceptance rules and file loading.

use crate::ai::mime::{sniff_image_mime, to_data_uri};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

/// An accepted image, held as a data-URI until the user removes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub raw_data: String,
    pub display_name: String,
}

/// Why a single file was not attached. Other files in the same batch are
/// unaffected.
#[derive(Error, Debug)]
pub enum AttachmentError {
    #[error("Please upload an image file ({name} is {mime_type})")]
    NotAnImage { name: String, mime_type: String },

    #[error("File size must be less than 10MB ({name} is {size} bytes)")]
    TooLarge { name: String, size: u64 },

    #[error("Could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Per-file guard: the type must be `image/*` and the size at most 10 MiB.
pub fn check_acceptance(name: &str, mime_type: &str, size: u64) -> Result<(), AttachmentError> {
    if !mime_type.starts_with("image/") {
        return Err(AttachmentError::NotAnImage {
            name: name.to_string(),
            mime_type: mime_type.to_string(),
        });
    }
    if size > MAX_ATTACHMENT_BYTES {
        return Err(AttachmentError::TooLarge {
            name: name.to_string(),
            size,
        });
    }
    Ok(())
}

impl ImageAttachment {
    /// Build an attachment from bytes already in memory.
    pub fn from_bytes(
        name: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<Self, AttachmentError> {
        check_acceptance(name, mime_type, bytes.len() as u64)?;
        Ok(Self {
            raw_data: to_data_uri(mime_type, bytes),
            display_name: name.to_string(),
        })
    }

    /// Read an image from disk. The size limit is checked before the file
    /// is read.
    pub async fn load(path: &Path) -> Result<Self, AttachmentError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let read_error = |source| AttachmentError::Read {
            path: path.to_path_buf(),
            source,
        };

        let metadata = tokio::fs::metadata(path).await.map_err(read_error)?;
        if metadata.len() > MAX_ATTACHMENT_BYTES {
            return Err(AttachmentError::TooLarge {
                name,
                size: metadata.len(),
            });
        }

        let bytes = tokio::fs::read(path).await.map_err(read_error)?;
        let mime_type = detect_mime_type(path, &bytes);
        Self::from_bytes(&name, &mime_type, &bytes)
    }
}

/// Type from the file extension, as a browser file picker reports it. When
/// the extension is unknown or not an image type, the leading bytes decide.
fn detect_mime_type(path: &Path, bytes: &[u8]) -> String {
    let guessed = mime_guess::from_path(path).first();
    if let Some(mime) = guessed.as_ref().filter(|m| m.type_() == mime_guess::mime::IMAGE) {
        return mime.essence_str().to_string();
    }

    match (sniff_image_mime(bytes), guessed) {
        (Some(sniffed), _) => sniffed.to_string(),
        (None, Some(mime)) => mime.essence_str().to_string(),
        (None, None) => "application/octet-stream".to_string(),
    }
}
