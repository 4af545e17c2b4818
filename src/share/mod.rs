//! Turning a generated image into a shared file or a saved download.
//!
//! The platform decides which strategy applies; [`share_image`] runs it
//! and falls back to a plain download if it fails.

pub mod local;
pub mod mock;
pub mod strategy;

pub use local::LocalPlatform;
pub use mock::{MockSharePlatform, ShareCall};
pub use strategy::{
    select_strategy, DownloadWithCaption, FileShare, ShareStrategy, TextShare,
};

use crate::models::GeneratedImage;
use crate::Result;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Decoded image ready to hand to a platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ShareFile {
    pub fn from_image(image: &GeneratedImage, file_name: String) -> Result<Self> {
        Ok(Self {
            file_name,
            mime_type: image.mime_type.clone(),
            bytes: STANDARD.decode(image.data.as_bytes())?,
        })
    }
}

/// Capabilities of the environment the result is exported to.
#[async_trait]
pub trait SharePlatform: Send + Sync {
    /// Whether a native share sheet exists at all.
    fn supports_native_share(&self) -> bool;

    /// Whether the native share sheet can carry these files.
    fn can_share_files(&self, files: &[ShareFile]) -> bool;

    async fn share_files(&self, files: &[ShareFile]) -> Result<()>;

    async fn share_text(&self, title: &str, text: &str) -> Result<()>;

    /// Save the file and return where it ended up.
    async fn download(&self, file: &ShareFile) -> Result<PathBuf>;

    async fn copy_text(&self, text: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOutcome {
    /// The image went through the native share sheet.
    SharedFile,
    /// The image was saved and a text-only notice was shared.
    DownloadedAndNotified { path: PathBuf },
    /// The image was saved; the caption was copied if there was one.
    Downloaded { path: PathBuf, caption_copied: bool },
    /// The chosen strategy failed and only the plain download succeeded.
    FallbackDownload { path: PathBuf },
}

/// `AI-Artwork-2026-01-31T12-30-05.png`
pub fn artwork_file_name(image: &GeneratedImage, now: DateTime<Utc>) -> String {
    format!(
        "AI-Artwork-{}.{}",
        now.format("%Y-%m-%dT%H-%M-%S"),
        image.extension()
    )
}

fn fallback_file_name(image: &GeneratedImage, now: DateTime<Utc>) -> String {
    format!("ai-artwork-{}.{}", now.timestamp_millis(), image.extension())
}

fn download_file_name(image: &GeneratedImage, now: DateTime<Utc>) -> String {
    format!(
        "gemini-generated-{}.{}",
        now.timestamp_millis(),
        image.extension()
    )
}

/// Share `image` with the best strategy the platform supports.
pub async fn share_image(
    platform: &dyn SharePlatform,
    image: &GeneratedImage,
    caption: Option<&str>,
) -> Result<ShareOutcome> {
    let file = ShareFile::from_image(image, artwork_file_name(image, Utc::now()))?;
    let strategy = select_strategy(platform, &file);
    info!(
        "Sharing {} ({} bytes) via {}",
        file.file_name,
        file.bytes.len(),
        strategy.name()
    );

    match strategy.share(platform, &file, caption).await {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            warn!("Share via {} failed: {}", strategy.name(), e);

            let fallback = ShareFile {
                file_name: fallback_file_name(image, Utc::now()),
                ..file
            };
            match platform.download(&fallback).await {
                Ok(path) => {
                    info!("Image saved to {}", path.display());
                    Ok(ShareOutcome::FallbackDownload { path })
                }
                Err(e) => {
                    error!("Failed to download image: {}", e);
                    Err(e)
                }
            }
        }
    }
}

/// Save `image` directly as `gemini-generated-<millis>.<ext>`.
pub async fn download_image(platform: &dyn SharePlatform, image: &GeneratedImage) -> Result<PathBuf> {
    let file = ShareFile::from_image(image, download_file_name(image, Utc::now()))?;
    let path = platform.download(&file).await?;
    info!("Image saved to {}", path.display());
    Ok(path)
}
