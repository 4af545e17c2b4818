use super::{ShareFile, ShareOutcome, SharePlatform};
use crate::Result;
use async_trait::async_trait;

pub const DOWNLOADED_NOTICE_TITLE: &str = "AI Creation";
pub const DOWNLOADED_NOTICE_TEXT: &str =
    "The image was downloaded to your device! You can find it in your downloads folder and share it from any app.";

#[async_trait]
pub trait ShareStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn share(
        &self,
        platform: &dyn SharePlatform,
        file: &ShareFile,
        caption: Option<&str>,
    ) -> Result<ShareOutcome>;
}

/// Native share sheet carrying the image alone. The caption is left out so
/// the receiving app treats the image as the main content.
pub struct FileShare;

#[async_trait]
impl ShareStrategy for FileShare {
    fn name(&self) -> &'static str {
        "file share"
    }

    async fn share(
        &self,
        platform: &dyn SharePlatform,
        file: &ShareFile,
        _caption: Option<&str>,
    ) -> Result<ShareOutcome> {
        platform.share_files(std::slice::from_ref(file)).await?;
        Ok(ShareOutcome::SharedFile)
    }
}

/// Native share sheet that cannot carry files: save first, then share a
/// notice pointing at the download.
pub struct TextShare;

#[async_trait]
impl ShareStrategy for TextShare {
    fn name(&self) -> &'static str {
        "text share"
    }

    async fn share(
        &self,
        platform: &dyn SharePlatform,
        file: &ShareFile,
        _caption: Option<&str>,
    ) -> Result<ShareOutcome> {
        let path = platform.download(file).await?;
        platform
            .share_text(DOWNLOADED_NOTICE_TITLE, DOWNLOADED_NOTICE_TEXT)
            .await?;
        Ok(ShareOutcome::DownloadedAndNotified { path })
    }
}

pub struct DownloadWithCaption;

#[async_trait]
impl ShareStrategy for DownloadWithCaption {
    fn name(&self) -> &'static str {
        "download with caption"
    }

    async fn share(
        &self,
        platform: &dyn SharePlatform,
        file: &ShareFile,
        caption: Option<&str>,
    ) -> Result<ShareOutcome> {
        let path = platform.download(file).await?;
        let caption_copied = match caption.filter(|c| !c.is_empty()) {
            Some(caption) => {
                platform
                    .copy_text(&format!("Created with: \"{}\"", caption))
                    .await?;
                true
            }
            None => false,
        };
        Ok(ShareOutcome::Downloaded {
            path,
            caption_copied,
        })
    }
}

/// Highest-ranked strategy the platform can run for `file`.
pub fn select_strategy(platform: &dyn SharePlatform, file: &ShareFile) -> Box<dyn ShareStrategy> {
    if !platform.supports_native_share() {
        return Box::new(DownloadWithCaption);
    }
    if platform.can_share_files(std::slice::from_ref(file)) {
        Box::new(FileShare)
    } else {
        Box::new(TextShare)
    }
}
