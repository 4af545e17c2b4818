use super::{ShareFile, SharePlatform};
use crate::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareCall {
    ShareFiles(Vec<String>),
    ShareText { title: String, text: String },
    Download(String),
    CopyText(String),
}

/// Platform with switchable capabilities. Calls are recorded even when
/// they are configured to fail.
#[derive(Clone, Default)]
pub struct MockSharePlatform {
    native_share: bool,
    file_share: bool,
    fail_share: bool,
    fail_download: bool,
    fail_clipboard: bool,
    calls: Arc<Mutex<Vec<ShareCall>>>,
}

impl MockSharePlatform {
    /// No native share, working downloads and clipboard.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_native_share(mut self, enabled: bool) -> Self {
        self.native_share = enabled;
        self
    }

    pub fn with_file_share(mut self, enabled: bool) -> Self {
        self.file_share = enabled;
        self
    }

    /// Both share calls fail, as when the user dismisses the sheet.
    pub fn with_failing_share(mut self) -> Self {
        self.fail_share = true;
        self
    }

    pub fn with_failing_download(mut self) -> Self {
        self.fail_download = true;
        self
    }

    pub fn with_failing_clipboard(mut self) -> Self {
        self.fail_clipboard = true;
        self
    }

    pub fn get_calls(&self) -> Vec<ShareCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: ShareCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SharePlatform for MockSharePlatform {
    fn supports_native_share(&self) -> bool {
        self.native_share
    }

    fn can_share_files(&self, _files: &[ShareFile]) -> bool {
        self.file_share
    }

    async fn share_files(&self, files: &[ShareFile]) -> Result<()> {
        self.record(ShareCall::ShareFiles(
            files.iter().map(|f| f.file_name.clone()).collect(),
        ));
        if self.fail_share {
            return Err(Error::Share("Share cancelled".to_string()));
        }
        Ok(())
    }

    async fn share_text(&self, title: &str, text: &str) -> Result<()> {
        self.record(ShareCall::ShareText {
            title: title.to_string(),
            text: text.to_string(),
        });
        if self.fail_share {
            return Err(Error::Share("Share cancelled".to_string()));
        }
        Ok(())
    }

    async fn download(&self, file: &ShareFile) -> Result<PathBuf> {
        self.record(ShareCall::Download(file.file_name.clone()));
        if self.fail_download {
            return Err(Error::Share("Download blocked".to_string()));
        }
        Ok(PathBuf::from(&file.file_name))
    }

    async fn copy_text(&self, text: &str) -> Result<()> {
        self.record(ShareCall::CopyText(text.to_string()));
        if self.fail_clipboard {
            return Err(Error::Share("Clipboard unavailable".to_string()));
        }
        Ok(())
    }
}
